//! Scripted fallback mode
//!
//! Active when no completion provider is configured. Replies come from a
//! fixed canned set, the flight-search tool fires on a coin flip when the
//! caller mentions flights, and goodbyes end the call with a fixed farewell.
//! This mode is deliberate so the service can be exercised without live
//! credentials.

use rand::Rng;

/// Canned replies, one picked at random per turn
pub const CANNED_REPLIES: [&str; 4] = [
    "I'd be happy to help you with that! Let me check what's available.",
    "Sure thing! I can look that up for you right away.",
    "Absolutely! Let me find the best options for you.",
    "Great question! Let me search for that information.",
];

/// Fixed farewell used when the caller says goodbye
pub const FAREWELL: &str = "Thank you for calling! Have a great day and safe travels!";

/// Pick one of the canned replies
pub fn pick_canned_reply() -> &'static str {
    CANNED_REPLIES[rand::thread_rng().gen_range(0..CANNED_REPLIES.len())]
}

/// Flight-search branch: 50% chance, gated on the utterance mentioning
/// flights (case-insensitive).
pub fn wants_flight_search(message: &str) -> bool {
    message.to_lowercase().contains("flight") && rand::thread_rng().gen_bool(0.5)
}

/// Farewell trigger: the caller is saying goodbye or wrapping up
/// (case-insensitive).
pub fn wants_hangup(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("bye") || lower.contains("thank")
}

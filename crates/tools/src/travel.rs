//! Travel agency mock tools
//!
//! Stand-ins for real backend integrations. Latency windows and value ranges
//! mirror the systems these simulate; tests assert shapes and ranges only.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde_json::{json, Value};

use crate::{Tool, ToolError, ToolReply};

const AIRLINES: [&str; 7] = [
    "United Airlines",
    "Delta",
    "American",
    "Southwest",
    "JetBlue",
    "Alaska",
    "Spirit",
];

const CARRIER_CODES: [&str; 7] = ["UA", "DL", "AA", "WN", "B6", "AS", "NK"];

const HOTEL_CHAINS: [&str; 7] = [
    "Hilton",
    "Marriott",
    "Holiday Inn",
    "Hyatt",
    "Best Western",
    "Comfort Inn",
    "Four Seasons",
];

const AMENITIES: [&str; 4] = ["WiFi", "Pool", "Gym", "Breakfast"];

const QUARTER_HOURS: [&str; 4] = ["00", "15", "30", "45"];

/// Sleep for a random interval in `[min_ms, max_ms)`.
async fn simulate_latency(min_ms: u64, max_ms: u64) {
    let delay = rand::thread_rng().gen_range(min_ms..max_ms);
    tokio::time::sleep(Duration::from_millis(delay)).await;
}

fn str_param<'a>(params: &'a Value, key: &str, fallback: &'a str) -> &'a str {
    params.get(key).and_then(Value::as_str).unwrap_or(fallback)
}

/// Simulated flight search
pub struct FlightSearchTool;

#[async_trait]
impl Tool for FlightSearchTool {
    fn name(&self) -> &str {
        "checkFlightPrices"
    }

    fn description(&self) -> &str {
        "Search available flights between two airports"
    }

    fn params_hint(&self) -> &str {
        "{origin, destination, date}"
    }

    async fn invoke(&self, params: Value) -> Result<ToolReply, ToolError> {
        let origin = str_param(&params, "origin", "ANY");
        let destination = str_param(&params, "destination", "ANY");
        tracing::debug!(origin, destination, "searching flights");

        simulate_latency(200, 700).await;

        let mut flights: Vec<Value> = {
            let mut rng = rand::thread_rng();
            (0..rng.gen_range(3..7))
                .map(|_| {
                    json!({
                        "airline": AIRLINES[rng.gen_range(0..AIRLINES.len())],
                        "price": rng.gen_range(250..650),
                        "time": format!(
                            "{:02}:{}",
                            rng.gen_range(0..24),
                            QUARTER_HOURS[rng.gen_range(0..QUARTER_HOURS.len())]
                        ),
                        "flightNumber": format!(
                            "{}{}",
                            CARRIER_CODES[rng.gen_range(0..CARRIER_CODES.len())],
                            rng.gen_range(1000..10000)
                        ),
                    })
                })
                .collect()
        };
        flights.sort_by_key(|flight| flight["price"].as_i64());

        tracing::debug!(results = flights.len(), "flight search complete");

        Ok(ToolReply::ok(json!({
            "flights": flights,
            "searchId": format!("SRCH{}", Utc::now().timestamp_millis()),
            "cached": false,
        })))
    }
}

/// Simulated hotel availability check
pub struct HotelSearchTool;

#[async_trait]
impl Tool for HotelSearchTool {
    fn name(&self) -> &str {
        "checkHotelAvailability"
    }

    fn description(&self) -> &str {
        "Check hotel availability for a location and date range"
    }

    fn params_hint(&self) -> &str {
        "{location, checkIn, checkOut, guests}"
    }

    async fn invoke(&self, params: Value) -> Result<ToolReply, ToolError> {
        let location = str_param(&params, "location", "General Area").to_string();
        tracing::debug!(%location, "checking hotel availability");

        simulate_latency(300, 900).await;

        let mut hotels: Vec<Value> = {
            let mut rng = rand::thread_rng();
            (0..rng.gen_range(3..6))
                .map(|_| {
                    let amenities: Vec<&str> = AMENITIES
                        .iter()
                        .filter(|_| rng.gen_bool(0.5))
                        .copied()
                        .collect();
                    json!({
                        "name": HOTEL_CHAINS[rng.gen_range(0..HOTEL_CHAINS.len())],
                        "price": rng.gen_range(80..280),
                        "rating": format!("{:.1}", rng.gen_range(3.5..5.0)),
                        "availability": rng.gen_range(1..11),
                        "amenities": amenities,
                    })
                })
                .collect()
        };
        // Best-rated first; ratings are one-decimal strings.
        hotels.sort_by(|a, b| {
            let rating = |h: &Value| {
                h["rating"]
                    .as_str()
                    .and_then(|r| r.parse::<f64>().ok())
                    .unwrap_or(0.0)
            };
            rating(b).partial_cmp(&rating(a)).unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(ToolReply::ok(json!({
            "hotels": hotels,
            "location": location,
            "checkIn": str_param(&params, "checkIn", "flexible"),
            "checkOut": str_param(&params, "checkOut", "flexible"),
        })))
    }
}

/// Simulated reservation system
pub struct BookingTool;

#[async_trait]
impl Tool for BookingTool {
    fn name(&self) -> &str {
        "makeBooking"
    }

    fn description(&self) -> &str {
        "Reserve a flight or hotel for the caller"
    }

    fn params_hint(&self) -> &str {
        "{type, details, customerInfo}"
    }

    async fn invoke(&self, params: Value) -> Result<ToolReply, ToolError> {
        let booking_type = str_param(&params, "type", "general");
        tracing::debug!(booking_type, "processing booking");

        simulate_latency(400, 1200).await;

        let (suffix, processing_ms) = {
            let mut rng = rand::thread_rng();
            (rng.gen_range(0..1000), rng.gen_range(200..700))
        };
        let booking_id = format!("BK{}{}", Utc::now().timestamp_millis(), suffix);

        tracing::debug!(%booking_id, "reservation confirmed");

        Ok(ToolReply::ok(json!({
            "bookingId": booking_id,
            "status": "confirmed",
            "details": params.get("details").cloned().unwrap_or_else(|| json!({})),
            "confirmationSent": true,
            "processingTime": format!("{processing_ms}ms"),
        })))
    }
}

/// Call termination tool, selectable by the provider
pub struct EndCallTool;

#[async_trait]
impl Tool for EndCallTool {
    fn name(&self) -> &str {
        "endCall"
    }

    fn description(&self) -> &str {
        "Wrap up and terminate the current call"
    }

    fn params_hint(&self) -> &str {
        "{summary}"
    }

    async fn invoke(&self, params: Value) -> Result<ToolReply, ToolError> {
        tracing::debug!("call termination requested");

        Ok(ToolReply::ok(json!({
            "callEnded": true,
            "summary": str_param(&params, "summary", "Call completed successfully"),
        })))
    }
}

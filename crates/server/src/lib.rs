//! Call agent server
//!
//! HTTP surface for the call-session orchestrator: the session store, the
//! request pipeline, and the endpoint handlers.

pub mod http;
pub mod pipeline;
pub mod state;
pub mod store;

pub use http::create_router;
pub use state::AppState;
pub use store::{CallHandle, CallStore};

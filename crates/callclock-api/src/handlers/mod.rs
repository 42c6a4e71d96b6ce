//! HTTP request handlers.
//!
//! - `webhook`: signed conversation events and elapsed-time lookups
//! - `health`: store health and process liveness probes
//!
//! Webhook handlers return `Result<Json<_>, ApiError>`; the error type owns
//! the status code and `{"error": ..}` body.

pub mod health;
pub mod webhook;

pub use health::{health_check, liveness_check};
pub use webhook::{elapsed_time, method_not_allowed, receive_webhook};

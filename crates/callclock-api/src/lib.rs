//! HTTP surface for the callclock conversation timer.
//!
//! Accepts signed conversation webhooks, records when each conversation
//! started, and answers elapsed-time lookups. The store, clock and signing
//! secret are injected through [`AppState`]; nothing is read from globals at
//! request time.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod server;

pub use config::{Config, StoreBackend};
pub use error::ApiError;
pub use server::{create_router, start_server, AppState};

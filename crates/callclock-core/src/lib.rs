//! Core domain models and storage for conversation timing.
//!
//! Provides the conversation time record, the webhook event envelope, the
//! clock abstraction used to stamp and measure conversations, and the
//! `ConversationStore` seam with its PostgreSQL, REST and in-memory backends.
//! The HTTP crate depends on these types for everything it persists.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod models;
pub mod storage;
pub mod time;

pub use error::{CoreError, Result};
pub use models::{
    elapsed_seconds, ConversationId, ConversationTimeRecord, EventKind, WebhookEvent,
    CONVERSATION_STARTED,
};
pub use storage::{ConversationStore, StoreFuture};
pub use time::{Clock, RealClock, TestClock};

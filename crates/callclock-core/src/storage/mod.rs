//! Persistence seam for conversation start times.
//!
//! The webhook handler only ever inserts a record and selects one back by
//! conversation id. `ConversationStore` captures exactly those operations so
//! the handler never knows which backend is configured:
//!
//! - [`conversation_times::Repository`]: PostgreSQL through a sqlx pool
//! - [`rest::RestStore`]: a hosted PostgREST endpoint such as Supabase
//! - [`memory::MemoryStore`]: process-local map for development and tests
//!
//! No backend retries. Every failure is returned to the caller as-is.

use std::{future::Future, pin::Pin};

use crate::{
    error::Result,
    models::{ConversationId, ConversationTimeRecord},
};

pub mod conversation_times;
pub mod memory;
pub mod rest;

pub use memory::MemoryStore;
pub use rest::{RestStore, RestStoreConfig};

/// Name of the table (or PostgREST resource) holding start times.
pub const CONVERSATION_TIMES_TABLE: &str = "conversation_times";

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Storage operations required by the webhook handler.
pub trait ConversationStore: Send + Sync + 'static {
    /// Inserts a new start-time record.
    ///
    /// Backends that enforce uniqueness return
    /// `CoreError::ConstraintViolation` for an id that already exists.
    fn insert_start<'a>(&'a self, record: &'a ConversationTimeRecord) -> StoreFuture<'a, ()>;

    /// Finds the start-time record for a conversation.
    fn find_start<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> StoreFuture<'a, Option<ConversationTimeRecord>>;

    /// Verifies the backend is reachable.
    fn health_check(&self) -> StoreFuture<'_, ()>;

    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}

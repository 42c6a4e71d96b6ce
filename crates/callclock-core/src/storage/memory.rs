//! In-memory conversation store.
//!
//! Backs local development runs and every handler test. Mirrors the
//! relational backends' primary-key behavior and can be told to fail reads
//! or writes so error paths are testable without a database.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use tokio::sync::RwLock;

use super::{ConversationStore, StoreFuture};
use crate::{
    error::{CoreError, Result},
    models::{ConversationId, ConversationTimeRecord},
};

/// Process-local store keyed by conversation id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<ConversationId, ConversationTimeRecord>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    write_attempts: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent insert fail with a database error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Release);
    }

    /// Makes every subsequent lookup fail with a database error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::Release);
    }

    /// Number of insert attempts, successful or not.
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::Acquire)
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if nothing has been stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Inserts a record, rejecting duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ConstraintViolation` for an existing id, or
    /// `CoreError::Database` when write failures are injected.
    pub async fn create(&self, record: &ConversationTimeRecord) -> Result<()> {
        self.write_attempts.fetch_add(1, Ordering::AcqRel);

        if self.fail_writes.load(Ordering::Acquire) {
            return Err(CoreError::Database("injected write failure".to_string()));
        }

        let mut records = self.records.write().await;
        if records.contains_key(&record.conversation_id) {
            return Err(CoreError::ConstraintViolation(format!(
                "conversation {} already has a start time",
                record.conversation_id
            )));
        }

        records.insert(record.conversation_id.clone(), record.clone());
        Ok(())
    }

    /// Finds the record for a conversation.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` when read failures are injected.
    pub async fn find_by_id(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<ConversationTimeRecord>> {
        if self.fail_reads.load(Ordering::Acquire) {
            return Err(CoreError::Database("injected read failure".to_string()));
        }

        Ok(self.records.read().await.get(conversation_id).cloned())
    }
}

impl ConversationStore for MemoryStore {
    fn insert_start<'a>(&'a self, record: &'a ConversationTimeRecord) -> StoreFuture<'a, ()> {
        Box::pin(self.create(record))
    }

    fn find_start<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> StoreFuture<'a, Option<ConversationTimeRecord>> {
        Box::pin(self.find_by_id(conversation_id))
    }

    fn health_check(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            if self.fail_reads.load(Ordering::Acquire) {
                return Err(CoreError::Database("injected read failure".to_string()));
            }
            Ok(())
        })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

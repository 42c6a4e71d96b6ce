//! Repository for the `conversation_times` table in PostgreSQL.
//!
//! The conversation id is the primary key, so a repeated
//! `conversation_started` for the same id fails with a unique violation
//! instead of silently overwriting the original start time.

use std::sync::Arc;

use sqlx::PgPool;

use super::{ConversationStore, StoreFuture};
use crate::{
    error::Result,
    models::{ConversationId, ConversationTimeRecord},
};

/// Repository for conversation start-time records.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Creates the table if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns error if the DDL statement fails.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS conversation_times (
                conversation_id TEXT PRIMARY KEY,
                start_time TIMESTAMPTZ NOT NULL
            )
            ",
        )
        .execute(&*self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a start-time record.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ConstraintViolation` if the conversation already
    /// has a record, or a database error if the insert fails.
    pub async fn create(&self, record: &ConversationTimeRecord) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO conversation_times (conversation_id, start_time)
            VALUES ($1, $2)
            ",
        )
        .bind(&record.conversation_id)
        .bind(record.start_time)
        .execute(&*self.pool)
        .await?;

        Ok(())
    }

    /// Finds the record for a conversation.
    ///
    /// # Errors
    ///
    /// Returns error if query fails.
    pub async fn find_by_id(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<ConversationTimeRecord>> {
        let record = sqlx::query_as::<_, ConversationTimeRecord>(
            r"
            SELECT conversation_id, start_time
            FROM conversation_times
            WHERE conversation_id = $1
            ",
        )
        .bind(conversation_id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(record)
    }

    /// Executes a trivial query to verify connectivity.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if the connection is unhealthy.
    pub async fn health_check(&self) -> Result<()> {
        let _: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&*self.pool).await?;

        Ok(())
    }
}

impl ConversationStore for Repository {
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
        Box::pin(Repository::health_check(self))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

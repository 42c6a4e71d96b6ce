//! PostgREST-backed store for hosted databases such as Supabase.
//!
//! Talks to `{base_url}/rest/v1/conversation_times` with the service
//! credential sent both as the `apikey` header and as a bearer token. Inserts
//! use `Prefer: return=minimal`; lookups filter with `conversation_id=eq.<id>`.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use super::{ConversationStore, StoreFuture, CONVERSATION_TIMES_TABLE};
use crate::{
    error::{CoreError, Result},
    models::{ConversationId, ConversationTimeRecord},
};

/// Largest error body kept from a failed store response.
const MAX_ERROR_BODY: usize = 512;

/// Connection settings for the REST store.
#[derive(Clone)]
pub struct RestStoreConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub base_url: String,
    /// Service role key used for both `apikey` and bearer auth.
    pub service_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for RestStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStoreConfig")
            .field("base_url", &self.base_url)
            .field("service_key", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Conversation store speaking the PostgREST protocol.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    config: RestStoreConfig,
}

impl RestStore {
    /// Creates a store client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if the URL or key is empty, or
    /// `CoreError::Upstream` if the HTTP client cannot be built.
    pub fn new(config: RestStoreConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(CoreError::InvalidInput("store URL must not be empty".to_string()));
        }
        if config.service_key.is_empty() {
            return Err(CoreError::InvalidInput("store service key must not be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("callclock/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            CONVERSATION_TIMES_TABLE
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("apikey", &self.config.service_key).bearer_auth(&self.config.service_key)
    }

    /// Inserts a start-time record.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ConstraintViolation` on HTTP 409 and
    /// `CoreError::Upstream` for any other failure.
    pub async fn create(&self, record: &ConversationTimeRecord) -> Result<()> {
        let response = self
            .authorized(self.client.post(self.table_url()))
            .header("Prefer", "return=minimal")
            .json(&[record])
            .send()
            .await?;

        let response = check_status(response).await?;
        debug!(status = response.status().as_u16(), "Store insert accepted");
        Ok(())
    }

    /// Finds the record for a conversation.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Upstream` if the request fails or the response
    /// cannot be decoded.
    pub async fn find_by_id(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<ConversationTimeRecord>> {
        let filter = format!("eq.{conversation_id}");
        let response = self
            .authorized(self.client.get(self.table_url()))
            .query(&[
                ("select", "conversation_id,start_time"),
                ("conversation_id", filter.as_str()),
                ("limit", "1"),
            ])
            .send()
            .await?;

        let response = check_status(response).await?;
        let rows: Vec<ConversationTimeRecord> = response.json().await?;

        Ok(rows.into_iter().next())
    }

    /// Issues a minimal select to verify the endpoint and credential.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Upstream` if the store is unreachable or rejects
    /// the credential.
    pub async fn health_check(&self) -> Result<()> {
        let response = self
            .authorized(self.client.get(self.table_url()))
            .query(&[("select", "conversation_id"), ("limit", "1")])
            .send()
            .await?;

        check_status(response).await.map(|_| ())
    }
}

/// Passes successful responses through and converts failures into errors.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut message = response.text().await.unwrap_or_default();
    if message.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }

    warn!(status = status.as_u16(), body = %message, "Store request rejected");

    if status == StatusCode::CONFLICT {
        return Err(CoreError::ConstraintViolation(message));
    }

    Err(CoreError::Upstream { status: Some(status.as_u16()), message })
}

impl ConversationStore for RestStore {
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
        Box::pin(RestStore::health_check(self))
    }

    fn backend_name(&self) -> &'static str {
        "rest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> RestStoreConfig {
        RestStoreConfig {
            base_url: base_url.to_string(),
            service_key: "service-key".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn table_url_ignores_trailing_slash() {
        let store = RestStore::new(config("https://project.supabase.co/")).unwrap();
        assert_eq!(store.table_url(), "https://project.supabase.co/rest/v1/conversation_times");
    }

    #[test]
    fn empty_credentials_are_rejected() {
        assert!(RestStore::new(config("  ")).is_err());

        let mut missing_key = config("https://project.supabase.co");
        missing_key.service_key.clear();
        assert!(RestStore::new(missing_key).is_err());
    }

    #[test]
    fn debug_output_hides_service_key() {
        let rendered = format!("{:?}", config("https://project.supabase.co"));
        assert!(!rendered.contains("service-key"));
        assert!(rendered.contains("***"));
    }
}

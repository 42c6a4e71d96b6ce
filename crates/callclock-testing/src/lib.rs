//! Test infrastructure for the callclock service.
//!
//! Wires the real router to an in-process store and a controllable clock so
//! integration tests drive full HTTP requests without a network listener.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use callclock_api::{create_router, crypto::SignatureConfig, AppState};
use callclock_core::{storage::MemoryStore, ConversationStore, TestClock};
use serde_json::Value;
use tower::ServiceExt;

pub mod fixtures;
pub mod http;

pub use fixtures::{elapsed_request, WebhookBuilder};
pub use http::MockRestStore;

/// Secret every test environment signs and verifies with.
pub const TEST_SECRET: &str = "test-webhook-secret";

const BODY_LIMIT: usize = 1024 * 1024;

/// Router plus the store and clock behind it.
pub struct TestEnv<S: ConversationStore = MemoryStore> {
    /// Store the router writes to
    pub store: Arc<S>,
    /// Clock shared with the router
    pub clock: TestClock,
    router: Router,
}

impl TestEnv<MemoryStore> {
    /// Environment backed by an empty in-memory store.
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }
}

impl Default for TestEnv<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ConversationStore> TestEnv<S> {
    /// Environment backed by the given store.
    pub fn with_store(store: Arc<S>) -> Self {
        let clock = TestClock::new();
        let state = AppState::new(
            store.clone(),
            Arc::new(clock.clone()),
            SignatureConfig::with_default_header(TEST_SECRET),
        );
        let router = create_router(state, Duration::from_secs(30));

        Self { store, clock, router }
    }

    /// Builder for a signed webhook with no payload fields yet.
    pub fn webhook(&self) -> WebhookBuilder {
        WebhookBuilder::new(TEST_SECRET)
    }

    /// Sends a request through the router.
    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response =
            self.router.clone().oneshot(request).await.context("router failed to respond")?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), BODY_LIMIT)
            .await
            .context("failed to read response body")?;

        Ok(TestResponse { status, headers, body })
    }

    /// Posts a signed `conversation_started` event.
    pub async fn start_conversation(&self, conversation_id: &str) -> Result<TestResponse> {
        self.send(WebhookBuilder::conversation_started(TEST_SECRET, conversation_id).build()).await
    }

    /// Requests elapsed seconds for a conversation.
    pub async fn elapsed(&self, conversation_id: &str) -> Result<TestResponse> {
        self.send(elapsed_request(Some(conversation_id))).await
    }

    /// Sends a bodiless request with any method.
    pub async fn request(&self, method: Method, uri: &str) -> Result<TestResponse> {
        let request = Request::builder().method(method).uri(uri).body(Body::empty())?;
        self.send(request).await
    }

    /// Advances the shared clock.
    pub fn advance(&self, duration: Duration) {
        self.clock.advance(duration);
    }
}

/// Buffered router response.
#[derive(Debug)]
pub struct TestResponse {
    /// Status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body
    pub body: Bytes,
}

impl TestResponse {
    /// Parses the body as JSON.
    pub fn json(&self) -> Result<Value> {
        serde_json::from_slice(&self.body).context("response body is not JSON")
    }

    /// The `elapsed` field of a successful lookup.
    pub fn elapsed_seconds(&self) -> Result<u64> {
        self.json()?["elapsed"].as_u64().context("response has no numeric elapsed field")
    }
}

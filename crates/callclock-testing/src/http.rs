//! Mock hosted store for exercising the REST backend end to end.
//!
//! Serves the `conversation_times` table the way a PostgREST endpoint does:
//! inserts are `POST` with an array body, lookups are `GET` with
//! `conversation_id=eq.<id>` filters.

use std::time::Duration;

use callclock_core::storage::{RestStore, RestStoreConfig};
use serde_json::{json, Value};
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, Request, ResponseTemplate,
};

/// Service key the mock expects on every request.
pub const MOCK_SERVICE_KEY: &str = "test-service-role-key";

const TABLE_PATH: &str = "/rest/v1/conversation_times";

/// Wiremock server standing in for the hosted store.
pub struct MockRestStore {
    server: MockServer,
}

impl MockRestStore {
    /// Starts a mock server on a random port.
    pub async fn start() -> Self {
        Self { server: MockServer::start().await }
    }

    /// Base URL of the mock project.
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Client configuration pointing at this mock.
    pub fn config(&self) -> RestStoreConfig {
        RestStoreConfig {
            base_url: self.url(),
            service_key: MOCK_SERVICE_KEY.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    /// A REST store client wired to this mock.
    pub fn client(&self) -> anyhow::Result<RestStore> {
        Ok(RestStore::new(self.config())?)
    }

    /// Accepts inserts with `201 Created`.
    pub async fn accept_inserts(&self) {
        Mock::given(method("POST"))
            .and(path(TABLE_PATH))
            .and(header("apikey", MOCK_SERVICE_KEY))
            .respond_with(ResponseTemplate::new(201))
            .mount(&self.server)
            .await;
    }

    /// Fails every insert with `status`.
    pub async fn fail_inserts(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path(TABLE_PATH))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(json!({"message": "insert rejected"})),
            )
            .mount(&self.server)
            .await;
    }

    /// Answers lookups for `conversation_id` with a stored start time.
    pub async fn serve_record(&self, conversation_id: &str, start_time_iso: &str) {
        Mock::given(method("GET"))
            .and(path(TABLE_PATH))
            .and(query_param("conversation_id", format!("eq.{conversation_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "conversation_id": conversation_id,
                "start_time": start_time_iso,
            }])))
            .mount(&self.server)
            .await;
    }

    /// Answers every other lookup with an empty result set.
    ///
    /// Mount after [`Self::serve_record`] calls; wiremock matches the
    /// earliest mounted mock first.
    pub async fn serve_empty(&self) {
        Mock::given(method("GET"))
            .and(path(TABLE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&self.server)
            .await;
    }

    /// Bodies of every insert the mock received.
    pub async fn inserted_rows(&self) -> Vec<Value> {
        let requests: Vec<Request> = self.server.received_requests().await.unwrap_or_default();

        requests
            .iter()
            .filter(|request| request.method.as_str() == "POST")
            .filter_map(|request| serde_json::from_slice::<Value>(&request.body).ok())
            .filter_map(|body| match body {
                Value::Array(rows) => Some(rows),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

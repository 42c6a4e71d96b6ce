//! Request builders for signed conversation webhooks.
//!
//! Builders default to a correctly signed `conversation_started` event; tests
//! opt into the broken variants they need.

use axum::{
    body::Body,
    http::{header, Method, Request},
};
use bytes::Bytes;
use callclock_api::crypto::{generate_hmac_hex, DEFAULT_SIGNATURE_HEADER};
use serde_json::{Map, Value};
use uuid::Uuid;

/// How the builder fills the signature header.
#[derive(Debug, Clone)]
enum Signing {
    /// HMAC of the final body with the builder's secret
    Valid,
    /// `sha256=` prefixed HMAC of the final body
    Prefixed,
    /// HMAC of the final body with a different secret
    WrongSecret(String),
    /// Literal header value
    Literal(String),
    /// No header at all
    Unsigned,
}

/// Builder for webhook requests against `/webhook`.
#[derive(Debug, Clone)]
pub struct WebhookBuilder {
    secret: String,
    header: String,
    method: Method,
    fields: Map<String, Value>,
    raw_body: Option<Bytes>,
    signing: Signing,
}

impl WebhookBuilder {
    /// Creates a builder signing with `secret` under the default header.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            header: DEFAULT_SIGNATURE_HEADER.to_string(),
            method: Method::POST,
            fields: Map::new(),
            raw_body: None,
            signing: Signing::Valid,
        }
    }

    /// A signed `conversation_started` event for `conversation_id`.
    pub fn conversation_started(secret: impl Into<String>, conversation_id: &str) -> Self {
        Self::new(secret).event("conversation_started").conversation_id(conversation_id)
    }

    /// A signed `conversation_started` event with a fresh random id.
    pub fn with_defaults(secret: impl Into<String>) -> Self {
        let conversation_id = format!("conv_{}", Uuid::new_v4().simple());
        Self::conversation_started(secret, &conversation_id)
    }

    /// Sets the header the signature is sent in.
    #[must_use]
    pub fn signature_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the `event` field.
    #[must_use]
    pub fn event(self, event: &str) -> Self {
        self.field("event", Value::from(event))
    }

    /// Sets the `conversation_id` field.
    #[must_use]
    pub fn conversation_id(self, conversation_id: &str) -> Self {
        self.field("conversation_id", Value::from(conversation_id))
    }

    /// Sets an arbitrary top-level payload field.
    #[must_use]
    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Replaces the JSON payload with raw bytes.
    #[must_use]
    pub fn raw_body(mut self, body: impl Into<Bytes>) -> Self {
        self.raw_body = Some(body.into());
        self
    }

    /// Sends the signature as `sha256=<hex>`.
    #[must_use]
    pub fn prefixed_signature(mut self) -> Self {
        self.signing = Signing::Prefixed;
        self
    }

    /// Signs the body with a secret the server does not know.
    #[must_use]
    pub fn signed_with(mut self, secret: impl Into<String>) -> Self {
        self.signing = Signing::WrongSecret(secret.into());
        self
    }

    /// Sends `value` verbatim as the signature header.
    #[must_use]
    pub fn signature(mut self, value: impl Into<String>) -> Self {
        self.signing = Signing::Literal(value.into());
        self
    }

    /// Omits the signature header.
    #[must_use]
    pub fn unsigned(mut self) -> Self {
        self.signing = Signing::Unsigned;
        self
    }

    /// The exact bytes that will be sent.
    pub fn body_bytes(&self) -> Bytes {
        match &self.raw_body {
            Some(body) => body.clone(),
            None => Bytes::from(Value::Object(self.fields.clone()).to_string()),
        }
    }

    /// Header value the builder will send, if any.
    pub fn signature_value(&self) -> Option<String> {
        let body = self.body_bytes();
        match &self.signing {
            Signing::Valid => Some(sign(&body, &self.secret)),
            Signing::Prefixed => Some(format!("sha256={}", sign(&body, &self.secret))),
            Signing::WrongSecret(secret) => Some(sign(&body, secret)),
            Signing::Literal(value) => Some(value.clone()),
            Signing::Unsigned => None,
        }
    }

    /// Builds the HTTP request.
    pub fn build(self) -> Request<Body> {
        let signature = self.signature_value();
        let body = self.body_bytes();

        let mut request = Request::builder()
            .method(self.method.clone())
            .uri("/webhook")
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(signature) = signature {
            request = request.header(self.header.as_str(), signature);
        }

        request.body(Body::from(body)).expect("webhook request should be valid")
    }
}

fn sign(body: &[u8], secret: &str) -> String {
    generate_hmac_hex(body, secret).expect("test secret should be usable as an HMAC key")
}

/// Builds `GET /webhook` with an optional `conversation_id` query parameter.
pub fn elapsed_request(conversation_id: Option<&str>) -> Request<Body> {
    let uri = match conversation_id {
        Some(id) => format!("/webhook?conversation_id={id}"),
        None => "/webhook".to_string(),
    };

    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("elapsed request should be valid")
}

#[cfg(test)]
mod tests {
    use callclock_api::crypto::verify_signature;

    use super::*;

    #[test]
    fn default_builder_signs_its_own_body() {
        let builder = WebhookBuilder::conversation_started("secret", "abc123");

        let body = builder.body_bytes();
        let signature = builder.signature_value().unwrap();

        assert!(verify_signature(&body, &signature, "secret").is_ok());
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["event"], "conversation_started");
        assert_eq!(json["conversation_id"], "abc123");
    }

    #[test]
    fn broken_variants_do_not_verify() {
        let base = WebhookBuilder::conversation_started("secret", "abc123");
        let body = base.body_bytes();

        let wrong = base.clone().signed_with("other").signature_value().unwrap();
        assert!(verify_signature(&body, &wrong, "secret").is_err());

        assert!(base.unsigned().signature_value().is_none());
    }

    #[test]
    fn raw_body_is_signed_verbatim() {
        let builder = WebhookBuilder::new("secret").raw_body("not json").prefixed_signature();

        let signature = builder.signature_value().unwrap();

        assert!(signature.starts_with("sha256="));
        assert!(verify_signature(b"not json", &signature, "secret").is_ok());
    }
}

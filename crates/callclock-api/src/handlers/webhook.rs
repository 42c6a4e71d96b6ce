//! Conversation webhook handlers.
//!
//! `POST /webhook` authenticates the body, then records a start time for
//! `conversation_started` events. `GET /webhook?conversation_id=..` reports
//! how many whole seconds have passed since that start time. Every other
//! method on the route is rejected.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::HeaderMap,
    Json,
};
use bytes::Bytes;
use callclock_core::{ConversationId, ConversationTimeRecord, EventKind, WebhookEvent};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::{error::ApiError, server::AppState};

/// Acknowledgement body for accepted webhooks.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Always `"ok"`
    pub status: &'static str,
}

impl StatusResponse {
    /// The single acknowledgement value.
    pub const fn ok() -> Self {
        Self { status: "ok" }
    }
}

/// Elapsed-time lookup result.
#[derive(Debug, Serialize)]
pub struct ElapsedResponse {
    /// Whole seconds since the conversation started
    pub elapsed: u64,
}

/// Query parameters for the elapsed-time lookup.
#[derive(Debug, Deserialize)]
pub struct ElapsedQuery {
    /// Conversation to look up
    pub conversation_id: Option<String>,
}

/// Receives a signed conversation webhook.
///
/// # Errors
///
/// - 401: signature header missing, malformed or mismatching
/// - 400: body is not a JSON object, or a `conversation_started` event has
///   no `conversation_id`
/// - 500: the store failed the insert
#[instrument(
    name = "receive_webhook",
    skip(state, headers, body),
    fields(content_length = body.len())
)]
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StatusResponse>, ApiError> {
    let signature = headers.get(state.signature.header()).and_then(|v| v.to_str().ok());

    if let Err(e) = state.signature.verify(&body, signature) {
        warn!(error = %e, "Rejected webhook with invalid signature");
        return Err(ApiError::InvalidSignature);
    }

    let event = WebhookEvent::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Signed webhook body could not be parsed");
        ApiError::InvalidPayload(e.to_string())
    })?;

    match event.kind() {
        EventKind::ConversationStarted => {
            let conversation_id =
                event.conversation_id().ok_or(ApiError::MissingParameter("conversation_id"))?;
            record_start(&state, conversation_id).await?;
        },
        EventKind::Other(name) => {
            debug!(event = name, "Acknowledged event without side effects");
        },
    }

    Ok(Json(StatusResponse::ok()))
}

/// Stamps and persists the start of a conversation.
async fn record_start(state: &AppState, conversation_id: ConversationId) -> Result<(), ApiError> {
    let record = ConversationTimeRecord::started(conversation_id, state.clock.now_utc());

    if let Err(e) = state.store.insert_start(&record).await {
        error!(
            conversation_id = %record.conversation_id,
            backend = state.store.backend_name(),
            error = %e,
            "Failed to store conversation start time"
        );
        return Err(ApiError::StoreWriteFailure);
    }

    info!(
        conversation_id = %record.conversation_id,
        start_time = %record.start_time_iso(),
        "Conversation started"
    );
    Ok(())
}

/// Reports whole seconds elapsed since a conversation started.
///
/// # Errors
///
/// - 400: `conversation_id` query parameter missing, empty or unreadable
/// - 404: no start time recorded for the conversation
/// - 500: the store lookup failed
#[instrument(name = "elapsed_time", skip(state, query))]
pub async fn elapsed_time(
    State(state): State<AppState>,
    query: Result<Query<ElapsedQuery>, QueryRejection>,
) -> Result<Json<ElapsedResponse>, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected unreadable elapsed query");
        ApiError::InvalidParameter("conversation_id")
    })?;

    let conversation_id = query
        .conversation_id
        .and_then(|raw| ConversationId::parse(raw).ok())
        .ok_or(ApiError::MissingParameter("conversation_id"))?;

    let record = state
        .store
        .find_start(&conversation_id)
        .await
        .map_err(|e| {
            error!(
                conversation_id = %conversation_id,
                backend = state.store.backend_name(),
                error = %e,
                "Failed to look up conversation start time"
            );
            ApiError::StoreReadFailure
        })?
        .ok_or_else(|| {
            debug!(conversation_id = %conversation_id, "No start time recorded");
            ApiError::RecordNotFound
        })?;

    let elapsed = record.elapsed_seconds(state.clock.now_utc());
    debug!(conversation_id = %conversation_id, elapsed, "Computed elapsed time");

    Ok(Json(ElapsedResponse { elapsed }))
}

/// Rejects every method other than GET and POST on the webhook route.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

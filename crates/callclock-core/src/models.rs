//! Conversation timing models and the inbound webhook envelope.
//!
//! Defines the strongly-typed conversation identifier, the persisted
//! `ConversationTimeRecord`, and the elapsed-time arithmetic shared by every
//! store backend. Start times are kept at millisecond precision so a record
//! reads back exactly as it was written, whichever backend holds it.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

type PgDb = sqlx::Postgres;
type PgValueRef<'r> = sqlx::postgres::PgValueRef<'r>;
type PgTypeInfo = sqlx::postgres::PgTypeInfo;
type PgArgumentBuffer = sqlx::postgres::PgArgumentBuffer;
type EncodeResult =
    std::result::Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync + 'static>>;
type BoxDynError = sqlx::error::BoxDynError;

/// Event name that opens a conversation timer.
pub const CONVERSATION_STARTED: &str = "conversation_started";

/// Strongly-typed conversation identifier.
///
/// Identifiers are supplied by the voice platform and never generated here.
/// Uniqueness is left to the store.
///
/// # Example
///
/// ```
/// use callclock_core::ConversationId;
///
/// let id = ConversationId::parse("abc123").unwrap();
/// assert_eq!(id.as_str(), "abc123");
/// assert!(ConversationId::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// Validates a client-supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if the identifier is empty or only
    /// whitespace.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(CoreError::InvalidInput("conversation_id must not be empty".to_string()));
        }
        Ok(Self(raw))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl sqlx::Type<PgDb> for ConversationId {
    fn type_info() -> PgTypeInfo {
        <String as sqlx::Type<PgDb>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for ConversationId {
    fn decode(value: PgValueRef<'r>) -> std::result::Result<Self, BoxDynError> {
        let raw = <String as sqlx::Decode<PgDb>>::decode(value)?;
        Ok(Self(raw))
    }
}

impl sqlx::Encode<'_, PgDb> for ConversationId {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> EncodeResult {
        <String as sqlx::Encode<PgDb>>::encode_by_ref(&self.0, buf)
    }
}

/// Start time of a single conversation.
///
/// Created once when the `conversation_started` event arrives and only read
/// afterwards. Serializes `start_time` as an ISO-8601 string with millisecond
/// precision and a `Z` suffix, the format the hosted store receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConversationTimeRecord {
    /// Conversation this record belongs to
    pub conversation_id: ConversationId,
    /// When the conversation started
    #[serde(with = "iso_millis")]
    pub start_time: DateTime<Utc>,
}

impl ConversationTimeRecord {
    /// Creates a record for a conversation that started at `at`.
    ///
    /// Sub-millisecond precision is dropped.
    pub fn started(conversation_id: ConversationId, at: DateTime<Utc>) -> Self {
        Self { conversation_id, start_time: truncate_to_millis(at) }
    }

    /// Whole seconds elapsed between the start time and `now`.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        elapsed_seconds(self.start_time, now)
    }

    /// Start time rendered as an ISO-8601 string.
    pub fn start_time_iso(&self) -> String {
        self.start_time.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Computes `floor((now - start) / 1000)` over millisecond timestamps.
///
/// A clock that reads earlier than `start` yields 0 rather than a negative
/// duration.
///
/// # Example
///
/// ```
/// use callclock_core::elapsed_seconds;
/// use chrono::{TimeDelta, Utc};
///
/// let start = Utc::now();
/// assert_eq!(elapsed_seconds(start, start + TimeDelta::milliseconds(5_999)), 5);
/// assert_eq!(elapsed_seconds(start, start - TimeDelta::seconds(3)), 0);
/// ```
pub fn elapsed_seconds(start: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = now.timestamp_millis().saturating_sub(start.timestamp_millis());
    u64::try_from(millis.div_euclid(1000)).unwrap_or(0)
}

fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}

mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Classification of an inbound webhook event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind<'a> {
    /// A conversation has started and its timer must be recorded
    ConversationStarted,
    /// Any other event, acknowledged without side effects
    Other(&'a str),
}

/// JSON body of a conversation webhook.
///
/// Only `event` and `conversation_id` drive behavior; every other field is
/// retained in `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event name, such as `conversation_started`
    #[serde(default)]
    pub event: String,
    /// Conversation the event refers to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Remaining provider fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WebhookEvent {
    /// Parses a webhook body, requiring a top-level JSON object.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` for malformed JSON, non-object
    /// bodies, or fields of the wrong type.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| CoreError::InvalidInput(format!("malformed JSON: {e}")))?;

        if !value.is_object() {
            return Err(CoreError::InvalidInput("expected a JSON object".to_string()));
        }

        serde_json::from_value(value).map_err(|e| CoreError::InvalidInput(e.to_string()))
    }

    /// Classifies the event name.
    pub fn kind(&self) -> EventKind<'_> {
        if self.event == CONVERSATION_STARTED {
            EventKind::ConversationStarted
        } else {
            EventKind::Other(&self.event)
        }
    }

    /// Returns the validated conversation id, if one was supplied.
    pub fn conversation_id(&self) -> Option<ConversationId> {
        self.conversation_id.as_deref().and_then(|raw| ConversationId::parse(raw).ok())
    }
}

//! Protocol events and line classification.
//!
//! The service has shipped two layouts of the same protocol. In one, turn
//! data is wrapped:
//!
//! ```text
//! {"result":{"response":{"token":"Hel","responseId":"r1"}}}
//! ```
//!
//! in the other it sits directly under `result`:
//!
//! ```text
//! {"result":{"token":"Hel","responseId":"r1"}}
//! ```
//!
//! Lines are therefore classified by shape, not by a tag. For each field the
//! wrapped location is checked first and wins when both are present.

use crate::types::{ConversationRecord, FinalMetadata, ModelResponse};
use serde_json::{Map, Value};
use thiserror::Error;

/// One decoded protocol event.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolEvent {
    /// A new conversation was created.
    ConversationCreated(ConversationRecord),
    /// A piece of the response text.
    Token {
        /// Text to append.
        text: String,
        /// Identifier of the turn the token belongs to.
        response_id: Option<String>,
        /// Whether the token is part of the model's reasoning trace.
        is_thinking: bool,
        /// Whether the model signalled a soft stop.
        is_soft_stop: bool,
    },
    /// Follow-ups, feedback labels and tools used.
    FinalMetadata(FinalMetadata),
    /// The complete model turn record.
    ModelResponse(ModelResponse),
    /// The conversation title changed.
    TitleUpdate {
        /// The new title.
        new_title: String,
    },
    /// The service acknowledged the user's message.
    UserResponseAck {
        /// Identifier assigned to the user's turn.
        response_id: String,
    },
    /// A line that could not be used. Never fatal.
    Unrecognized(DecodeWarning),
}

impl ProtocolEvent {
    /// The turn identifier this event carries, if it is one of the kinds
    /// that update the aggregate's response id.
    pub fn response_id(&self) -> Option<&str> {
        match self {
            ProtocolEvent::Token { response_id, .. } => response_id.as_deref(),
            ProtocolEvent::ModelResponse(record) => {
                Some(record.response_id.as_str()).filter(|id| !id.is_empty())
            }
            ProtocolEvent::UserResponseAck { response_id } => Some(response_id.as_str()),
            _ => None,
        }
    }
}

/// Why a line was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct DecodeWarning {
    /// What went wrong.
    pub kind: DecodeWarningKind,
    /// The offending line (lossily decoded).
    pub line: String,
}

/// Classification of a skipped line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeWarningKind {
    /// The line is not valid UTF-8.
    #[error("line is not valid UTF-8")]
    InvalidUtf8,
    /// The line is not valid JSON.
    #[error("line is not valid JSON: {0}")]
    InvalidJson(String),
    /// Valid JSON, but none of the known shapes.
    #[error("line matches no known event shape")]
    UnknownShape,
}

/// Classify one complete line (without its line break).
///
/// Usually yields exactly one event. A line carrying several shapes yields
/// one event per shape in lookup order:
///
/// 1. `conversation` with a non-empty `conversationId`
/// 2. `token` (wrapped, else bare)
/// 3. `finalMetadata` (wrapped, else bare)
/// 4. `modelResponse` (wrapped, else bare)
/// 5. `title.newTitle`
/// 6. `userResponse.responseId` (wrapped, else bare)
///
/// A line matching nothing yields a single [`ProtocolEvent::Unrecognized`].
pub fn classify_line(line: &[u8]) -> Vec<ProtocolEvent> {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text,
        Err(_) => {
            let warning = DecodeWarning {
                kind: DecodeWarningKind::InvalidUtf8,
                line: String::from_utf8_lossy(line).into_owned(),
            };
            tracing::warn!(%warning, "skipping response line");
            return vec![ProtocolEvent::Unrecognized(warning)];
        }
    };

    let json: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            let warning = DecodeWarning {
                kind: DecodeWarningKind::InvalidJson(e.to_string()),
                line: text.to_string(),
            };
            tracing::warn!(%warning, "skipping response line");
            return vec![ProtocolEvent::Unrecognized(warning)];
        }
    };

    let events = classify_value(&json);
    if events.is_empty() {
        tracing::debug!(line = text, "skipping response line with unknown shape");
        return vec![ProtocolEvent::Unrecognized(DecodeWarning {
            kind: DecodeWarningKind::UnknownShape,
            line: text.to_string(),
        })];
    }
    events
}

/// Classify an already-parsed line. Returns no events for unknown shapes.
pub fn classify_value(json: &Value) -> Vec<ProtocolEvent> {
    let Some(result) = json.get("result").filter(|r| r.is_object()) else {
        return Vec::new();
    };
    let wrapped = result.get("response").filter(|r| r.is_object());
    let mut events = Vec::new();

    // 1. conversation
    if let Some(conversation) = result.get("conversation") {
        let has_id = conversation["conversationId"]
            .as_str()
            .is_some_and(|id| !id.is_empty());
        if has_id {
            events.push(ProtocolEvent::ConversationCreated(parse_record(
                conversation,
                "conversation",
            )));
        }
    }

    // 2. token
    let token_source = wrapped
        .filter(|w| w.get("token").is_some())
        .or_else(|| Some(result).filter(|r| r.get("token").is_some()));
    if let Some(source) = token_source {
        events.push(ProtocolEvent::Token {
            text: source["token"].as_str().unwrap_or_default().to_string(),
            response_id: non_empty_str(&source["responseId"]),
            is_thinking: source["isThinking"].as_bool().unwrap_or(false),
            is_soft_stop: source["isSoftStop"].as_bool().unwrap_or(false),
        });
    }

    // 3. finalMetadata
    if let Some(meta) = field_at(wrapped, result, "finalMetadata") {
        events.push(ProtocolEvent::FinalMetadata(parse_record(meta, "finalMetadata")));
    }

    // 4. modelResponse
    if let Some(model) = field_at(wrapped, result, "modelResponse") {
        events.push(ProtocolEvent::ModelResponse(parse_record(model, "modelResponse")));
    }

    // 5. title
    if let Some(new_title) = result
        .get("title")
        .and_then(|t| t.get("newTitle"))
        .and_then(Value::as_str)
    {
        events.push(ProtocolEvent::TitleUpdate {
            new_title: new_title.to_string(),
        });
    }

    // 6. userResponse
    let ack = wrapped
        .and_then(|w| w.get("userResponse"))
        .and_then(|u| non_empty_str(&u["responseId"]))
        .or_else(|| {
            result
                .get("userResponse")
                .and_then(|u| non_empty_str(&u["responseId"]))
        });
    if let Some(response_id) = ack {
        events.push(ProtocolEvent::UserResponseAck { response_id });
    }

    events
}

/// Wrapped location first, then bare. Null and non-object values do not
/// count as present.
fn field_at<'a>(wrapped: Option<&'a Value>, result: &'a Value, field: &str) -> Option<&'a Value> {
    wrapped
        .and_then(|w| w.get(field))
        .filter(|v| v.is_object())
        .or_else(|| result.get(field).filter(|v| v.is_object()))
}

/// Deserialize a record, tolerating bad fields.
///
/// Null fields fall back to their defaults. A field of the wrong type is
/// dropped on its own, so one odd field never costs the identifiers or the
/// message carried next to it.
fn parse_record<T>(value: &Value, what: &str) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    if let Ok(record) = serde_json::from_value(value.clone()) {
        return record;
    }
    let Some(fields) = value.as_object() else {
        return T::default();
    };

    let mut kept = Map::new();
    let mut dropped = Vec::new();
    for (key, field) in fields {
        if field.is_null() {
            continue;
        }
        let mut candidate = kept.clone();
        candidate.insert(key.clone(), field.clone());
        if serde_json::from_value::<T>(Value::Object(candidate)).is_ok() {
            kept.insert(key.clone(), field.clone());
        } else {
            dropped.push(key.as_str());
        }
    }
    if !dropped.is_empty() {
        tracing::warn!(?dropped, "ignoring malformed fields in {what} record");
    }
    serde_json::from_value(Value::Object(kept)).unwrap_or_default()
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

//! Folding protocol events into one [`TurnResponse`].

use crate::event::ProtocolEvent;
use crate::types::{FinalMetadata, ModelResponse};

/// The outcome of one send: everything the response stream reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnResponse {
    /// Concatenated token text, or the model response's message when no
    /// tokens arrived.
    pub message: String,
    /// The last turn identifier observed.
    pub response_id: Option<String>,
    /// Conversation title, if one was announced.
    pub title: Option<String>,
    /// Follow-ups and tools used.
    pub metadata: Option<FinalMetadata>,
    /// The complete model turn record.
    pub model_response: Option<ModelResponse>,
    /// Set when the stream announced a (new) conversation.
    pub conversation_id: Option<String>,
    /// Number of lines that were skipped as unusable.
    pub skipped_lines: usize,
}

impl TurnResponse {
    /// Follow-up suggestions, empty when no metadata arrived.
    pub fn follow_up_suggestions(&self) -> &[String] {
        self.metadata
            .as_ref()
            .map(|m| m.follow_up_suggestions.as_slice())
            .unwrap_or_default()
    }
}

/// Accumulates events in arrival order.
///
/// Precedence rules:
/// - token text is appended;
/// - the response id is taken from whichever token, model response or user
///   acknowledgement carried one last;
/// - metadata, model response, conversation id and title are replaced by
///   each new occurrence.
#[derive(Debug, Default)]
pub struct ResponseAggregator {
    turn: TurnResponse,
}

impl ResponseAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a whole event sequence.
    pub fn collect(events: impl IntoIterator<Item = ProtocolEvent>) -> TurnResponse {
        let mut aggregator = Self::new();
        for event in events {
            aggregator.fold(event);
        }
        aggregator.finish()
    }

    /// Fold one event. Returns the text just appended when the event is a
    /// token, so callers can forward it as it arrives.
    pub fn fold(&mut self, event: ProtocolEvent) -> Option<&str> {
        if let Some(id) = event.response_id() {
            self.turn.response_id = Some(id.to_string());
        }

        match event {
            ProtocolEvent::ConversationCreated(record) => {
                if self.turn.conversation_id.is_none() {
                    tracing::info!(conversation_id = %record.conversation_id, "conversation created");
                }
                self.turn.conversation_id = Some(record.conversation_id);
            }
            ProtocolEvent::Token { text, .. } => {
                let start = self.turn.message.len();
                self.turn.message.push_str(&text);
                return Some(&self.turn.message[start..]);
            }
            ProtocolEvent::FinalMetadata(metadata) => self.turn.metadata = Some(metadata),
            ProtocolEvent::ModelResponse(record) => self.turn.model_response = Some(record),
            ProtocolEvent::TitleUpdate { new_title } => self.turn.title = Some(new_title),
            ProtocolEvent::UserResponseAck { .. } => {}
            ProtocolEvent::Unrecognized(_) => self.turn.skipped_lines += 1,
        }
        None
    }

    /// Text accumulated from tokens so far.
    pub fn message(&self) -> &str {
        &self.turn.message
    }

    /// Finish the turn.
    ///
    /// When no token contributed text, the model response's message (if
    /// non-empty) becomes the turn's message.
    pub fn finish(self) -> TurnResponse {
        let mut turn = self.turn;
        if turn.message.is_empty() {
            if let Some(record) = turn.model_response.as_ref().filter(|m| !m.message.is_empty()) {
                turn.message = record.message.clone();
            }
        }
        turn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode_body;
    use crate::event::{DecodeWarning, DecodeWarningKind};
    use crate::types::ConversationRecord;

    fn token(text: &str, id: Option<&str>) -> ProtocolEvent {
        ProtocolEvent::Token {
            text: text.into(),
            response_id: id.map(Into::into),
            is_thinking: false,
            is_soft_stop: false,
        }
    }

    fn model_response(id: &str, message: &str) -> ProtocolEvent {
        ProtocolEvent::ModelResponse(ModelResponse {
            response_id: id.into(),
            message: message.into(),
            ..Default::default()
        })
    }

    #[test]
    fn greeting_scenario() {
        let body = [
            r#"{"result":{"conversation":{"conversationId":"conv_1"}}}"#,
            r#"{"result":{"response":{"token":"Hello ","responseId":"resp_1"}}}"#,
            r#"{"result":{"response":{"token":"world","responseId":"resp_1"}}}"#,
            r#"{"result":{"response":{"finalMetadata":{"followUpSuggestions":["Why?"],"feedbackLabels":[],"toolsUsed":{}}}}}"#,
        ]
        .join("\n");

        let turn = ResponseAggregator::collect(decode_body(body.as_bytes()));
        assert_eq!(turn.message, "Hello world");
        assert_eq!(turn.response_id.as_deref(), Some("resp_1"));
        assert_eq!(turn.conversation_id.as_deref(), Some("conv_1"));
        assert_eq!(turn.follow_up_suggestions(), ["Why?".to_string()]);
        assert_eq!(turn.skipped_lines, 0);
    }

    #[test]
    fn fold_returns_appended_token_text() {
        let mut aggregator = ResponseAggregator::new();
        assert_eq!(aggregator.fold(token("ab", None)), Some("ab"));
        assert_eq!(aggregator.fold(token("cd", None)), Some("cd"));
        assert_eq!(aggregator.fold(model_response("r", "x")), None);
        assert_eq!(aggregator.message(), "abcd");
    }

    #[test]
    fn model_response_message_is_fallback_only() {
        let turn = ResponseAggregator::collect([model_response("resp_1", "Stored answer")]);
        assert_eq!(turn.message, "Stored answer");

        let turn = ResponseAggregator::collect([
            token("Streamed", Some("resp_1")),
            model_response("resp_1", "Stored answer"),
        ]);
        assert_eq!(turn.message, "Streamed");
    }

    #[test]
    fn empty_tokens_still_allow_fallback() {
        let turn = ResponseAggregator::collect([token("", Some("a")), model_response("b", "Fallback")]);
        assert_eq!(turn.message, "Fallback");
    }

    #[test]
    fn empty_model_message_leaves_message_empty() {
        let turn = ResponseAggregator::collect([model_response("resp_1", "")]);
        assert!(turn.message.is_empty());
        assert!(turn.model_response.is_some());
    }

    #[test]
    fn last_identifier_wins_across_kinds() {
        let turn = ResponseAggregator::collect([
            token("a", Some("tok")),
            model_response("model", "m"),
            ProtocolEvent::UserResponseAck {
                response_id: "ack".into(),
            },
        ]);
        assert_eq!(turn.response_id.as_deref(), Some("ack"));

        let turn = ResponseAggregator::collect([
            ProtocolEvent::UserResponseAck {
                response_id: "ack".into(),
            },
            token("a", Some("tok")),
        ]);
        assert_eq!(turn.response_id.as_deref(), Some("tok"));
    }

    #[test]
    fn model_response_without_id_keeps_token_id() {
        let body = [
            r#"{"result":{"response":{"token":"Hi","responseId":"resp_1"}}}"#,
            r#"{"result":{"response":{"modelResponse":{"message":"Hi"}}}}"#,
        ]
        .join("\n");
        let turn = ResponseAggregator::collect(decode_body(body.as_bytes()));
        assert_eq!(turn.response_id.as_deref(), Some("resp_1"));
        assert_eq!(turn.message, "Hi");
    }

    #[test]
    fn model_response_with_null_fields_still_supplies_fallback() {
        let body = r#"{"result":{"response":{"modelResponse":{"responseId":"resp_2","message":"Stored","query":null}}}}"#;
        let turn = ResponseAggregator::collect(decode_body(body.as_bytes()));
        assert_eq!(turn.message, "Stored");
        assert_eq!(turn.response_id.as_deref(), Some("resp_2"));
        assert_eq!(turn.skipped_lines, 0);
    }

    #[test]
    fn events_without_identifier_keep_previous() {
        let turn = ResponseAggregator::collect([
            token("a", Some("resp_1")),
            token("b", None),
            ProtocolEvent::TitleUpdate {
                new_title: "t".into(),
            },
        ]);
        assert_eq!(turn.response_id.as_deref(), Some("resp_1"));
        assert_eq!(turn.message, "ab");
    }

    #[test]
    fn replacing_fields_are_last_write_wins() {
        let turn = ResponseAggregator::collect([
            ProtocolEvent::TitleUpdate {
                new_title: "first".into(),
            },
            ProtocolEvent::TitleUpdate {
                new_title: "second".into(),
            },
            ProtocolEvent::ConversationCreated(ConversationRecord {
                conversation_id: "c1".into(),
                ..Default::default()
            }),
            ProtocolEvent::ConversationCreated(ConversationRecord {
                conversation_id: "c2".into(),
                ..Default::default()
            }),
            ProtocolEvent::FinalMetadata(FinalMetadata {
                follow_up_suggestions: vec!["old".into()],
                ..Default::default()
            }),
            ProtocolEvent::FinalMetadata(FinalMetadata::default()),
        ]);
        assert_eq!(turn.title.as_deref(), Some("second"));
        assert_eq!(turn.conversation_id.as_deref(), Some("c2"));
        assert!(turn.follow_up_suggestions().is_empty());
    }

    #[test]
    fn unrecognized_lines_are_counted_not_folded() {
        let turn = ResponseAggregator::collect([
            token("a", Some("r")),
            ProtocolEvent::Unrecognized(DecodeWarning {
                kind: DecodeWarningKind::UnknownShape,
                line: "{}".into(),
            }),
            token("b", None),
        ]);
        assert_eq!(turn.message, "ab");
        assert_eq!(turn.response_id.as_deref(), Some("r"));
        assert_eq!(turn.skipped_lines, 1);
    }

    #[test]
    fn empty_stream_yields_empty_turn() {
        let turn = ResponseAggregator::collect(Vec::new());
        assert_eq!(turn, TurnResponse::default());
    }
}

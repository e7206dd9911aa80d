//! Conversation bookkeeping between sends.

use grokline_stream::TurnResponse;

/// Wire sentinel the service uses for "no conversation yet".
pub const NEW_CONVERSATION: &str = "new";

/// Where the session stands in its conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No conversation id known; sends create one.
    NoConversation,
    /// A conversation id is known; continuations are possible.
    ConversationEstablished,
}

/// Snapshot returned by [`crate::Session::conversation_info`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationInfo {
    /// Current conversation, if one was established.
    pub conversation_id: Option<String>,
    /// Last turn, if any send reported one.
    pub last_response_id: Option<String>,
}

impl ConversationInfo {
    /// Conversation id, or [`NEW_CONVERSATION`] when none.
    pub fn conversation_id_or_new(&self) -> &str {
        self.conversation_id.as_deref().unwrap_or(NEW_CONVERSATION)
    }
}

/// The current conversation/turn pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    conversation_id: Option<String>,
    last_response_id: Option<String>,
}

impl ConversationState {
    /// Empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        if self.conversation_id.is_some() {
            Phase::ConversationEstablished
        } else {
            Phase::NoConversation
        }
    }

    /// Conversation id and last turn id, when both are known.
    pub fn continuation(&self) -> Option<(&str, &str)> {
        Some((
            self.conversation_id.as_deref()?,
            self.last_response_id.as_deref().unwrap_or_default(),
        ))
    }

    /// Record a successful turn. Each identifier the turn reported replaces
    /// the stored one; missing identifiers leave it as is.
    pub fn record(&mut self, turn: &TurnResponse) {
        if let Some(id) = &turn.conversation_id {
            self.conversation_id = Some(id.clone());
        }
        if let Some(id) = &turn.response_id {
            self.last_response_id = Some(id.clone());
        }
        tracing::debug!(
            conversation_id = self.conversation_id.as_deref().unwrap_or(NEW_CONVERSATION),
            last_response_id = self.last_response_id.as_deref().unwrap_or_default(),
            "conversation state updated"
        );
    }

    /// Forget the conversation.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Snapshot.
    pub fn info(&self) -> ConversationInfo {
        ConversationInfo {
            conversation_id: self.conversation_id.clone(),
            last_response_id: self.last_response_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(conversation: Option<&str>, response: Option<&str>) -> TurnResponse {
        TurnResponse {
            conversation_id: conversation.map(Into::into),
            response_id: response.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn starts_without_conversation() {
        let state = ConversationState::new();
        assert_eq!(state.phase(), Phase::NoConversation);
        assert!(state.continuation().is_none());
        assert_eq!(state.info().conversation_id_or_new(), "new");
    }

    #[test]
    fn record_establishes_conversation() {
        let mut state = ConversationState::new();
        state.record(&turn(Some("conv_1"), Some("resp_1")));
        assert_eq!(state.phase(), Phase::ConversationEstablished);
        assert_eq!(state.continuation(), Some(("conv_1", "resp_1")));
    }

    #[test]
    fn identifiers_update_independently() {
        let mut state = ConversationState::new();
        state.record(&turn(Some("conv_1"), Some("resp_1")));
        state.record(&turn(None, Some("resp_2")));
        assert_eq!(state.continuation(), Some(("conv_1", "resp_2")));

        state.record(&turn(None, None));
        assert_eq!(state.continuation(), Some(("conv_1", "resp_2")));
    }

    #[test]
    fn response_without_conversation_stays_unestablished() {
        let mut state = ConversationState::new();
        state.record(&turn(None, Some("resp_1")));
        assert_eq!(state.phase(), Phase::NoConversation);
        assert_eq!(state.info().last_response_id.as_deref(), Some("resp_1"));
    }

    #[test]
    fn reset_clears_everything() {
        let mut state = ConversationState::new();
        state.record(&turn(Some("conv_1"), Some("resp_1")));
        state.reset();
        assert_eq!(state, ConversationState::default());
    }
}

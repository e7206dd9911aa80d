//! Records carried inside response lines.
//!
//! Every line is `{"result": {...}}`. The interesting records sit either
//! under `result.response` or directly under `result`; see
//! [`crate::event::classify_line`] for how the two locations are checked.
//!
//! All fields default when absent. The service adds fields freely, so
//! unknown keys are kept in `extra` rather than rejected.

use serde::{Deserialize, Serialize};

/// `result.conversation`: announced once when a conversation is created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversationRecord {
    /// Server-assigned conversation identifier.
    pub conversation_id: String,
    /// Initial title.
    pub title: String,
    /// Whether the user starred the conversation.
    pub starred: bool,
    /// Creation timestamp (RFC 3339 as sent by the service).
    pub create_time: String,
    /// Last modification timestamp.
    pub modify_time: String,
    /// System prompt preset name.
    pub system_prompt_name: String,
    /// Whether the conversation is temporary (not kept in history).
    pub temporary: bool,
    /// Media types present in the conversation.
    pub media_types: Vec<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `finalMetadata`: sent once after the last token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinalMetadata {
    /// Suggested follow-up questions.
    pub follow_up_suggestions: Vec<String>,
    /// Feedback labels offered for the turn.
    pub feedback_labels: Vec<String>,
    /// Tools used while answering, keyed by tool name.
    pub tools_used: serde_json::Map<String, serde_json::Value>,
}

/// `modelResponse`: the complete stored record of the model's turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelResponse {
    /// Identifier of this turn.
    pub response_id: String,
    /// Full message text.
    pub message: String,
    /// `"ASSISTANT"` for model turns.
    pub sender: String,
    /// Creation timestamp.
    pub create_time: String,
    /// Identifier of the turn this one answers.
    pub parent_response_id: String,
    /// Whether the turn was entered manually.
    pub manual: bool,
    /// Whether the turn is incomplete.
    pub partial: bool,
    /// Whether the turn has been shared.
    pub shared: bool,
    /// The user query this turn answers.
    pub query: String,
    /// Kind of query.
    pub query_type: String,
    /// Web search results consulted.
    pub web_search_results: Vec<serde_json::Value>,
    /// Referenced post identifiers.
    pub xpost_ids: Vec<String>,
    /// Referenced posts.
    pub xposts: Vec<serde_json::Value>,
    /// URLs of generated images.
    pub generated_image_urls: Vec<String>,
    /// Image attachments echoed back.
    pub image_attachments: Vec<serde_json::Value>,
    /// File attachments echoed back.
    pub file_attachments: Vec<serde_json::Value>,
    /// Card attachments.
    pub card_attachments_json: Vec<serde_json::Value>,
    /// File URIs.
    pub file_uris: Vec<String>,
    /// File attachment metadata.
    pub file_attachments_metadata: Vec<serde_json::Value>,
    /// Control-group flag.
    pub is_control: bool,
    /// Reasoning steps.
    pub steps: Vec<serde_json::Value>,
    /// Media types present in the turn.
    pub media_types: Vec<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

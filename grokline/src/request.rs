//! Send intents and the wire request built from them.

use grokline_auth::CredentialSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::transport::TransportRequest;

/// Reference to a previously uploaded image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAttachment {
    /// Upload identifier.
    pub file_metadata_id: String,
    /// MIME type, e.g. `image/png`.
    pub file_mime_type: String,
    /// Original file name.
    pub file_name: String,
    /// Storage URI.
    pub file_uri: String,
    /// Parsed storage URI.
    pub parsed_file_uri: String,
    /// Upload timestamp, as reported by the service.
    pub create_time: String,
}

/// Per-send flags. `Default` matches what the web client sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOptions {
    /// Model override; `None` uses [`ClientConfig::model_name`].
    pub model_name: Option<String>,
    /// Turn off web search.
    pub disable_search: bool,
    /// Allow the model to generate images.
    pub enable_image_generation: bool,
    /// Ask for a short answer.
    pub force_concise: bool,
    /// Free-form instructions prepended by the service.
    pub custom_instructions: String,
    /// Request a reasoning turn.
    pub is_reasoning: bool,
    /// Images attached to the message.
    pub image_attachments: Vec<ImageAttachment>,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            model_name: None,
            disable_search: false,
            enable_image_generation: true,
            force_concise: false,
            custom_instructions: String::new(),
            is_reasoning: false,
            image_attachments: Vec::new(),
        }
    }
}

impl SendOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the model for this send.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_name = Some(model.into());
        self
    }

    /// Set `disableSearch`.
    #[must_use]
    pub fn with_disable_search(mut self, disable: bool) -> Self {
        self.disable_search = disable;
        self
    }

    /// Set `enableImageGeneration`.
    #[must_use]
    pub fn with_image_generation(mut self, enable: bool) -> Self {
        self.enable_image_generation = enable;
        self
    }

    /// Set `forceConcise`.
    #[must_use]
    pub fn with_force_concise(mut self, concise: bool) -> Self {
        self.force_concise = concise;
        self
    }

    /// Set `customInstructions`.
    #[must_use]
    pub fn with_custom_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.custom_instructions = instructions.into();
        self
    }

    /// Set `isReasoning`.
    #[must_use]
    pub fn with_reasoning(mut self, reasoning: bool) -> Self {
        self.is_reasoning = reasoning;
        self
    }

    /// Attach an uploaded image.
    #[must_use]
    pub fn with_image(mut self, attachment: ImageAttachment) -> Self {
        self.image_attachments.push(attachment);
        self
    }
}

/// Where a send goes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Target {
    /// Start a new conversation.
    #[default]
    New,
    /// Add a turn to an existing conversation.
    Continue {
        /// Conversation the turn belongs to.
        conversation_id: String,
        /// Turn this one follows.
        parent_response_id: String,
    },
}

/// Which endpoint a request was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `conversations/new`
    Create,
    /// `conversations/{id}/responses`
    Continue,
}

impl Endpoint {
    /// Short name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Endpoint::Create => "create",
            Endpoint::Continue => "continue",
        }
    }
}

/// One message to send, its options and its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendIntent {
    /// Message text.
    pub message: String,
    /// Per-send flags.
    pub options: SendOptions,
    /// Destination; [`Target::New`] unless set.
    pub target: Target,
}

impl SendIntent {
    /// A message for a new conversation with default options.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            options: SendOptions::default(),
            target: Target::New,
        }
    }

    /// Replace the options.
    #[must_use]
    pub fn with_options(mut self, options: SendOptions) -> Self {
        self.options = options;
        self
    }

    /// Continue an explicit conversation instead of starting one.
    #[must_use]
    pub fn continuing(
        mut self,
        conversation_id: impl Into<String>,
        parent_response_id: impl Into<String>,
    ) -> Self {
        self.target = Target::Continue {
            conversation_id: conversation_id.into(),
            parent_response_id: parent_response_id.into(),
        };
        self
    }
}

impl From<&str> for SendIntent {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for SendIntent {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Request body for both endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Always `false`: conversations are kept.
    pub temporary: bool,
    /// Model identifier.
    pub model_name: String,
    /// Message text.
    pub message: String,
    /// Always empty.
    pub file_attachments: Vec<Value>,
    /// Uploaded images.
    pub image_attachments: Vec<ImageAttachment>,
    /// Web search switch.
    pub disable_search: bool,
    /// Image generation switch.
    pub enable_image_generation: bool,
    /// Always `false`.
    pub return_image_bytes: bool,
    /// Always `false`.
    pub return_raw_grok_in_xai_request: bool,
    /// Always `true`.
    pub enable_image_streaming: bool,
    /// Always `2`.
    pub image_generation_count: u32,
    /// Concise answer switch.
    pub force_concise: bool,
    /// Always empty.
    pub tool_overrides: Map<String, Value>,
    /// Always `false`.
    pub enable_side_by_side: bool,
    /// Always `true`, so the stream ends with follow-up suggestions.
    pub send_final_metadata: bool,
    /// Custom instructions.
    pub custom_instructions: String,
    /// Always empty.
    pub deepsearch_preset: String,
    /// Reasoning switch.
    pub is_reasoning: bool,
    /// Previous turn; present only on continue requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_response_id: Option<String>,
}

impl ChatRequest {
    fn new(message: &str, options: &SendOptions, default_model: &str) -> Self {
        Self {
            temporary: false,
            model_name: options
                .model_name
                .clone()
                .unwrap_or_else(|| default_model.to_string()),
            message: message.to_string(),
            file_attachments: Vec::new(),
            image_attachments: options.image_attachments.clone(),
            disable_search: options.disable_search,
            enable_image_generation: options.enable_image_generation,
            return_image_bytes: false,
            return_raw_grok_in_xai_request: false,
            enable_image_streaming: true,
            image_generation_count: 2,
            force_concise: options.force_concise,
            tool_overrides: Map::new(),
            enable_side_by_side: false,
            send_final_metadata: true,
            custom_instructions: options.custom_instructions.clone(),
            deepsearch_preset: String::new(),
            is_reasoning: options.is_reasoning,
            parent_response_id: None,
        }
    }
}

/// Turns a [`SendIntent`] into a [`TransportRequest`].
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    config: &'a ClientConfig,
}

impl<'a> RequestBuilder<'a> {
    /// Build requests against `config`.
    pub fn new(config: &'a ClientConfig) -> Self {
        Self { config }
    }

    /// URL of the create endpoint.
    pub fn create_url(&self) -> String {
        format!("{}/rest/app-chat/conversations/new", self.config.base_url)
    }

    /// URL of the continue endpoint for `conversation_id`. The id is
    /// percent-encoded as a single path segment.
    pub fn continue_url(&self, conversation_id: &str) -> Result<String, ClientError> {
        let mut url = reqwest::Url::parse(&self.config.base_url)
            .map_err(|e| ClientError::InvalidRequest(format!("invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| {
                ClientError::InvalidRequest(format!(
                    "base URL cannot carry a path: {}",
                    self.config.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["rest", "app-chat", "conversations", conversation_id, "responses"]);
        Ok(url.to_string())
    }

    /// Wire body for `intent`.
    pub fn body(&self, intent: &SendIntent) -> ChatRequest {
        let mut body = ChatRequest::new(&intent.message, &intent.options, &self.config.model_name);
        if let Target::Continue {
            parent_response_id, ..
        } = &intent.target
        {
            body.parent_response_id = Some(parent_response_id.clone());
        }
        body
    }

    /// Full request: endpoint, headers (including `cookie`) and body.
    pub fn build(
        &self,
        intent: &SendIntent,
        credentials: &CredentialSet,
    ) -> Result<TransportRequest, ClientError> {
        let (endpoint, url) = match &intent.target {
            Target::New => (Endpoint::Create, self.create_url()),
            Target::Continue {
                conversation_id, ..
            } => (Endpoint::Continue, self.continue_url(conversation_id)?),
        };

        let headers = vec![
            ("accept".to_string(), "*/*".to_string()),
            (
                "accept-language".to_string(),
                self.config.accept_language.clone(),
            ),
            ("content-type".to_string(), "application/json".to_string()),
            ("origin".to_string(), self.config.origin().to_string()),
            ("referer".to_string(), self.config.referer()),
            ("user-agent".to_string(), self.config.user_agent.clone()),
            ("cookie".to_string(), credentials.cookie_header()),
        ];

        Ok(TransportRequest {
            endpoint,
            url,
            headers,
            body: serde_json::to_value(self.body(intent))
                .map_err(|e| ClientError::InvalidRequest(e.to_string()))?,
        })
    }
}

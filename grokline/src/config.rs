//! Client configuration.

/// Default service base URL.
pub const DEFAULT_BASE_URL: &str = "https://grok.com";

/// Default model used when a send does not name one.
pub const DEFAULT_MODEL: &str = "grok-3";

/// Browser user agent presented to the service. Session cookies are bound
/// to browser-like clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default `accept-language` header.
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Static configuration for a [`crate::Session`].
///
/// Per-send overrides come from [`crate::SendOptions`]. This struct holds
/// the defaults.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL, without a trailing slash.
    pub base_url: String,

    /// Model identifier sent when the send does not override it.
    pub model_name: String,

    /// `user-agent` header.
    pub user_agent: String,

    /// `accept-language` header.
    pub accept_language: String,
}

impl ClientConfig {
    /// Configuration for the public service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the client at another base URL (a local mock, a proxy).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the default model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_name = model.into();
        self
    }

    /// Override the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Override the `accept-language` header.
    #[must_use]
    pub fn with_accept_language(mut self, language: impl Into<String>) -> Self {
        self.accept_language = language.into();
        self
    }

    /// `origin` header value.
    pub fn origin(&self) -> &str {
        &self.base_url
    }

    /// `referer` header value.
    pub fn referer(&self) -> String {
        format!("{}/", self.base_url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            model_name: DEFAULT_MODEL.into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.into(),
        }
    }
}

//! The chat session: credentials, conversation state and sends.

use std::sync::Arc;

use futures::StreamExt;
use grokline_auth::{CredentialSet, CredentialStore, Identity};
use grokline_stream::{ResponseAggregator, TurnResponse, decode_stream};

use crate::config::ClientConfig;
use crate::error::{ClientError, map_http_status};
use crate::handler::StreamHandler;
use crate::request::{RequestBuilder, SendIntent, SendOptions};
use crate::state::{ConversationInfo, ConversationState};
use crate::transport::{HttpTransport, Transport};

/// A logged-in chat session.
///
/// Holds the credential set and the current conversation. Sends take
/// `&mut self`, so a session has at most one send in flight.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use grokline::{Session, SendOptions};
/// use grokline_auth::{CredentialStore, MemoryBackend};
///
/// # async fn run() -> Result<(), grokline::ClientError> {
/// let store = CredentialStore::open(Arc::new(MemoryBackend::with_entries(["sso=..."]))).await;
/// let mut session = Session::new(store);
///
/// let first = session.send_message("Hello").await?;
/// println!("{}", first.message);
///
/// let next = session.continue_conversation("Tell me more", SendOptions::default()).await?;
/// println!("{}", next.message);
/// # Ok(())
/// # }
/// ```
pub struct Session {
    config: ClientConfig,
    credentials: CredentialStore,
    transport: Arc<dyn Transport>,
    state: ConversationState,
}

impl Session {
    /// Session over HTTP with default configuration.
    pub fn new(credentials: CredentialStore) -> Self {
        Self {
            config: ClientConfig::default(),
            credentials,
            transport: Arc::new(HttpTransport::new()),
            state: ConversationState::new(),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the transport.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether a credential set is installed.
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_authenticated()
    }

    /// Installed credentials.
    pub fn credentials(&self) -> &CredentialSet {
        self.credentials.current()
    }

    /// Current conversation and last turn.
    pub fn conversation_info(&self) -> ConversationInfo {
        self.state.info()
    }

    /// Forget the current conversation. The next send starts a new one.
    pub fn reset_conversation(&mut self) {
        self.state.reset();
    }

    /// Run credential acquisition for `identity`.
    ///
    /// Returns `Ok(false)` when acquisition yielded no session credentials.
    pub async fn acquire_credentials(&mut self, identity: &Identity) -> Result<bool, ClientError> {
        Ok(self.credentials.acquire(identity).await?)
    }

    /// Make sure credentials are installed, acquiring them with `identity`
    /// if needed.
    pub async fn ensure_authenticated(
        &mut self,
        identity: Option<&Identity>,
    ) -> Result<bool, ClientError> {
        if self.is_authenticated() {
            return Ok(true);
        }
        match identity {
            Some(identity) => self.acquire_credentials(identity).await,
            None => Err(ClientError::AuthenticationRequired),
        }
    }

    /// Send a message and wait for the whole turn.
    ///
    /// Starts a new conversation unless the intent names a continuation
    /// target.
    pub async fn send_message(
        &mut self,
        intent: impl Into<SendIntent>,
    ) -> Result<TurnResponse, ClientError> {
        self.execute(intent.into(), &mut |_: &str| {}).await
    }

    /// Add a turn to the current conversation.
    pub async fn continue_conversation(
        &mut self,
        message: impl Into<String>,
        options: SendOptions,
    ) -> Result<TurnResponse, ClientError> {
        let intent = self.continuation(message.into(), options)?;
        self.execute(intent, &mut |_: &str| {}).await
    }

    /// Send a message, reporting tokens to `handler` as they arrive.
    ///
    /// The handler sees every token, then exactly one of `on_complete` or
    /// `on_error`. The same outcome is returned.
    pub async fn send_message_streaming(
        &mut self,
        intent: impl Into<SendIntent>,
        handler: &mut dyn StreamHandler,
    ) -> Result<TurnResponse, ClientError> {
        let result = self
            .execute(intent.into(), &mut |text: &str| handler.on_token(text))
            .await;
        finish_stream(result, handler)
    }

    /// [`Session::continue_conversation`] with streaming callbacks.
    pub async fn continue_conversation_streaming(
        &mut self,
        message: impl Into<String>,
        options: SendOptions,
        handler: &mut dyn StreamHandler,
    ) -> Result<TurnResponse, ClientError> {
        let result = match self.continuation(message.into(), options) {
            Ok(intent) => {
                self.execute(intent, &mut |text: &str| handler.on_token(text))
                    .await
            }
            Err(e) => Err(e),
        };
        finish_stream(result, handler)
    }

    fn continuation(&self, message: String, options: SendOptions) -> Result<SendIntent, ClientError> {
        self.require_authenticated()?;
        let (conversation_id, parent_response_id) = self
            .state
            .continuation()
            .ok_or(ClientError::ConversationNotStarted)?;
        Ok(SendIntent::new(message)
            .with_options(options)
            .continuing(conversation_id, parent_response_id))
    }

    fn require_authenticated(&self) -> Result<(), ClientError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(ClientError::AuthenticationRequired)
        }
    }

    async fn execute(
        &mut self,
        intent: SendIntent,
        on_token: &mut (dyn FnMut(&str) + Send),
    ) -> Result<TurnResponse, ClientError> {
        self.require_authenticated()?;

        let request = RequestBuilder::new(&self.config).build(&intent, self.credentials.current())?;

        tracing::debug!(
            url = %request.url,
            endpoint = request.endpoint.as_str(),
            "sending message"
        );

        let response = self.transport.send(request).await?;

        if !response.is_success() {
            let status = response.status;
            let body = response.text().await.unwrap_or_default();
            let err = map_http_status(status, &body);
            if err.is_auth_failure() {
                tracing::warn!(status, "credentials rejected, clearing session credentials");
                self.credentials.clear();
            }
            return Err(err);
        }

        let mut aggregator = ResponseAggregator::new();
        let mut events = std::pin::pin!(decode_stream(response.body));
        while let Some(event) = events.next().await {
            if let Some(text) = aggregator.fold(event?) {
                on_token(text);
            }
        }

        let turn = aggregator.finish();
        self.state.record(&turn);
        Ok(turn)
    }
}

fn finish_stream(
    result: Result<TurnResponse, ClientError>,
    handler: &mut dyn StreamHandler,
) -> Result<TurnResponse, ClientError> {
    match &result {
        Ok(turn) => handler.on_complete(turn),
        Err(e) => handler.on_error(e),
    }
    result
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("authenticated", &self.is_authenticated())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

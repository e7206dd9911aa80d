//! Callbacks for streaming sends.

use grokline_stream::TurnResponse;

use crate::error::ClientError;

/// Receives a streaming send as it happens.
///
/// `on_token` fires once per token in arrival order, then exactly one of
/// `on_complete` or `on_error` fires.
pub trait StreamHandler: Send {
    /// A token's text.
    fn on_token(&mut self, _text: &str) {}

    /// The send succeeded.
    fn on_complete(&mut self, _response: &TurnResponse) {}

    /// The send failed.
    fn on_error(&mut self, _error: &ClientError) {}
}

type TokenFn = Box<dyn FnMut(&str) + Send>;
type CompleteFn = Box<dyn FnMut(&TurnResponse) + Send>;
type ErrorFn = Box<dyn FnMut(&ClientError) + Send>;

/// [`StreamHandler`] built from closures. Unset callbacks do nothing.
///
/// ```
/// use grokline::StreamCallbacks;
///
/// let handler = StreamCallbacks::new()
///     .with_token(|text| print!("{text}"))
///     .with_error(|err| eprintln!("send failed: {err}"));
/// # let _ = handler;
/// ```
#[derive(Default)]
pub struct StreamCallbacks {
    token: Option<TokenFn>,
    complete: Option<CompleteFn>,
    error: Option<ErrorFn>,
}

impl StreamCallbacks {
    /// No callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called for every token.
    #[must_use]
    pub fn with_token(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.token = Some(Box::new(f));
        self
    }

    /// Called once on success.
    #[must_use]
    pub fn with_complete(mut self, f: impl FnMut(&TurnResponse) + Send + 'static) -> Self {
        self.complete = Some(Box::new(f));
        self
    }

    /// Called once on failure.
    #[must_use]
    pub fn with_error(mut self, f: impl FnMut(&ClientError) + Send + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }
}

impl StreamHandler for StreamCallbacks {
    fn on_token(&mut self, text: &str) {
        if let Some(f) = self.token.as_mut() {
            f(text);
        }
    }

    fn on_complete(&mut self, response: &TurnResponse) {
        if let Some(f) = self.complete.as_mut() {
            f(response);
        }
    }

    fn on_error(&mut self, error: &ClientError) {
        if let Some(f) = self.error.as_mut() {
            f(error);
        }
    }
}

impl std::fmt::Debug for StreamCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamCallbacks")
            .field("on_token", &self.token.is_some())
            .field("on_complete", &self.complete.is_some())
            .field("on_error", &self.error.is_some())
            .finish()
    }
}

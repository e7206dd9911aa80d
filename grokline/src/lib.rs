#![deny(missing_docs)]
//! Session client for a browser-cookie-authenticated chat service.
//!
//! A [`Session`] owns the credential set and the current conversation.
//! Each send builds a request ([`RequestBuilder`]), hands it to a
//! [`Transport`], decodes the JSON Lines response and folds it into a
//! [`TurnResponse`]. Continuations reuse the conversation id and last turn
//! id from the previous successful send.
//!
//! Tracing events are emitted under the `grokline` targets; no subscriber
//! is installed and credential values are never logged.

pub mod config;
pub mod error;
pub mod handler;
pub mod request;
pub mod session;
pub mod state;
pub mod transport;

pub use config::ClientConfig;
pub use error::{ClientError, TransportError};
pub use handler::{StreamCallbacks, StreamHandler};
pub use request::{ChatRequest, Endpoint, ImageAttachment, RequestBuilder, SendIntent, SendOptions, Target};
pub use session::Session;
pub use state::{ConversationInfo, ConversationState, NEW_CONVERSATION, Phase};
pub use transport::{ByteStream, HttpTransport, Transport, TransportRequest, TransportResponse};

pub use grokline_stream::{FinalMetadata, ModelResponse, TurnResponse};

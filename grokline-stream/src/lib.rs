#![deny(missing_docs)]
//! Response decoding for grokline.
//!
//! A response body is a stream of JSON Lines. [`StreamDecoder`] splits raw
//! byte chunks into lines and classifies each into a [`ProtocolEvent`];
//! [`ResponseAggregator`] folds the events into a [`TurnResponse`].
//!
//! Unusable lines become [`ProtocolEvent::Unrecognized`] and never stop
//! decoding.

pub mod aggregate;
pub mod decoder;
pub mod event;
pub mod types;

pub use aggregate::{ResponseAggregator, TurnResponse};
pub use decoder::{StreamDecoder, decode_body, decode_stream};
pub use event::{DecodeWarning, DecodeWarningKind, ProtocolEvent, classify_line, classify_value};
pub use types::{ConversationRecord, FinalMetadata, ModelResponse};

#![deny(missing_docs)]
//! Session credentials for grokline.
//!
//! The chat service authenticates with browser-session cookies. This crate
//! holds them as a [`CredentialSet`] and defines the two capabilities that
//! live outside the client:
//!
//! - [`CredentialAcquirer`] produces raw credentials for an [`Identity`]
//!   (in practice an interactive browser login).
//! - [`CredentialBackend`] loads and saves the persisted credential blob.
//!
//! [`CredentialStore`] ties them together: it owns the in-memory set, loads
//! it at construction, filters freshly acquired credentials down to
//! [`SESSION_CREDENTIAL_NAMES`], and persists the result.

pub mod acquire;
pub mod backend;
pub mod credential;
pub mod store;

use thiserror::Error;

pub use acquire::{CredentialAcquirer, Identity, RawCredential, StaticAcquirer};
pub use backend::{CredentialBackend, MemoryBackend};
pub use credential::{Credential, CredentialSet};
pub use store::{CredentialStore, SESSION_CREDENTIAL_NAMES, session_credentials};

/// Errors from credential acquisition and persistence.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AuthError {
    /// The acquisition collaborator failed (login rejected, timed out, etc.).
    #[error("acquisition failed: {0}")]
    AcquisitionFailed(String),

    /// No acquisition collaborator was configured on the store.
    #[error("no credential acquirer configured")]
    AcquisitionUnavailable,

    /// Reading or writing the persisted blob failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The persisted blob exists but is not a credential list.
    #[error("invalid credential blob: {0}")]
    InvalidBlob(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

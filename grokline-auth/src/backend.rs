//! Persistence of the credential blob.

use crate::AuthError;
use crate::credential::CredentialSet;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Loads and saves the persisted credential set.
///
/// The stored form is a list of `name=value` entries. `save` replaces the
/// whole blob; there are no partial updates.
#[async_trait]
pub trait CredentialBackend: Send + Sync {
    /// Load the persisted set. `Ok(None)` means nothing has been saved yet.
    async fn load(&self) -> Result<Option<CredentialSet>, AuthError>;

    /// Replace the persisted set.
    async fn save(&self, credentials: &CredentialSet) -> Result<(), AuthError>;
}

/// In-memory backend. Suitable for tests and for sessions that must not
/// touch disk.
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<Option<Vec<String>>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend that already holds a saved blob.
    pub fn with_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: RwLock::new(Some(entries.into_iter().map(Into::into).collect())),
        }
    }

    /// The raw saved entries, if any.
    pub async fn entries(&self) -> Option<Vec<String>> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl CredentialBackend for MemoryBackend {
    async fn load(&self) -> Result<Option<CredentialSet>, AuthError> {
        let entries = self.entries.read().await;
        Ok(entries.as_ref().map(CredentialSet::from_entries))
    }

    async fn save(&self, credentials: &CredentialSet) -> Result<(), AuthError> {
        *self.entries.write().await = Some(credentials.to_entries());
        Ok(())
    }
}

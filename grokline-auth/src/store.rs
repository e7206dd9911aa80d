//! The in-memory credential set plus its persistence and acquisition.

use crate::AuthError;
use crate::acquire::{CredentialAcquirer, Identity, RawCredential};
use crate::backend::CredentialBackend;
use crate::credential::{Credential, CredentialSet};
use std::sync::Arc;

/// Cookie names that carry session or anti-automation state. Everything
/// else a login produces (analytics, preferences) is dropped.
pub const SESSION_CREDENTIAL_NAMES: &[&str] = &[
    "x-anonuserid",
    "x-challenge",
    "x-signature",
    "sso",
    "sso-rw",
    "next-auth.session-token",
    "next-auth.csrf-token",
    "next-auth.callback-url",
    "__Secure-next-auth.session-token",
    "__Secure-next-auth.callback-url",
    "__Host-next-auth.csrf-token",
];

/// Filter raw credentials down to [`SESSION_CREDENTIAL_NAMES`], keeping the
/// order they were reported in.
pub fn session_credentials(raw: &[RawCredential]) -> CredentialSet {
    raw.iter()
        .filter(|c| SESSION_CREDENTIAL_NAMES.contains(&c.name.as_str()))
        .map(|c| Credential::new(c.name.clone(), c.value.as_str()))
        .collect()
}

/// Holds the current credential set.
///
/// The set is replaced wholesale: by [`CredentialStore::acquire`] on a
/// successful login, or emptied by [`CredentialStore::clear`] when the
/// service rejects it. Clearing never touches the persisted blob.
pub struct CredentialStore {
    current: CredentialSet,
    backend: Arc<dyn CredentialBackend>,
    acquirer: Option<Arc<dyn CredentialAcquirer>>,
}

impl CredentialStore {
    /// Open a store, loading whatever the backend has persisted.
    ///
    /// A missing or unreadable blob yields an unauthenticated store.
    pub async fn open(backend: Arc<dyn CredentialBackend>) -> Self {
        let current = load_or_empty(backend.as_ref()).await;
        if current.is_empty() {
            tracing::info!("no stored credentials; acquire credentials before sending");
        } else {
            tracing::debug!(count = current.len(), "loaded stored credentials");
        }
        Self {
            current,
            backend,
            acquirer: None,
        }
    }

    /// Start from an explicit credential set without loading the backend.
    pub fn from_credentials(backend: Arc<dyn CredentialBackend>, credentials: CredentialSet) -> Self {
        Self {
            current: credentials,
            backend,
            acquirer: None,
        }
    }

    /// Attach the acquisition collaborator used by [`CredentialStore::acquire`].
    pub fn with_acquirer(mut self, acquirer: Arc<dyn CredentialAcquirer>) -> Self {
        self.acquirer = Some(acquirer);
        self
    }

    /// Read the persisted set. Missing or unreadable → empty.
    pub async fn load(&self) -> CredentialSet {
        load_or_empty(self.backend.as_ref()).await
    }

    /// Replace the persisted set.
    pub async fn save(&self, credentials: &CredentialSet) -> Result<(), AuthError> {
        self.backend.save(credentials).await
    }

    /// True iff the in-memory set is non-empty.
    pub fn is_authenticated(&self) -> bool {
        !self.current.is_empty()
    }

    /// The in-memory set.
    pub fn current(&self) -> &CredentialSet {
        &self.current
    }

    /// Empty the in-memory set. The persisted blob is left alone.
    pub fn clear(&mut self) {
        self.current = CredentialSet::new();
    }

    /// Run acquisition for `identity`, keep only session credentials,
    /// install them and persist them.
    ///
    /// Returns `Ok(false)` when acquisition produced no session credentials;
    /// the current set is left unchanged in that case. A persistence failure
    /// is logged and does not undo the in-memory install.
    pub async fn acquire(&mut self, identity: &Identity) -> Result<bool, AuthError> {
        let acquirer = self
            .acquirer
            .as_ref()
            .ok_or(AuthError::AcquisitionUnavailable)?;

        tracing::info!(username = identity.username(), "acquiring session credentials");
        let raw = acquirer.acquire(identity).await?;
        let filtered = session_credentials(&raw);

        if filtered.is_empty() {
            tracing::warn!(
                received = raw.len(),
                "acquisition returned no session credentials"
            );
            return Ok(false);
        }

        if let Err(e) = self.backend.save(&filtered).await {
            tracing::warn!(error = %e, "failed to persist acquired credentials");
        }
        tracing::info!(count = filtered.len(), "installed session credentials");
        self.current = filtered;
        Ok(true)
    }
}

async fn load_or_empty(backend: &dyn CredentialBackend) -> CredentialSet {
    match backend.load().await {
        Ok(Some(set)) => set,
        Ok(None) => CredentialSet::new(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load stored credentials");
            CredentialSet::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::StaticAcquirer;
    use crate::backend::MemoryBackend;
    use async_trait::async_trait;

    struct FailingBackend;
    #[async_trait]
    impl CredentialBackend for FailingBackend {
        async fn load(&self) -> Result<Option<CredentialSet>, AuthError> {
            Err(AuthError::InvalidBlob("not a list".into()))
        }
        async fn save(&self, _credentials: &CredentialSet) -> Result<(), AuthError> {
            Err(AuthError::Storage("read-only".into()))
        }
    }

    struct FailingAcquirer;
    #[async_trait]
    impl CredentialAcquirer for FailingAcquirer {
        async fn acquire(&self, _identity: &Identity) -> Result<Vec<RawCredential>, AuthError> {
            Err(AuthError::AcquisitionFailed("captcha".into()))
        }
    }

    fn identity() -> Identity {
        Identity::new("me@example.com", "pw")
    }

    #[test]
    fn session_credentials_filters_to_allow_list() {
        let raw = vec![
            RawCredential::new("_ga", "analytics"),
            RawCredential::new("sso", "a"),
            RawCredential::new("theme", "dark"),
            RawCredential::new("__Host-next-auth.csrf-token", "b"),
            RawCredential::new("x-challenge", "c"),
        ];
        let set = session_credentials(&raw);
        assert_eq!(
            set.names().collect::<Vec<_>>(),
            vec!["sso", "__Host-next-auth.csrf-token", "x-challenge"]
        );
    }

    #[tokio::test]
    async fn open_loads_persisted_set() {
        let backend = Arc::new(MemoryBackend::with_entries(["sso=abc", "sso-rw=def"]));
        let store = CredentialStore::open(backend).await;
        assert!(store.is_authenticated());
        assert_eq!(store.current().len(), 2);
    }

    #[tokio::test]
    async fn open_with_nothing_persisted_is_unauthenticated() {
        let store = CredentialStore::open(Arc::new(MemoryBackend::new())).await;
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn open_with_unreadable_blob_is_unauthenticated() {
        let store = CredentialStore::open(Arc::new(FailingBackend)).await;
        assert!(!store.is_authenticated());
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn acquire_installs_and_persists_filtered_set() {
        let backend = Arc::new(MemoryBackend::new());
        let mut store = CredentialStore::open(backend.clone())
            .await
            .with_acquirer(Arc::new(StaticAcquirer::from_entries([
                "sso=abc",
                "_ga=ignored",
                "x-signature=sig",
            ])));

        assert!(store.acquire(&identity()).await.unwrap());
        assert!(store.is_authenticated());
        assert_eq!(
            store.current().names().collect::<Vec<_>>(),
            vec!["sso", "x-signature"]
        );
        assert_eq!(
            backend.entries().await,
            Some(vec!["sso=abc".to_string(), "x-signature=sig".to_string()])
        );
    }

    #[tokio::test]
    async fn acquire_with_no_session_cookies_returns_false() {
        let backend = Arc::new(MemoryBackend::with_entries(["sso=old"]));
        let mut store = CredentialStore::open(backend.clone())
            .await
            .with_acquirer(Arc::new(StaticAcquirer::from_entries(["_ga=1", "theme=dark"])));

        assert!(!store.acquire(&identity()).await.unwrap());
        // Current and persisted sets untouched.
        assert!(store.current().contains("sso"));
        assert_eq!(backend.entries().await, Some(vec!["sso=old".to_string()]));
    }

    #[tokio::test]
    async fn acquire_without_acquirer_fails() {
        let mut store = CredentialStore::open(Arc::new(MemoryBackend::new())).await;
        let err = store.acquire(&identity()).await.unwrap_err();
        assert!(matches!(err, AuthError::AcquisitionUnavailable));
    }

    #[tokio::test]
    async fn acquire_propagates_acquirer_failure() {
        let mut store = CredentialStore::open(Arc::new(MemoryBackend::new()))
            .await
            .with_acquirer(Arc::new(FailingAcquirer));
        let err = store.acquire(&identity()).await.unwrap_err();
        assert_eq!(err.to_string(), "acquisition failed: captcha");
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn acquire_survives_persistence_failure() {
        let mut store = CredentialStore::from_credentials(Arc::new(FailingBackend), CredentialSet::new())
            .with_acquirer(Arc::new(StaticAcquirer::from_entries(["sso=abc"])));
        assert!(store.acquire(&identity()).await.unwrap());
        assert!(store.is_authenticated());
    }

    #[tokio::test]
    async fn clear_keeps_persisted_blob() {
        let backend = Arc::new(MemoryBackend::with_entries(["sso=abc"]));
        let mut store = CredentialStore::open(backend.clone()).await;
        store.clear();
        assert!(!store.is_authenticated());
        assert_eq!(store.load().await.len(), 1);
    }

    #[tokio::test]
    async fn save_replaces_persisted_set() {
        let backend = Arc::new(MemoryBackend::new());
        let store = CredentialStore::from_credentials(backend.clone(), CredentialSet::new());
        store
            .save(&CredentialSet::from_entries(["sso-rw=1"]))
            .await
            .unwrap();
        assert!(store.load().await.contains("sso-rw"));
    }
}

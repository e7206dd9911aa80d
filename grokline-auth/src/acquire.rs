//! The credential acquisition capability.
//!
//! Acquisition is the interactive login that yields session cookies. It can
//! block for a human-scale amount of time and is never run as part of a
//! message send.

use crate::AuthError;
use async_trait::async_trait;
use zeroize::Zeroizing;

/// Login identity handed to a [`CredentialAcquirer`].
#[derive(Clone)]
pub struct Identity {
    username: String,
    password: Zeroizing<String>,
}

impl Identity {
    /// Create an identity from a username (email) and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// The username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Scoped exposure of the password.
    pub fn with_password<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(&self.password)
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// A credential as reported by the acquisition collaborator, before
/// filtering.
#[derive(Clone)]
pub struct RawCredential {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: Zeroizing<String>,
    /// Cookie domain, if the collaborator reports one.
    pub domain: Option<String>,
}

impl RawCredential {
    /// Create a raw credential without domain information.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Zeroizing::new(value.into()),
            domain: None,
        }
    }

    /// Attach the cookie domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

impl std::fmt::Debug for RawCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawCredential")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .field("domain", &self.domain)
            .finish()
    }
}

/// Obtains raw session credentials for an identity.
#[async_trait]
pub trait CredentialAcquirer: Send + Sync {
    /// Run the login flow and return every credential it produced.
    async fn acquire(&self, identity: &Identity) -> Result<Vec<RawCredential>, AuthError>;
}

/// Acquirer that returns a fixed credential list. For tests and for cookies
/// exported by hand from a browser.
pub struct StaticAcquirer {
    credentials: Vec<RawCredential>,
}

impl StaticAcquirer {
    /// Create with a fixed list.
    pub fn new(credentials: Vec<RawCredential>) -> Self {
        Self { credentials }
    }

    /// Create from `name=value` entries. Entries without `=` are skipped.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let credentials = entries
            .into_iter()
            .filter_map(|entry| {
                entry
                    .as_ref()
                    .split_once('=')
                    .map(|(name, value)| RawCredential::new(name, value))
            })
            .collect();
        Self { credentials }
    }
}

#[async_trait]
impl CredentialAcquirer for StaticAcquirer {
    async fn acquire(&self, _identity: &Identity) -> Result<Vec<RawCredential>, AuthError> {
        Ok(self.credentials.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn _assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn object_safety() {
        _assert_send_sync::<Box<dyn CredentialAcquirer>>();
        _assert_send_sync::<Arc<dyn CredentialAcquirer>>();
        let _: Arc<dyn CredentialAcquirer> = Arc::new(StaticAcquirer::new(vec![]));
    }

    #[test]
    fn identity_debug_is_redacted() {
        let identity = Identity::new("me@example.com", "hunter2");
        let debug = format!("{identity:?}");
        assert!(debug.contains("me@example.com"));
        assert!(!debug.contains("hunter2"));
        identity.with_password(|p| assert_eq!(p, "hunter2"));
    }

    #[test]
    fn raw_credential_debug_is_redacted() {
        let raw = RawCredential::new("sso", "token-value").with_domain(".grok.com");
        let debug = format!("{raw:?}");
        assert!(debug.contains(".grok.com"));
        assert!(!debug.contains("token-value"));
    }

    #[tokio::test]
    async fn static_acquirer_returns_entries() {
        let acquirer = StaticAcquirer::from_entries(["sso=abc", "bogus", "theme=dark"]);
        let raw = acquirer
            .acquire(&Identity::new("u", "p"))
            .await
            .unwrap();
        let names: Vec<_> = raw.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["sso", "theme"]);
    }
}

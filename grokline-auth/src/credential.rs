//! Credential values and the ordered, name-unique [`CredentialSet`].

use zeroize::Zeroizing;

/// One session credential (a cookie).
///
/// The value is zeroed on drop and never shown by `Debug`.
#[derive(Clone)]
pub struct Credential {
    name: String,
    value: Zeroizing<String>,
}

impl Credential {
    /// Create a credential from a name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Zeroizing::new(value.into()),
        }
    }

    /// Parse a `name=value` entry, splitting on the first `=`.
    ///
    /// Returns `None` when there is no `=` or the name is empty.
    pub fn parse(entry: &str) -> Option<Self> {
        let (name, value) = entry.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self::new(name, value))
    }

    /// The credential name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scoped exposure of the value.
    pub fn with_value<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(&self.value)
    }

    /// Render as a `name=value` entry.
    pub fn to_entry(&self) -> String {
        format!("{}={}", self.name, self.value.as_str())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Ordered set of credentials, unique by name.
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    entries: Vec<Credential>,
}

impl CredentialSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from `name=value` entries (the persisted blob format).
    ///
    /// Malformed entries are skipped.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for entry in entries {
            match Credential::parse(entry.as_ref()) {
                Some(credential) => set.insert(credential),
                None => tracing::warn!("skipping malformed credential entry"),
            }
        }
        set
    }

    /// Insert a credential. A credential with the same name is replaced in
    /// place, keeping its position.
    pub fn insert(&mut self, credential: Credential) {
        match self.entries.iter_mut().find(|c| c.name == credential.name) {
            Some(existing) => *existing = credential,
            None => self.entries.push(credential),
        }
    }

    /// Look up a credential by name.
    pub fn get(&self, name: &str) -> Option<&Credential> {
        self.entries.iter().find(|c| c.name == name)
    }

    /// Whether a credential with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Credential names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|c| c.name.as_str())
    }

    /// Iterate over the credentials in order.
    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.entries.iter()
    }

    /// Number of credentials.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the set holds no credentials.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the `name=value` entries for persistence.
    pub fn to_entries(&self) -> Vec<String> {
        self.entries.iter().map(Credential::to_entry).collect()
    }

    /// Render a `Cookie` request header value (`a=1; b=2`).
    pub fn cookie_header(&self) -> String {
        self.to_entries().join("; ")
    }
}

impl FromIterator<Credential> for CredentialSet {
    fn from_iter<I: IntoIterator<Item = Credential>>(iter: I) -> Self {
        let mut set = Self::new();
        for credential in iter {
            set.insert(credential);
        }
        set
    }
}

#![deny(missing_docs)]
//! File-backed credential persistence.
//!
//! The blob is a pretty-printed JSON array of `"name=value"` strings:
//!
//! ```text
//! [
//!   "sso=eyJhbGciOi...",
//!   "sso-rw=eyJhbGciOi..."
//! ]
//! ```
//!
//! Saves write a sibling temporary file and rename it over the target, so a
//! reader never observes a half-written blob.

use async_trait::async_trait;
use grokline_auth::{AuthError, CredentialBackend, CredentialSet};
use std::path::{Path, PathBuf};

/// File name used by [`FileBackend::default_path`].
pub const DEFAULT_FILE_NAME: &str = "grok-cookies.json";

/// Persists credentials as a JSON array in a single file.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Create with the path to the blob file. Parent directories are created
    /// lazily on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `grok-cookies.json` in the current working directory.
    pub fn default_path() -> PathBuf {
        PathBuf::from(DEFAULT_FILE_NAME)
    }

    /// The blob file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_FILE_NAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Default for FileBackend {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

#[async_trait]
impl CredentialBackend for FileBackend {
    async fn load(&self) -> Result<Option<CredentialSet>, AuthError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AuthError::Storage(format!(
                    "failed to read credential file: {e}"
                )));
            }
        };
        let entries: Vec<String> = serde_json::from_str(&contents)
            .map_err(|e| AuthError::InvalidBlob(e.to_string()))?;
        tracing::debug!(path = %self.path.display(), count = entries.len(), "read credential file");
        Ok(Some(CredentialSet::from_entries(entries)))
    }

    async fn save(&self, credentials: &CredentialSet) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AuthError::Storage(e.to_string()))?;
        }

        let contents = serde_json::to_string_pretty(&credentials.to_entries())
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| AuthError::Storage(format!("failed to write credential file: {e}")))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| AuthError::Storage(format!("failed to replace credential file: {e}")))?;

        tracing::debug!(path = %self.path.display(), count = credentials.len(), "saved credential file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn _assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn object_safety() {
        _assert_send_sync::<Box<dyn CredentialBackend>>();
        let _: Arc<dyn CredentialBackend> = Arc::new(FileBackend::new("/tmp/cookies.json"));
    }

    #[test]
    fn default_path_is_cookie_file() {
        assert_eq!(FileBackend::default().path(), Path::new("grok-cookies.json"));
    }

    #[tokio::test]
    async fn missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("absent.json"));
        assert!(backend.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reads_json_array_of_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, r#"["sso=abc", "sso-rw=d=e"]"#).unwrap();

        let set = FileBackend::new(&path).load().await.unwrap().unwrap();
        assert_eq!(set.len(), 2);
        set.get("sso-rw").unwrap().with_value(|v| assert_eq!(v, "d=e"));
    }

    #[tokio::test]
    async fn rejects_non_array_blob() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, r#"{"sso":"abc"}"#).unwrap();

        let err = FileBackend::new(&path).load().await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidBlob(_)));
    }

    #[tokio::test]
    async fn save_writes_pretty_array_and_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cookies.json");
        let backend = FileBackend::new(&path);

        backend
            .save(&CredentialSet::from_entries(["sso=1", "x-challenge=2"]))
            .await
            .unwrap();
        backend
            .save(&CredentialSet::from_entries(["sso=3"]))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let entries: Vec<String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(entries, vec!["sso=3"]);
        assert!(raw.contains('\n'), "expected pretty-printed JSON");
        assert!(!backend.temp_path().exists());
    }
}

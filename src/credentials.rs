use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Source of the bearer token attached to API requests.
/// Queried on every request; implementations must not cache.
pub trait CredentialProvider: Send + Sync {
    fn current_token(&self) -> Option<String>;
}

/// Token persisted as a plain file under the state directory.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join("auth_token"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, token.trim())
            .with_context(|| format!("Failed to write token to {}", self.path.display()))
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        }
        Ok(())
    }
}

impl CredentialProvider for FileTokenStore {
    fn current_token(&self) -> Option<String> {
        let token = fs::read_to_string(&self.path).ok()?;
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }
}

/// Fixed token, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl CredentialProvider for StaticToken {
    fn current_token(&self) -> Option<String> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_token_is_read_per_call() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(&temp_dir.path().join("state"));

        assert_eq!(store.current_token(), None);

        store.save("abc123\n").unwrap();
        assert_eq!(store.current_token().as_deref(), Some("abc123"));

        // Changed behind our back, picked up on the next call
        fs::write(store.path(), "rotated").unwrap();
        assert_eq!(store.current_token().as_deref(), Some("rotated"));

        store.clear().unwrap();
        assert_eq!(store.current_token(), None);
    }

    #[test]
    fn test_blank_token_counts_as_absent() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(temp_dir.path());
        store.save("   ").unwrap();
        assert_eq!(store.current_token(), None);
    }
}

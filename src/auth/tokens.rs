//! Token storage and management

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::AuthError;

/// Treat tokens this close to expiry as already expired.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Cached OAuth credentials, persisted as-is to the cache file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp, seconds
    pub expires_at: i64,
}

impl StoredToken {
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now + EXPIRY_SKEW_SECS >= self.expires_at
    }
}

/// Token store trait for different storage backends
pub trait TokenStore {
    /// Whether a cached token is present at all.
    fn exists(&self) -> bool;
    fn load(&self) -> Result<StoredToken, AuthError>;
    /// Replace the cached token.
    fn save(&self, token: &StoredToken) -> Result<(), AuthError>;
}

/// JSON file on local disk.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cache_error(&self, source: std::io::Error) -> AuthError {
        AuthError::Cache {
            path: self.path.clone(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> Result<StoredToken, AuthError> {
        let content = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => AuthError::NotFound(self.path.clone()),
            _ => self.cache_error(e),
        })?;
        serde_json::from_str(&content).map_err(|source| AuthError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, token: &StoredToken) -> Result<(), AuthError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| self.cache_error(e))?;
        }

        let content = serde_json::to_string(token).map_err(|source| AuthError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, content).map_err(|e| self.cache_error(e))?;

        // Set restrictive permissions on the cache (contains tokens)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&self.path, perms).map_err(|e| self.cache_error(e))?;
        }

        tracing::debug!("Token cached at {}", self.path.display());
        Ok(())
    }
}

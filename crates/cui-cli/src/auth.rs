//! Auth token bootstrap
//!
//! A login URL carries the token in its fragment (`#token=<32 hex chars>`).
//! The token is stored in ~/.config/cui/auth.json with restricted
//! permissions (0o600) and expires after seven days.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use crate::config::Config;

const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("URL has no #token= fragment")]
    MissingFragment,

    #[error("Invalid token format (expected 32 lowercase hex characters)")]
    InvalidFormat,

    #[error("Token store error: {0}")]
    Io(#[from] io::Error),

    #[error("Token store is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// Whether `token` has the shape the backend issues
pub fn is_valid_token(token: &str) -> bool {
    Regex::new(r"^[a-f0-9]{32}$").is_ok_and(|re| re.is_match(token))
}

/// Pull the token out of a login URL's fragment
pub fn token_from_url(url: &str) -> Result<String, AuthError> {
    let token = url
        .split_once('#')
        .and_then(|(_, fragment)| fragment.strip_prefix("token="))
        .ok_or(AuthError::MissingFragment)?;
    if !is_valid_token(token) {
        tracing::warn!("Invalid token format in URL fragment");
        return Err(AuthError::InvalidFormat);
    }
    Ok(token.to_string())
}

/// A token with its expiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    /// Expiry timestamp in milliseconds
    pub expires: i64,
}

impl StoredToken {
    pub fn new(token: impl Into<String>) -> Self {
        let expires = chrono::Utc::now().timestamp_millis()
            + chrono::Duration::days(TOKEN_TTL_DAYS).num_milliseconds();
        Self {
            token: token.into(),
            expires,
        }
    }

    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp_millis() >= self.expires
    }
}

/// File-backed token storage
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store next to the config file
    pub fn open_default() -> Self {
        Self::new(Config::config_dir().join("auth.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, token: &str) -> Result<StoredToken, AuthError> {
        if !is_valid_token(token) {
            return Err(AuthError::InvalidFormat);
        }
        if let Some(dir) = self.path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
                #[cfg(unix)]
                fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
            }
        }

        let stored = StoredToken::new(token);
        fs::write(&self.path, serde_json::to_string_pretty(&stored)?)?;

        #[cfg(unix)]
        fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;

        Ok(stored)
    }

    /// The stored token if present and not expired. Expired tokens are removed.
    pub fn load(&self) -> Option<String> {
        let content = fs::read_to_string(&self.path).ok()?;
        let stored: StoredToken = match serde_json::from_str(&content) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("Ignoring unreadable token store {}: {}", self.path.display(), e);
                return None;
            }
        };
        if stored.is_expired() {
            tracing::debug!("Stored token expired, removing");
            let _ = self.remove();
            return None;
        }
        Some(stored.token)
    }

    /// Returns whether a token was removed
    pub fn remove(&self) -> Result<bool, AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "0123456789abcdef0123456789abcdef";

    fn temp_store(name: &str) -> TokenStore {
        let dir = std::env::temp_dir().join(format!("cui-auth-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        TokenStore::new(dir.join("auth.json"))
    }

    #[test]
    fn test_token_from_url() {
        let url = format!("http://localhost:3001/#token={}", TOKEN);
        assert_eq!(token_from_url(&url).unwrap(), TOKEN);
    }

    #[test]
    fn test_rejects_bad_tokens() {
        assert!(matches!(
            token_from_url("http://localhost:3001/"),
            Err(AuthError::MissingFragment)
        ));
        assert!(matches!(
            token_from_url("http://localhost:3001/#session=abc"),
            Err(AuthError::MissingFragment)
        ));
        for bad in [
            "0123456789ABCDEF0123456789ABCDEF",
            "0123456789abcdef",
            "0123456789abcdef0123456789abcdefff",
            "0123456789abcdeg0123456789abcdef",
        ] {
            assert!(matches!(
                token_from_url(&format!("http://h/#token={}", bad)),
                Err(AuthError::InvalidFormat)
            ));
        }
    }

    #[test]
    fn test_expiry_is_seven_days() {
        let stored = StoredToken::new(TOKEN);
        let now = chrono::Utc::now().timestamp_millis();
        let week = 7 * 24 * 60 * 60 * 1000;
        assert!(stored.expires >= now + week - 1000 && stored.expires <= now + week + 1000);
        assert!(!stored.is_expired());
    }

    #[test]
    fn test_store_round_trip() {
        let store = temp_store("round-trip");
        assert_eq!(store.load(), None);

        store.save(TOKEN).unwrap();
        assert_eq!(store.load().as_deref(), Some(TOKEN));

        #[cfg(unix)]
        {
            let mode = fs::metadata(store.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        assert!(store.remove().unwrap());
        assert!(!store.remove().unwrap());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_expired_token_is_dropped() {
        let store = temp_store("expired");
        store.save(TOKEN).unwrap();
        let expired = StoredToken {
            token: TOKEN.to_string(),
            expires: chrono::Utc::now().timestamp_millis() - 1,
        };
        fs::write(store.path(), serde_json::to_string(&expired).unwrap()).unwrap();

        assert_eq!(store.load(), None);
        assert!(!store.path().exists());
    }
}

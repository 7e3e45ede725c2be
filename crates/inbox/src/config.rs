//! Configuration loading for inbox clients
//!
//! Supports loading the administrator token from (in order of priority):
//! 1. Compile-time embedded token (for pinned builds)
//! 2. JSON file in the config directory
//! 3. Runtime environment variable (fallback)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::api::AuthToken;
use crate::query::ThreadFilter;
use crate::threads::ReconcilePolicy;

/// Credentials filename in the config directory
const CREDENTIALS_FILE: &str = "admin-credentials.json";

/// Console settings filename in the config directory
const SETTINGS_FILE: &str = "console-settings.json";

/// Environment variable holding the token
const TOKEN_ENV: &str = "INBOX_ADMIN_TOKEN";

/// Administrator credentials for the inbox API
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub token: AuthToken,
}

/// On-disk credential file format
#[derive(Deserialize)]
struct CredentialFile {
    token: Option<String>,
}

impl AdminCredentials {
    /// Load credentials using the following priority:
    /// 1. Compile-time embedded token
    /// 2. JSON file (~/.config/admin-inbox/admin-credentials.json)
    /// 3. Runtime environment variable
    pub fn load() -> Result<Self> {
        if let Some(creds) = Self::from_compile_time() {
            return Ok(creds);
        }

        if config::config_exists(CREDENTIALS_FILE) {
            let file: CredentialFile = config::load_json(CREDENTIALS_FILE)?;
            return Self::from_credential_file(file);
        }

        Self::from_env()
    }

    /// Token embedded at build time.
    /// Build with: INBOX_ADMIN_TOKEN=xxx cargo build --release
    pub fn from_compile_time() -> Option<Self> {
        let token = option_env!("INBOX_ADMIN_TOKEN")?;
        if token.trim().is_empty() {
            return None;
        }

        Some(Self {
            token: AuthToken::new(token),
        })
    }

    /// Load credentials from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file: CredentialFile = config::load_json_file(path)?;
        Self::from_credential_file(file)
    }

    /// Parse credentials from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CredentialFile =
            serde_json::from_str(json).context("Failed to parse credentials JSON")?;
        Self::from_credential_file(file)
    }

    fn from_credential_file(file: CredentialFile) -> Result<Self> {
        let token = file
            .token
            .filter(|t| !t.trim().is_empty())
            .context("Credentials file missing 'token'")?;

        Ok(Self {
            token: AuthToken::new(token),
        })
    }

    /// Load the token from the environment
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(TOKEN_ENV)
            .with_context(|| format!("{} environment variable not set", TOKEN_ENV))?;

        Ok(Self {
            token: AuthToken::new(token),
        })
    }

    /// Default credentials file path (~/.config/admin-inbox/admin-credentials.json)
    pub fn default_credentials_path() -> Option<PathBuf> {
        config::config_path(CREDENTIALS_FILE)
    }

    /// Check if a token is available from any source
    pub fn is_available() -> bool {
        if Self::from_compile_time().is_some() {
            return true;
        }
        if config::config_exists(CREDENTIALS_FILE) {
            return true;
        }
        std::env::var(TOKEN_ENV).is_ok()
    }
}

/// Settings for the console binary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConsoleSettings {
    /// Filter applied when none is given on the command line
    pub default_filter: ThreadFilter,
    /// Reply merge mode used on load
    pub reconcile_policy: ReconcilePolicy,
    /// Inbox snapshot replayed when no path is given
    pub snapshot_path: Option<PathBuf>,
}

impl ConsoleSettings {
    /// Load settings from the config directory, or defaults if absent
    pub fn load() -> Result<Self> {
        if config::config_exists(SETTINGS_FILE) {
            config::load_json(SETTINGS_FILE)
        } else {
            Ok(Self::default())
        }
    }

    /// Load settings from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_credentials() {
        let creds = AdminCredentials::from_json(r#"{ "token": "abc123" }"#).unwrap();
        assert_eq!(creds.token.as_str(), "abc123");
    }

    #[test]
    fn test_missing_token() {
        assert!(AdminCredentials::from_json(r#"{ "other": 1 }"#).is_err());
        assert!(AdminCredentials::from_json(r#"{ "token": "  " }"#).is_err());
    }

    #[test]
    fn test_invalid_json() {
        assert!(AdminCredentials::from_json("not json").is_err());
    }

    #[test]
    fn test_settings_defaults_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console-settings.json");
        std::fs::write(&path, r#"{ "defaultFilter": "unread" }"#).unwrap();

        let settings = ConsoleSettings::from_file(&path).unwrap();
        assert_eq!(settings.default_filter, ThreadFilter::Unread);
        assert_eq!(settings.reconcile_policy, ReconcilePolicy::ReplaceAdministrator);
        assert!(settings.snapshot_path.is_none());
    }
}

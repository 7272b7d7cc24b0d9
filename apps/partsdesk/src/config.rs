//! # Configuration
//!
//! Settings come from an optional TOML file. `main` then applies environment
//! variables and command-line flags on top (clap reads both), so the
//! precedence is flag > environment > file > default.
//!
//! ```toml
//! database = "/var/lib/partsdesk/parts.redb"
//! bind = "0.0.0.0:3000"
//! session_secret = "change-me"
//! secure_cookies = true
//! cors_origins = ["https://desk.example.com"]
//! ```

use partsdesk_core::auth::DEFAULT_SESSION_TTL_SECS;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Shortest accepted session secret, in bytes.
pub const MIN_SECRET_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("a session secret is required (set PARTSDESK_SESSION_SECRET or session_secret)")]
    MissingSecret,

    #[error("the session secret must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,

    #[error("cors_origins cannot contain \"*\"; list each origin explicitly")]
    WildcardOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// redb database file.
    pub database: PathBuf,
    /// HTTP listen address.
    pub bind: String,
    /// HMAC key for session tokens.
    pub session_secret: Option<String>,
    pub session_ttl_secs: i64,
    /// Mark the session cookie `Secure` (HTTPS deployments).
    pub secure_cookies: bool,
    /// Login attempts allowed per minute, across all clients.
    pub login_rate_per_minute: u32,
    /// Origins allowed to call the API from a browser. Empty: same-origin only.
    /// Cookies are sent cross-origin, so `"*"` is not accepted.
    pub cors_origins: Vec<String>,
    /// Request body limit; bounds CSV uploads.
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("partsdesk.redb"),
            bind: "127.0.0.1:3000".to_string(),
            session_secret: None,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            secure_cookies: false,
            login_rate_per_minute: 10,
            cors_origins: Vec::new(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load `path`, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&text)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cors_origins.iter().any(|origin| origin.trim() == "*") {
            return Err(ConfigError::WildcardOrigin);
        }
        Ok(())
    }

    /// The session secret, required to serve.
    pub fn session_secret(&self) -> Result<&str, ConfigError> {
        let secret = self
            .session_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSecret)?;
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }
        Ok(secret)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn partial_file_overrides_some_fields() {
        let config = Config::from_toml(
            r#"
            bind = "0.0.0.0:8080"
            secure_cookies = true
            cors_origins = ["https://desk.example.com"]
            "#,
        )
        .unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert!(config.secure_cookies);
        assert_eq!(config.cors_origins.len(), 1);
        assert_eq!(config.database, PathBuf::from("partsdesk.redb"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            Config::from_toml("databse = \"x\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn wildcard_cors_origin_is_rejected() {
        let text = r#"cors_origins = ["https://a.example.com", "*"]"#;
        let err = Config::from_toml(text).unwrap_err();
        assert!(matches!(err, ConfigError::WildcardOrigin));
    }

    #[test]
    fn session_secret_is_checked() {
        let mut config = Config::default();
        assert!(matches!(config.session_secret(), Err(ConfigError::MissingSecret)));
        config.session_secret = Some("short".to_string());
        assert!(matches!(config.session_secret(), Err(ConfigError::WeakSecret)));
        config.session_secret = Some("a-long-enough-secret".to_string());
        assert_eq!(config.session_secret().unwrap(), "a-long-enough-secret");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Config::load(Some(Path::new("/nonexistent/partsdesk.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}

//! Connection settings for the admin API client.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::i18n::LocaleCode;
use crate::session::FileTokenStore;

/// Base URL used when none is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Errors raised while validating client settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The base URL failed to parse.
    #[error("invalid api url")]
    InvalidUrl {
        /// Rejected value.
        value: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
    /// The base URL cannot carry path segments (e.g. `mailto:`).
    #[error("api url cannot be used as a base")]
    NotABase {
        /// Rejected value.
        value: String,
    },
    /// A zero timeout was supplied.
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
}

/// Resolved client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API origin, optionally with a path prefix.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Token file location; `None` keeps the token in memory only.
    pub token_path: Option<PathBuf>,
    /// Preferred locale for messages.
    pub locale: LocaleCode,
}

impl ClientConfig {
    /// Validate raw settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL does not parse, cannot serve as a base, or
    /// when the timeout is zero.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        token_path: Option<PathBuf>,
        locale: LocaleCode,
    ) -> Result<Self, ConfigError> {
        let trimmed = base_url.trim();
        let parsed = Url::parse(trimmed).map_err(|source| ConfigError::InvalidUrl {
            value: trimmed.to_string(),
            source,
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ConfigError::NotABase {
                value: trimmed.to_string(),
            });
        }
        if timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(Self {
            base_url: parsed,
            timeout: Duration::from_secs(timeout_secs),
            token_path,
            locale,
        })
    }

    /// Default settings: local API, ten second timeout, token in the user config dir.
    ///
    /// # Errors
    ///
    /// Propagates validation failures of the built-in defaults.
    pub fn local() -> Result<Self, ConfigError> {
        Self::new(
            DEFAULT_API_URL,
            DEFAULT_TIMEOUT_SECS,
            FileTokenStore::default_path(),
            LocaleCode::default(),
        )
    }
}

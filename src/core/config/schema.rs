//! core::config::schema
//!
//! Configuration file schema.
//!
//! # Location
//!
//! Searched in order:
//! 1. `$IGITT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/igitt/config.toml`
//! 3. `~/.igitt/config.toml`
//!
//! # Validation
//!
//! Values are validated after parsing: the API base must be an http(s)
//! URL, the user agent must not be blank and the provider must be known.
//! A `timeout_secs` of zero disables the request timeout.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Top-level config file.
///
/// # Example
///
/// ```toml
/// default_provider = "github"
///
/// [github]
/// api_base = "https://api.github.com"
/// timeout_secs = 5
/// user_agent = "igitt"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Provider used when a reference does not name one (e.g., "github")
    pub default_provider: Option<String>,

    /// GitHub connection settings
    pub github: Option<GitHubSection>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.default_provider {
            let valid = crate::forge::valid_provider_names();
            if !valid.contains(&provider.to_lowercase().as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid provider '{}', must be one of: {}",
                    provider,
                    valid.join(", ")
                )));
            }
        }

        if let Some(github) = &self.github {
            github.validate()?;
        }

        Ok(())
    }
}

/// `[github]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubSection {
    /// API base URL (default: `https://api.github.com`)
    pub api_base: Option<String>,

    /// Whole-request timeout in seconds (default: 5, `0` for none)
    pub timeout_secs: Option<u64>,

    /// `User-Agent` header value (default: "igitt")
    pub user_agent: Option<String>,
}

impl GitHubSection {
    /// Validate the GitHub settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base) = &self.api_base {
            validate_api_base(base)?;
        }

        if let Some(agent) = &self.user_agent {
            if agent.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "github.user_agent cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Check that an API base is an absolute http(s) URL.
pub fn validate_api_base(base: &str) -> Result<(), ConfigError> {
    let url = Url::parse(base)
        .map_err(|e| ConfigError::InvalidValue(format!("invalid API base '{}': {}", base, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidValue(format!(
            "invalid API base '{}': scheme must be http or https, not '{}'",
            base, other
        ))),
    }
}

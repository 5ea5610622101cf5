//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. `GITHUB_BASE_URL` environment variable (API base only)
//! 4. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `$IGITT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/igitt/config.toml`
//! 3. `~/.igitt/config.toml`
//!
//! A missing file is not an error; defaults are used.
//!
//! # Example
//!
//! ```no_run
//! use igitt::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("API base: {}", config.github_api_base());
//! println!("Provider: {}", config.default_provider());
//! ```

pub mod schema;

pub use schema::{ConfigFile, GitHubSection};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::transport::{TransportOptions, DEFAULT_USER_AGENT};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "IGITT_CONFIG";

/// Environment variable overriding the GitHub API base.
pub const GITHUB_BASE_URL_ENV: &str = "GITHUB_BASE_URL";

/// Default GitHub API base URL.
pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Effective configuration.
///
/// Accessor methods apply precedence rules, so callers never look at the
/// raw file or the environment themselves.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed config file (defaults if none was found)
    pub file: ConfigFile,
    /// `GITHUB_BASE_URL`, captured at load time
    api_base_override: Option<String>,
    /// Path to the config file (if loaded)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations plus the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated, or if `GITHUB_BASE_URL` is not an http(s) URL.
    pub fn load() -> Result<Config, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                let config = Self::from_env();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Load a specific config file plus the environment.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let file = Self::read_config_file(path)?;
        let config = Config {
            file,
            api_base_override: env_override(GITHUB_BASE_URL_ENV),
            path: Some(path.to_path_buf()),
        };
        config.validate()?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Defaults plus the environment, without reading any file.
    pub fn from_env() -> Config {
        Config {
            file: ConfigFile::default(),
            api_base_override: env_override(GITHUB_BASE_URL_ENV),
            path: None,
        }
    }

    /// Validate the file and the effective API base.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.file.validate()?;
        if let Some(base) = &self.api_base_override {
            schema::validate_api_base(base).map_err(|e| {
                ConfigError::InvalidValue(format!("{} is invalid: {}", GITHUB_BASE_URL_ENV, e))
            })?;
        }
        Ok(())
    }

    /// First existing config file in search order.
    fn find_config_file() -> Option<PathBuf> {
        // 1. Check $IGITT_CONFIG
        if let Some(path) = env_override(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/igitt/config.toml
        if let Some(xdg_home) = env_override("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("igitt/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.igitt/config.toml
        dirs::home_dir()
            .map(|home| home.join(".igitt/config.toml"))
            .filter(|path| path.exists())
    }

    fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// GitHub API base URL without a trailing `/`.
    ///
    /// `GITHUB_BASE_URL` wins over the file; defaults to
    /// `https://api.github.com`.
    pub fn github_api_base(&self) -> String {
        let base = self
            .api_base_override
            .as_deref()
            .or_else(|| self.github().and_then(|g| g.api_base.as_deref()))
            .unwrap_or(DEFAULT_GITHUB_API_BASE);
        base.trim_end_matches('/').to_string()
    }

    /// Request timeout. Defaults to 5 seconds; `timeout_secs = 0` means none.
    pub fn timeout(&self) -> Option<Duration> {
        match self
            .github()
            .and_then(|g| g.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
        {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// `User-Agent` header value. Defaults to "igitt".
    pub fn user_agent(&self) -> &str {
        self.github()
            .and_then(|g| g.user_agent.as_deref())
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Options for building an HTTP transport.
    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            timeout: self.timeout(),
            user_agent: self.user_agent().to_string(),
        }
    }

    /// Provider used when none is given explicitly. Defaults to "github".
    pub fn default_provider(&self) -> &str {
        self.file.default_provider.as_deref().unwrap_or("github")
    }

    /// Path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn github(&self) -> Option<&GitHubSection> {
        self.file.github.as_ref()
    }
}

/// Read an environment variable, treating empty values as unset.
fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.github_api_base(), "https://api.github.com");
        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.user_agent(), "igitt");
        assert_eq!(config.default_provider(), "github");
        assert!(config.loaded_from().is_none());
    }

    #[test]
    fn from_env_without_override_uses_default_base() {
        temp_env::with_var_unset(GITHUB_BASE_URL_ENV, || {
            let config = Config::from_env();
            assert_eq!(config.github_api_base(), DEFAULT_GITHUB_API_BASE);
        });
    }

    #[test]
    fn env_override_wins() {
        temp_env::with_var(GITHUB_BASE_URL_ENV, Some("http://localhost:9999/"), || {
            let config = Config::from_env();
            assert_eq!(config.github_api_base(), "http://localhost:9999");
        });
    }

    #[test]
    fn empty_env_override_is_ignored() {
        temp_env::with_var(GITHUB_BASE_URL_ENV, Some(""), || {
            let config = Config::from_env();
            assert_eq!(config.github_api_base(), DEFAULT_GITHUB_API_BASE);
        });
    }

    #[test]
    fn load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"
            default_provider = "github"

            [github]
            api_base = "https://ghe.example.com/api/v3/"
            timeout_secs = 30
            user_agent = "label-bot"
            "#,
        );

        temp_env::with_var_unset(GITHUB_BASE_URL_ENV, || {
            let config = Config::load_from(&path).unwrap();
            assert_eq!(config.github_api_base(), "https://ghe.example.com/api/v3");
            assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
            assert_eq!(config.user_agent(), "label-bot");
            assert_eq!(config.loaded_from(), Some(path.as_path()));

            let options = config.transport_options();
            assert_eq!(options.timeout, Some(Duration::from_secs(30)));
            assert_eq!(options.user_agent, "label-bot");
        });
    }

    #[test]
    fn env_overrides_file() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            &temp,
            r#"
            [github]
            api_base = "https://ghe.example.com/api/v3"
            "#,
        );

        temp_env::with_var(GITHUB_BASE_URL_ENV, Some("http://127.0.0.1:8080"), || {
            let config = Config::load_from(&path).unwrap();
            assert_eq!(config.github_api_base(), "http://127.0.0.1:8080");
        });
    }

    #[test]
    fn load_uses_config_env() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "[github]\ntimeout_secs = 12\n");

        temp_env::with_vars(
            [
                (CONFIG_ENV, Some(path.to_str().unwrap())),
                (GITHUB_BASE_URL_ENV, None),
            ],
            || {
                let config = Config::load().unwrap();
                assert_eq!(config.timeout(), Some(Duration::from_secs(12)));
                assert_eq!(config.loaded_from(), Some(path.as_path()));
            },
        );
    }

    #[test]
    fn load_uses_xdg_config_home() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("igitt");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), "[github]\nuser_agent = \"xdg\"\n").unwrap();

        temp_env::with_vars(
            [
                (CONFIG_ENV, None),
                ("XDG_CONFIG_HOME", Some(temp.path().to_str().unwrap())),
            ],
            || {
                let config = Config::load().unwrap();
                assert_eq!(config.user_agent(), "xdg");
            },
        );
    }

    #[test]
    fn missing_config_env_file_falls_through() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");

        temp_env::with_vars(
            [
                (CONFIG_ENV, Some(missing.to_str().unwrap())),
                ("XDG_CONFIG_HOME", Some(temp.path().to_str().unwrap())),
                (GITHUB_BASE_URL_ENV, None),
            ],
            || {
                let config = Config::load().unwrap();
                assert_ne!(config.loaded_from(), Some(missing.as_path()));
            },
        );
    }

    #[test]
    fn invalid_env_base_rejected() {
        temp_env::with_vars(
            [
                (CONFIG_ENV, None),
                ("XDG_CONFIG_HOME", None),
                (GITHUB_BASE_URL_ENV, Some("ftp://nope")),
            ],
            || {
                let result = Config::from_env().validate();
                assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
            },
        );
    }

    #[test]
    fn parse_error_names_the_file() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "default_provider = [");

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "verbose = true\n");

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn invalid_values_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "[github]\nuser_agent = \"\"\n");

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn zero_timeout_disables_request_timeout() {
        let temp = TempDir::new().unwrap();
        let path = write_config(&temp, "[github]\ntimeout_secs = 0\n");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.timeout(), None);
        assert_eq!(config.transport_options().timeout, None);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let temp = TempDir::new().unwrap();
        let err = Config::load_from(&temp.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }
}

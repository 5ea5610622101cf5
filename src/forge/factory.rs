//! forge::factory
//!
//! Provider selection and repository handle creation.
//!
//! # Design
//!
//! Callers use [`open_repository`] instead of importing a specific provider
//! implementation. The factory turns a [`RepoRef`] plus an optional provider
//! override into a boxed [`Repository`].
//!
//! # Repository References
//!
//! A reference is parsed from a string in one of these forms:
//! - a numeric id (`76145200`)
//! - a full name (`owner/name`)
//! - a GitHub remote URL (`git@github.com:owner/name.git`,
//!   `https://github.com/owner/name`)
//!
//! # Example
//!
//! ```ignore
//! use igitt::core::config::Config;
//! use igitt::forge::{open_repository, RepoRef};
//!
//! let config = Config::load()?;
//! let reference: RepoRef = "git@github.com:coala/coala-bears.git".parse()?;
//! let repo = open_repository(&reference, token, None, &config)?;
//! println!("{}", repo.full_name().await?);
//! ```

use std::fmt;
use std::str::FromStr;

use super::github::{parse_github_url, GitHub, GitHubRepository};
use super::traits::{ForgeError, Repository};
use crate::core::config::Config;

/// Supported hosting providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForgeProvider {
    /// GitHub (and GitHub Enterprise via `GITHUB_BASE_URL`)
    GitHub,
}

impl ForgeProvider {
    /// All providers this build can open.
    ///
    /// # Example
    ///
    /// ```
    /// use igitt::forge::ForgeProvider;
    ///
    /// assert!(ForgeProvider::all().contains(&ForgeProvider::GitHub));
    /// ```
    pub fn all() -> &'static [ForgeProvider] {
        &[ForgeProvider::GitHub]
    }

    /// Provider name as used in configuration and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            ForgeProvider::GitHub => "github",
        }
    }

    /// Parse a provider name (case-insensitive).
    ///
    /// # Example
    ///
    /// ```
    /// use igitt::forge::ForgeProvider;
    ///
    /// assert_eq!(ForgeProvider::parse("GitHub"), Some(ForgeProvider::GitHub));
    /// assert_eq!(ForgeProvider::parse("unknown"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "github" => Some(ForgeProvider::GitHub),
            _ => None,
        }
    }
}

impl fmt::Display for ForgeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How a repository is identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoRef {
    /// Numeric id assigned by the provider
    Id(u64),
    /// `owner/name`
    FullName(String),
}

impl FromStr for RepoRef {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ForgeError::Validation(
                "repository reference cannot be empty".to_string(),
            ));
        }

        if s.chars().all(|c| c.is_ascii_digit()) {
            return match s.parse::<u64>() {
                Ok(0) => Err(ForgeError::Validation(
                    "repository id cannot be zero".to_string(),
                )),
                Ok(id) => Ok(RepoRef::Id(id)),
                Err(e) => Err(ForgeError::Validation(format!(
                    "invalid repository id '{}': {}",
                    s, e
                ))),
            };
        }

        if let Some(full_name) = parse_github_url(s) {
            return Ok(RepoRef::FullName(full_name));
        }

        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty()
                    && !name.is_empty()
                    && !name.contains('/')
                    && !s.contains(char::is_whitespace) =>
            {
                Ok(RepoRef::FullName(s.to_string()))
            }
            _ => Err(ForgeError::Validation(format!(
                "'{}' is not a repository id, owner/name or GitHub URL",
                s
            ))),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoRef::Id(id) => write!(f, "{}", id),
            RepoRef::FullName(name) => write!(f, "{}", name),
        }
    }
}

/// Detect the provider from a remote URL.
pub fn detect_provider(remote_url: &str) -> Option<ForgeProvider> {
    if parse_github_url(remote_url).is_some() {
        return Some(ForgeProvider::GitHub);
    }
    None
}

/// Open a repository handle.
///
/// The provider is `provider_override` if given, otherwise the configured
/// default. No network call is made here.
///
/// # Errors
///
/// - `NotImplemented` for providers that are known but not supported
/// - `Validation` for unknown provider names or an invalid reference
/// - `Network` if the HTTP client cannot be initialized
pub fn open_repository(
    reference: &RepoRef,
    token: &str,
    provider_override: Option<&str>,
    config: &Config,
) -> Result<Box<dyn Repository>, ForgeError> {
    let name = provider_override.unwrap_or_else(|| config.default_provider());
    let provider = resolve_provider(name)?;

    match provider {
        ForgeProvider::GitHub => {
            let github = GitHub::from_config(config)?;
            Ok(Box::new(open_github(&github, reference, token)?))
        }
    }
}

/// Open a reference against an existing GitHub client.
pub fn open_github(
    github: &GitHub,
    reference: &RepoRef,
    token: &str,
) -> Result<GitHubRepository, ForgeError> {
    match reference {
        RepoRef::Id(id) => github.repository(*id, token),
        RepoRef::FullName(name) => github.repository_from_name(name.as_str(), token),
    }
}

fn resolve_provider(name: &str) -> Result<ForgeProvider, ForgeError> {
    if let Some(provider) = ForgeProvider::parse(name) {
        return Ok(provider);
    }

    if is_known_but_unsupported(name) {
        return Err(ForgeError::NotImplemented(format!(
            "provider '{}' is not supported yet",
            name
        )));
    }

    Err(ForgeError::Validation(format!(
        "unknown provider '{}'. Available providers: {}",
        name,
        available_providers_string()
    )))
}

fn is_known_but_unsupported(name: &str) -> bool {
    matches!(name.to_lowercase().as_str(), "gitlab")
}

fn available_providers_string() -> String {
    ForgeProvider::all()
        .iter()
        .map(|p| p.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Provider names accepted in configuration.
///
/// Includes known providers that cannot be opened yet, so a config file
/// naming them still parses and the error surfaces when a handle is opened.
pub fn valid_provider_names() -> &'static [&'static str] {
    &["github", "gitlab"]
}

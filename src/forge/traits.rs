//! forge::traits
//!
//! Repository trait definition for hosting-provider handles.
//!
//! # Design
//!
//! The `Repository` trait is async because its accessors may need to fetch
//! the repository from the remote service the first time they are called.
//! Every method returns `Result` so network and decode failures reach the
//! caller instead of being swallowed behind default values.
//!
//! Handles are caches: the first accessor call performs a single fetch and
//! every later call is served from memory. `api_url` is the one exception
//! that never touches the network, so it can be used to compose requests
//! cheaply.
//!
//! # Example
//!
//! ```ignore
//! use igitt::forge::{CreateLabelRequest, ForgeError, Repository};
//!
//! async fn describe(repo: &dyn Repository) -> Result<(), ForgeError> {
//!     println!("{} ({})", repo.full_name().await?, repo.id().await?);
//!     if let Some(parent) = repo.parent().await? {
//!         println!("fork of {}", parent.full_name().await?);
//!     }
//!     repo.create_label(CreateLabelRequest::new("triage", "ededed")).await?;
//!     Ok(())
//! }
//! ```

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from forge operations.
///
/// Every failure is returned to the immediate caller. Nothing here is
/// retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForgeError {
    /// Neither an id nor a full name is available to build a URL.
    #[error("identity error: {0}")]
    Identity(String),

    /// Network or connection error before a response was obtained.
    #[error("network error: {0}")]
    Network(String),

    /// The request could not be constructed (malformed URL).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The server answered with a status of 300 or above (other than 304).
    #[error("response error: {status} - {body}")]
    Response {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The response payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A caller-supplied argument was rejected before any request was made.
    #[error("validation error: {0}")]
    Validation(String),

    /// The operation or provider is not supported.
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

impl ForgeError {
    /// HTTP status carried by a [`ForgeError::Response`], if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ForgeError::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a response error with status 404.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// A label on a repository.
///
/// The name is unique within a repository and acts as the label's key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label name
    pub name: String,
    /// Hex color without a leading `#`
    #[serde(default)]
    pub color: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

/// Request to create a label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateLabelRequest {
    /// Label name (must not be empty)
    pub name: String,
    /// Hex color, with or without a leading `#`
    pub color: String,
    /// Label description (empty means none)
    pub description: String,
    /// Provider-specific label kind. GitHub has no label kinds and ignores it.
    pub label_type: Option<String>,
}

impl CreateLabelRequest {
    /// Create a request with a name and color and no description.
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            ..Self::default()
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the provider-specific label kind.
    pub fn label_type(mut self, label_type: impl Into<String>) -> Self {
        self.label_type = Some(label_type.into());
        self
    }

    /// Check the request and return the color normalized (no `#`, lowercase).
    ///
    /// # Errors
    ///
    /// `ForgeError::Validation` if the name is empty or the color is not six
    /// hex digits.
    pub fn validate(&self) -> Result<String, ForgeError> {
        if self.name.trim().is_empty() {
            return Err(ForgeError::Validation(
                "label name cannot be empty".to_string(),
            ));
        }

        let color = self.color.strip_prefix('#').unwrap_or(&self.color);
        if color.len() != 6 || !color.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ForgeError::Validation(format!(
                "label color '{}' must be six hex digits",
                self.color
            )));
        }

        Ok(color.to_ascii_lowercase())
    }
}

/// A repository on a Git hosting provider like GitHub or GitLab.
///
/// Callers hold `&dyn Repository` (or `Box<dyn Repository>`) and never need
/// to know which provider backs it. `Display` renders a short description of
/// the handle that never triggers a fetch.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; concurrent accessor calls on a
/// handle that has not been fetched yet share one network request.
///
/// # Error Handling
///
/// - `Network`: check connectivity, the call may be retried
/// - `Response`: the server rejected the request (404 for unknown repos)
/// - `Decode`: the server sent something unexpected
/// - `Validation`: fix the arguments
#[async_trait]
pub trait Repository: fmt::Display + Send + Sync {
    /// Provider name (e.g., "github").
    fn provider(&self) -> &'static str;

    /// Full name in `owner/name` form.
    async fn full_name(&self) -> Result<String, ForgeError>;

    /// Numeric identifier assigned by the provider.
    async fn id(&self) -> Result<u64, ForgeError>;

    /// Repository description, if set.
    async fn description(&self) -> Result<Option<String>, ForgeError>;

    /// URL of the repository's web page.
    async fn web_url(&self) -> Result<String, ForgeError>;

    /// API URL of the repository.
    ///
    /// Never performs a network call. Always built from the configured API
    /// base and the handle's identity, so the numeric form is used once the
    /// id is known. The server's own `url` field is not followed.
    fn api_url(&self) -> Result<String, ForgeError>;

    /// Project homepage, if set.
    async fn homepage(&self) -> Result<Option<String>, ForgeError>;

    /// Whether the issue tracker is enabled.
    async fn has_issues(&self) -> Result<bool, ForgeError>;

    /// Whether the repository is private.
    async fn is_private(&self) -> Result<bool, ForgeError>;

    /// Whether the repository is a fork.
    async fn is_fork(&self) -> Result<bool, ForgeError>;

    /// The repository this one was forked from.
    ///
    /// Returns `None` for repositories that are not forks. The returned
    /// handle is independent of this one and starts out already populated.
    async fn parent(&self) -> Result<Option<Box<dyn Repository>>, ForgeError>;

    /// Create a label.
    ///
    /// # Errors
    ///
    /// - `Validation` if the name is empty or the color malformed (no request is sent)
    /// - `Response` with status 422 if the label already exists
    async fn create_label(&self, request: CreateLabelRequest) -> Result<Label, ForgeError>;

    /// Delete a label by name.
    async fn delete_label(&self, name: &str) -> Result<(), ForgeError>;

    /// Names of all labels, in the order the server returned them.
    async fn get_all_labels(&self) -> Result<Vec<String>, ForgeError>;
}

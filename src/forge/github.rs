//! forge::github
//!
//! GitHub implementation of the [`Repository`] trait using the REST API.
//!
//! # Design
//!
//! A [`GitHubRepository`] is a lazily populated handle. It is built from
//! either a numeric id or an `owner/name` full name and does no I/O until an
//! accessor needs data. The first such accessor resolves the API URL from
//! whichever identity is known (the id wins when both are), fetches the
//! repository once, decodes it into a [`RepositorySnapshot`] and records both
//! the id and the full name reported by the server. Every later accessor is
//! served from that snapshot.
//!
//! The fetch lifecycle is an explicit state machine:
//!
//! ```text
//! Unresolved --fetch--> Fetching --ok--> Fetched(decoded)
//!      ^                    |                  |
//!      +------- error ------+      create_label|
//!                                              v
//!                 Fetched(decoded) <--access-- Fetched(undecoded)
//! ```
//!
//! A failed fetch drops back to `Unresolved`, so the next accessor tries the
//! network again. Creating a label marks the cached snapshot undecoded; the
//! next access re-decodes the retained bytes without a new request.
//!
//! # Concurrency
//!
//! Concurrent accessor calls on an unfetched handle are coalesced: a
//! per-handle async gate admits one fetch at a time and the state is checked
//! again after the gate is acquired, so later callers reuse the first
//! caller's result. The cached state itself lives behind a `RwLock` that is
//! never held across an await point.
//!
//! # Configuration
//!
//! The API base defaults to `https://api.github.com` and can be overridden
//! with the `GITHUB_BASE_URL` environment variable or the config file (see
//! [`crate::core::config`]).
//!
//! # Example
//!
//! ```ignore
//! use igitt::forge::github::GitHub;
//! use igitt::forge::Repository;
//!
//! let github = GitHub::from_env()?;
//! let repo = github.repository_from_name("nkprince007/coala-bears", token)?;
//!
//! println!("{}", repo.description().await?.unwrap_or_default());
//! if let Some(parent) = repo.parent().await? {
//!     println!("forked from {}", parent.full_name().await?);
//! }
//! ```

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use super::traits::{CreateLabelRequest, ForgeError, Label, Repository};
use crate::core::config::Config;
use crate::transport::channel::{spawn_request, spawn_request_with_payload};
use crate::transport::{HttpMethod, HttpTransport, Transport};

/// Characters escaped when a label name is used as a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Connection settings shared by every handle created from it.
///
/// Cheap to clone; the transport is reference counted.
#[derive(Clone)]
pub struct GitHub {
    transport: Arc<dyn Transport>,
    api_base: String,
}

impl fmt::Debug for GitHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHub")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl GitHub {
    /// Use an explicit transport and API base.
    ///
    /// A trailing `/` on the base is ignored.
    pub fn new(transport: Arc<dyn Transport>, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into();
        Self {
            transport,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Build an HTTP-backed client from loaded configuration.
    ///
    /// # Errors
    ///
    /// `Network` if the HTTP client cannot be initialized.
    pub fn from_config(config: &Config) -> Result<Self, ForgeError> {
        let transport = HttpTransport::new(&config.transport_options())?;
        Ok(Self::new(Arc::new(transport), config.github_api_base()))
    }

    /// Build an HTTP-backed client from defaults plus `GITHUB_BASE_URL`.
    pub fn from_env() -> Result<Self, ForgeError> {
        Self::from_config(&Config::from_env())
    }

    /// The API base URL without a trailing `/`.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Handle for the repository with the given numeric id.
    ///
    /// # Errors
    ///
    /// `Validation` if `id` is zero.
    pub fn repository(
        &self,
        id: u64,
        token: impl Into<String>,
    ) -> Result<GitHubRepository, ForgeError> {
        if id == 0 {
            return Err(ForgeError::Validation(
                "repository id cannot be zero".to_string(),
            ));
        }
        Ok(GitHubRepository::with_identity(
            self.clone(),
            Identity {
                id: Some(id),
                full_name: None,
            },
            token.into(),
        ))
    }

    /// Handle for the repository with the given `owner/name`.
    ///
    /// # Errors
    ///
    /// `Validation` if `full_name` is empty.
    pub fn repository_from_name(
        &self,
        full_name: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<GitHubRepository, ForgeError> {
        let full_name = full_name.into();
        if full_name.trim().is_empty() {
            return Err(ForgeError::Validation(
                "repository full name cannot be empty".to_string(),
            ));
        }
        Ok(GitHubRepository::with_identity(
            self.clone(),
            Identity {
                id: None,
                full_name: Some(full_name),
            },
            token.into(),
        ))
    }
}

/// Decoded repository as returned by the GitHub API.
///
/// This is a plain value. The embedded `parent` is a snapshot too; turning it
/// into a live handle is an explicit step ([`GitHubRepository::from_snapshot`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    pub id: u64,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
    /// Canonical API URL
    #[serde(default)]
    pub url: String,
    /// Web page URL
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub has_issues: bool,
    #[serde(default)]
    pub fork: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<RepositorySnapshot>>,
}

impl RepositorySnapshot {
    fn decode(raw: &[u8]) -> Result<Self, ForgeError> {
        serde_json::from_slice(raw)
            .map_err(|e| ForgeError::Decode(format!("invalid repository payload: {}", e)))
    }
}

/// Which identity fields are known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Identity {
    pub(crate) id: Option<u64>,
    pub(crate) full_name: Option<String>,
}

impl Identity {
    /// API URL for this identity. The numeric form wins when both are known.
    pub(crate) fn resolve_url(&self, api_base: &str) -> Result<String, ForgeError> {
        if let Some(id) = self.id.filter(|id| *id != 0) {
            return Ok(format!("{}/repositories/{}", api_base, id));
        }
        if let Some(name) = self.full_name.as_deref().filter(|n| !n.is_empty()) {
            return Ok(format!("{}/repos/{}", api_base, name));
        }
        Err(ForgeError::Identity(
            "URL cannot be formed as neither id nor full name is set".to_string(),
        ))
    }

    fn backfill(&mut self, snapshot: &RepositorySnapshot) {
        self.id = Some(snapshot.id);
        self.full_name = Some(snapshot.full_name.clone());
    }
}

/// Where a handle is in its fetch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    /// No successful fetch yet.
    Unresolved,
    /// A fetch is in flight.
    Fetching,
    /// Fetched and decoded.
    Fetched,
    /// Fetched, but the retained bytes must be decoded again before use.
    FetchedUndecoded,
}

#[derive(Debug, Default)]
enum FetchState {
    #[default]
    Unresolved,
    Fetching,
    Fetched {
        raw: Vec<u8>,
        /// `None` until `raw` has been decoded.
        snapshot: Option<RepositorySnapshot>,
    },
}

#[derive(Debug, Default)]
struct Cache {
    identity: Identity,
    state: FetchState,
}

/// A repository on GitHub.
///
/// See the [module documentation](self) for the caching model.
pub struct GitHubRepository {
    github: GitHub,
    token: String,
    cache: RwLock<Cache>,
    /// Admits one fetch at a time.
    fetch_gate: Mutex<()>,
}

// Custom Debug to avoid exposing the token
impl fmt::Debug for GitHubRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.read_cache();
        f.debug_struct("GitHubRepository")
            .field("id", &cache.identity.id)
            .field("full_name", &cache.identity.full_name)
            .field("has_token", &!self.token.is_empty())
            .field("api_base", &self.github.api_base)
            .finish()
    }
}

impl fmt::Display for GitHubRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (id, full_name) = {
            let cache = self.read_cache();
            (
                cache.identity.id.unwrap_or(0),
                cache.identity.full_name.clone().unwrap_or_default(),
            )
        };
        let url = self
            .api_url()
            .unwrap_or_else(|_| "<unresolved>".to_string());
        write!(
            f,
            "Repository(id={}, full_name={}, url={})",
            id, full_name, url
        )
    }
}

impl GitHubRepository {
    fn with_identity(github: GitHub, identity: Identity, token: String) -> Self {
        Self {
            github,
            token,
            cache: RwLock::new(Cache {
                identity,
                state: FetchState::Unresolved,
            }),
            fetch_gate: Mutex::new(()),
        }
    }

    /// Build an already-populated handle from a snapshot, without a fetch.
    ///
    /// # Errors
    ///
    /// `Decode` if the snapshot cannot be re-encoded for later re-decoding.
    pub fn from_snapshot(
        github: GitHub,
        snapshot: RepositorySnapshot,
        token: impl Into<String>,
    ) -> Result<Self, ForgeError> {
        let raw = serde_json::to_vec(&snapshot)
            .map_err(|e| ForgeError::Decode(format!("cannot encode snapshot: {}", e)))?;
        let mut identity = Identity::default();
        identity.backfill(&snapshot);

        let repo = Self::with_identity(github, identity, token.into());
        repo.write_cache().state = FetchState::Fetched {
            raw,
            snapshot: Some(snapshot),
        };
        Ok(repo)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> FetchPhase {
        match &self.read_cache().state {
            FetchState::Unresolved => FetchPhase::Unresolved,
            FetchState::Fetching => FetchPhase::Fetching,
            FetchState::Fetched {
                snapshot: Some(_), ..
            } => FetchPhase::Fetched,
            FetchState::Fetched { snapshot: None, .. } => FetchPhase::FetchedUndecoded,
        }
    }

    /// Whether a fetch has completed successfully.
    pub fn is_fetched(&self) -> bool {
        matches!(self.read_cache().state, FetchState::Fetched { .. })
    }

    /// URL derived from the identity alone, ignoring any fetched data.
    pub fn resolve_url(&self) -> Result<String, ForgeError> {
        self.read_cache()
            .identity
            .resolve_url(&self.github.api_base)
    }

    /// A copy of the decoded repository, fetching it first if needed.
    pub async fn snapshot(&self) -> Result<RepositorySnapshot, ForgeError> {
        self.with_fetched(RepositorySnapshot::clone).await
    }

    /// All labels with their colors and descriptions, in server order.
    pub async fn labels(&self) -> Result<Vec<Label>, ForgeError> {
        let url = self.labels_url()?;
        let raw = spawn_request(self.transport(), HttpMethod::Get, &url, &self.token)
            .wait()
            .await?;
        serde_json::from_slice(&raw)
            .map_err(|e| ForgeError::Decode(format!("invalid label list payload: {}", e)))
    }

    fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.github.transport)
    }

    fn labels_url(&self) -> Result<String, ForgeError> {
        Ok(format!("{}/labels", self.api_url()?))
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, Cache> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, Cache> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the repository unless a previous fetch succeeded.
    async fn ensure_fetched(&self) -> Result<(), ForgeError> {
        if self.is_fetched() {
            trace!("repository already fetched");
            return Ok(());
        }

        let _gate = self.fetch_gate.lock().await;

        // Another caller may have finished the fetch while we waited.
        if self.is_fetched() {
            trace!("repository fetched by a concurrent caller");
            return Ok(());
        }

        let url = {
            let mut cache = self.write_cache();
            let url = cache.identity.resolve_url(&self.github.api_base)?;
            cache.state = FetchState::Fetching;
            url
        };

        debug!(%url, "fetching repository");
        let result = spawn_request(self.transport(), HttpMethod::Get, &url, &self.token)
            .wait()
            .await
            .and_then(|raw| RepositorySnapshot::decode(&raw).map(|snapshot| (raw, snapshot)));

        let mut cache = self.write_cache();
        match result {
            Ok((raw, snapshot)) => {
                cache.identity.backfill(&snapshot);
                debug!(id = snapshot.id, full_name = %snapshot.full_name, "repository fetched");
                cache.state = FetchState::Fetched {
                    raw,
                    snapshot: Some(snapshot),
                };
                Ok(())
            }
            Err(err) => {
                debug!(%url, error = %err, "repository fetch failed");
                cache.state = FetchState::Unresolved;
                Err(err)
            }
        }
    }

    /// Apply `f` to the decoded snapshot, decoding retained bytes if needed.
    ///
    /// Does not fetch; returns `Identity` if nothing has been fetched.
    fn with_decoded<T>(&self, f: impl FnOnce(&RepositorySnapshot) -> T) -> Result<T, ForgeError> {
        {
            let cache = self.read_cache();
            if let FetchState::Fetched {
                snapshot: Some(snapshot),
                ..
            } = &cache.state
            {
                return Ok(f(snapshot));
            }
        }

        let mut cache = self.write_cache();
        match &mut cache.state {
            FetchState::Fetched { raw, snapshot } => {
                let decoded = match snapshot.take() {
                    Some(existing) => existing,
                    None => {
                        trace!("decoding retained repository bytes");
                        RepositorySnapshot::decode(raw)?
                    }
                };
                Ok(f(snapshot.insert(decoded)))
            }
            _ => Err(ForgeError::Identity(
                "repository has not been fetched".to_string(),
            )),
        }
    }

    async fn with_fetched<T>(
        &self,
        f: impl FnOnce(&RepositorySnapshot) -> T + Send,
    ) -> Result<T, ForgeError> {
        self.ensure_fetched().await?;
        self.with_decoded(f)
    }

    /// Drop the decoded snapshot so the next access decodes again.
    fn mark_undecoded(&self) {
        if let FetchState::Fetched { snapshot, .. } = &mut self.write_cache().state {
            trace!("repository snapshot marked for re-decode");
            *snapshot = None;
        }
    }
}

/// Request body for creating a label.
#[derive(Serialize)]
struct CreateLabelBody<'a> {
    name: &'a str,
    color: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[async_trait]
impl Repository for GitHubRepository {
    fn provider(&self) -> &'static str {
        "github"
    }

    async fn full_name(&self) -> Result<String, ForgeError> {
        self.with_fetched(|s| s.full_name.clone()).await
    }

    async fn id(&self) -> Result<u64, ForgeError> {
        self.with_fetched(|s| s.id).await
    }

    async fn description(&self) -> Result<Option<String>, ForgeError> {
        self.with_fetched(|s| non_empty(s.description.clone()))
            .await
    }

    async fn web_url(&self) -> Result<String, ForgeError> {
        self.with_fetched(|s| s.html_url.clone()).await
    }

    fn api_url(&self) -> Result<String, ForgeError> {
        self.resolve_url()
    }

    async fn homepage(&self) -> Result<Option<String>, ForgeError> {
        self.with_fetched(|s| non_empty(s.homepage.clone())).await
    }

    async fn has_issues(&self) -> Result<bool, ForgeError> {
        self.with_fetched(|s| s.has_issues).await
    }

    async fn is_private(&self) -> Result<bool, ForgeError> {
        self.with_fetched(|s| s.private).await
    }

    async fn is_fork(&self) -> Result<bool, ForgeError> {
        self.with_fetched(|s| s.fork).await
    }

    async fn parent(&self) -> Result<Option<Box<dyn Repository>>, ForgeError> {
        let parent = self
            .with_fetched(|s| {
                if s.fork {
                    s.parent.as_deref().cloned()
                } else {
                    None
                }
            })
            .await?;

        match parent {
            Some(snapshot) => {
                let handle =
                    GitHubRepository::from_snapshot(self.github.clone(), snapshot, &*self.token)?;
                Ok(Some(Box::new(handle)))
            }
            None => Ok(None),
        }
    }

    async fn create_label(&self, request: CreateLabelRequest) -> Result<Label, ForgeError> {
        let color = request.validate()?;
        if let Some(kind) = &request.label_type {
            debug!(label_type = %kind, "GitHub labels have no type; ignoring");
        }

        let url = self.labels_url()?;
        let (payload, pending) =
            spawn_request_with_payload(self.transport(), HttpMethod::Post, &url, &self.token);

        let body = CreateLabelBody {
            name: &request.name,
            color: &color,
            description: Some(request.description.as_str()).filter(|d| !d.is_empty()),
        };
        let encoded = serde_json::to_vec(&body)
            .map_err(|e| ForgeError::InvalidRequest(format!("cannot encode label: {}", e)))?;
        if let Err(err) = payload.send(encoded) {
            // The request was rejected before it started; report why.
            return Err(pending.wait().await.err().unwrap_or(err));
        }

        debug!(%url, name = %request.name, "creating label");
        let raw = pending.wait().await?;
        let label: Label = serde_json::from_slice(&raw)
            .map_err(|e| ForgeError::Decode(format!("invalid label payload: {}", e)))?;

        self.mark_undecoded();
        Ok(label)
    }

    async fn delete_label(&self, name: &str) -> Result<(), ForgeError> {
        if name.trim().is_empty() {
            return Err(ForgeError::Validation(
                "label name cannot be empty".to_string(),
            ));
        }

        let url = format!(
            "{}/{}",
            self.labels_url()?,
            utf8_percent_encode(name, PATH_SEGMENT)
        );
        let (payload, pending) =
            spawn_request_with_payload(self.transport(), HttpMethod::Delete, &url, &self.token);
        payload.send_empty();

        debug!(%url, "deleting label");
        pending.wait().await?;
        Ok(())
    }

    async fn get_all_labels(&self) -> Result<Vec<String>, ForgeError> {
        Ok(self
            .labels()
            .await?
            .into_iter()
            .map(|label| label.name)
            .collect())
    }
}

/// Extract `owner/name` from a GitHub remote URL.
///
/// Accepts `git@github.com:owner/name(.git)`, `ssh://git@github.com/...`
/// and `http(s)://github.com/...`. Returns `None` for anything else.
pub fn parse_github_url(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("git@github.com:")
        .or_else(|| url.strip_prefix("ssh://git@github.com/"))
        .or_else(|| url.strip_prefix("https://github.com/"))
        .or_else(|| url.strip_prefix("http://github.com/"))?;
    let rest = rest.trim_end_matches('/');
    let rest = rest.strip_suffix(".git").unwrap_or(rest);

    let (owner, name) = rest.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some(format!("{}/{}", owner, name))
}

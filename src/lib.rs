//! igitt - provider-agnostic access to repositories on Git hosting services
//!
//! igitt gives callers a lazily populated repository handle. Metadata is
//! fetched from the provider's API on first use and cached; labels can be
//! listed, created and deleted. GitHub is the first supported provider.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to forge)
//! - [`forge`] - `Repository` trait, provider implementations and factory
//! - [`transport`] - Single-shot HTTP requests, run one task per request
//! - [`core`] - Configuration schema and loading
//!
//! # Example
//!
//! ```ignore
//! use igitt::forge::github::GitHub;
//! use igitt::forge::Repository;
//!
//! let repo = GitHub::from_env()?.repository(49558751, token)?;
//! println!("{}", repo.full_name().await?);
//! println!("{}", repo); // Repository(id=49558751, full_name=..., url=...)
//! ```

pub mod cli;
pub mod core;
pub mod forge;
pub mod transport;

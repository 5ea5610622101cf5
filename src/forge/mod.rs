//! forge
//!
//! Provider-agnostic repository handles for Git hosting services.
//!
//! # Architecture
//!
//! The [`Repository`] trait is the interface callers program against.
//! Commands use the [`open_repository`] factory function rather than
//! importing a specific provider implementation.
//!
//! # Modules
//!
//! - `traits`: `Repository` trait, `ForgeError` and label types
//! - [`github`]: GitHub implementation over the REST API
//! - `factory`: provider selection and reference parsing
//!
//! # Example
//!
//! ```ignore
//! use igitt::core::config::Config;
//! use igitt::forge::{open_repository, CreateLabelRequest, RepoRef};
//!
//! let config = Config::load()?;
//! let repo = open_repository(&RepoRef::Id(49558751), token, None, &config)?;
//!
//! repo.create_label(CreateLabelRequest::new("status/wip", "ededed")).await?;
//! for name in repo.get_all_labels().await? {
//!     println!("{}", name);
//! }
//! ```

mod factory;
pub mod github;
mod traits;

pub use factory::{
    detect_provider, open_github, open_repository, valid_provider_names, ForgeProvider, RepoRef,
};
pub use traits::*;

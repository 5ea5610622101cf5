//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration and opens the repository handle
//! 2. Calls the handle's async operations
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! Every command involves network I/O. Handlers are synchronous wrappers
//! that build a `tokio::runtime::Runtime` and `block_on` the async
//! implementation.

mod labels;
mod repo;

pub use labels::{create_label, delete_label, labels};
pub use repo::repo;

use std::future::Future;

use anyhow::{Context as _, Result};

use super::args::{Command, LabelAction};
use super::Context;
use crate::core::config::Config;
use crate::forge::{open_repository, CreateLabelRequest, RepoRef, Repository};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Repo { reference } => repo::repo(ctx, &reference),
        Command::Labels { reference } => labels::labels(ctx, &reference),
        Command::Label { action } => match action {
            LabelAction::Create {
                reference,
                name,
                color,
                description,
                label_type,
            } => {
                let mut request = CreateLabelRequest::new(name, color).description(description);
                if let Some(kind) = label_type {
                    request = request.label_type(kind);
                }
                labels::create_label(ctx, &reference, request)
            }
            LabelAction::Delete { reference, name } => {
                labels::delete_label(ctx, &reference, &name)
            }
        },
    }
}

/// Load configuration and open a handle for `reference`.
fn open(ctx: &Context, reference: &RepoRef) -> Result<Box<dyn Repository>> {
    let config = Config::load().context("failed to load configuration")?;
    open_repository(reference, &ctx.token, ctx.provider.as_deref(), &config)
        .with_context(|| format!("cannot open repository '{}'", reference))
}

/// Run a command body to completion on a fresh runtime.
fn block_on<F: Future<Output = Result<()>>>(future: F) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(future)
}

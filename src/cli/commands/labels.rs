//! labels commands - List, create and delete labels

use anyhow::{Context as _, Result};

use super::{block_on, open};
use crate::cli::Context;
use crate::forge::{CreateLabelRequest, RepoRef};

/// List label names, one per line.
pub fn labels(ctx: &Context, reference: &RepoRef) -> Result<()> {
    let repo = open(ctx, reference)?;
    block_on(async move {
        let names = repo
            .get_all_labels()
            .await
            .with_context(|| format!("failed to list labels of '{}'", reference))?;
        for name in names {
            println!("{}", name);
        }
        Ok(())
    })
}

/// Create a label.
pub fn create_label(
    ctx: &Context,
    reference: &RepoRef,
    request: CreateLabelRequest,
) -> Result<()> {
    let repo = open(ctx, reference)?;
    block_on(async move {
        let label = repo
            .create_label(request)
            .await
            .with_context(|| format!("failed to create label in '{}'", reference))?;
        println!("Created label '{}' (#{})", label.name, label.color);
        Ok(())
    })
}

/// Delete a label.
pub fn delete_label(ctx: &Context, reference: &RepoRef, name: &str) -> Result<()> {
    let repo = open(ctx, reference)?;
    block_on(async move {
        repo.delete_label(name)
            .await
            .with_context(|| format!("failed to delete label '{}' from '{}'", name, reference))?;
        println!("Deleted label '{}'", name);
        Ok(())
    })
}

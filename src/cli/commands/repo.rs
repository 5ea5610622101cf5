//! repo command - Show repository metadata

use anyhow::{Context as _, Result};

use super::{block_on, open};
use crate::cli::Context;
use crate::forge::{RepoRef, Repository};

/// Run the repo command.
pub fn repo(ctx: &Context, reference: &RepoRef) -> Result<()> {
    let handle = open(ctx, reference)?;
    block_on(async move {
        let text = render(handle.as_ref())
            .await
            .with_context(|| format!("failed to fetch repository '{}'", reference))?;
        print!("{}", text);
        Ok(())
    })
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Format every field of a repository, one per line.
pub(crate) async fn render(repo: &dyn Repository) -> Result<String> {
    let mut out = String::new();
    out.push_str(&format!("Full name:   {}\n", repo.full_name().await?));
    out.push_str(&format!("ID:          {}\n", repo.id().await?));
    out.push_str(&format!(
        "Description: {}\n",
        repo.description().await?.unwrap_or_default()
    ));
    out.push_str(&format!("Web URL:     {}\n", repo.web_url().await?));
    out.push_str(&format!("API URL:     {}\n", repo.api_url()?));
    out.push_str(&format!(
        "Homepage:    {}\n",
        repo.homepage().await?.unwrap_or_default()
    ));
    out.push_str(&format!("Private:     {}\n", yes_no(repo.is_private().await?)));
    out.push_str(&format!("Issues:      {}\n", yes_no(repo.has_issues().await?)));
    out.push_str(&format!("Fork:        {}\n", yes_no(repo.is_fork().await?)));
    if let Some(parent) = repo.parent().await? {
        out.push_str(&format!("Parent:      {}\n", parent.full_name().await?));
    }
    Ok(out)
}

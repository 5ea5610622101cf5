//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging
//! - `--token <TOKEN>`: API token (also read from `GITHUB_TOKEN`)
//! - `--provider <NAME>`: Hosting provider, overriding the configured default

use clap::{Parser, Subcommand};

use crate::forge::RepoRef;

/// igitt - inspect repositories and manage labels on Git hosting services
#[derive(Parser, Debug)]
#[command(name = "igitt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// API token; anonymous access if unset
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Hosting provider (default from config, else "github")
    #[arg(long, global = true)]
    pub provider: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show repository metadata
    #[command(after_help = "\
REPOSITORY REFERENCES:
    76145200                              numeric id
    coala/coala-bears                     owner/name
    git@github.com:coala/coala-bears.git  remote URL")]
    Repo {
        /// Repository id, owner/name or remote URL
        reference: RepoRef,
    },

    /// List label names in server order
    Labels {
        /// Repository id, owner/name or remote URL
        reference: RepoRef,
    },

    /// Create or delete a label
    Label {
        #[command(subcommand)]
        action: LabelAction,
    },
}

/// Label subcommands.
#[derive(Subcommand, Debug)]
pub enum LabelAction {
    /// Create a label
    Create {
        /// Repository id, owner/name or remote URL
        reference: RepoRef,

        /// Label name
        name: String,

        /// Six-digit hex color, with or without '#'
        #[arg(long, default_value = "ededed")]
        color: String,

        /// Label description
        #[arg(long, default_value = "")]
        description: String,

        /// Provider-specific label kind (ignored by GitHub)
        #[arg(long = "type", value_name = "TYPE")]
        label_type: Option<String>,
    },

    /// Delete a label
    Delete {
        /// Repository id, owner/name or remote URL
        reference: RepoRef,

        /// Label name
        name: String,
    },
}

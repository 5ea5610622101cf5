//! cli
//!
//! Command-line interface layer for igitt.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the tracing subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, builds a
//! [`Context`] from the global flags and dispatches to a handler in
//! [`commands`]. Handlers open a repository through
//! [`crate::forge::open_repository`] and only format results.

pub mod args;
pub mod commands;

pub use args::Cli;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Settings shared by every command.
#[derive(Clone, Default)]
pub struct Context {
    /// Debug logging requested
    pub debug: bool,
    /// API token; empty means anonymous
    pub token: String,
    /// Provider override from `--provider`
    pub provider: Option<String>,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("debug", &self.debug)
            .field("has_token", &!self.token.is_empty())
            .field("provider", &self.provider)
            .finish()
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    let ctx = Context {
        debug: cli.debug,
        token: cli.token.unwrap_or_default(),
        provider: cli.provider,
    };

    commands::dispatch(cli.command, &ctx)
}

/// Log to stderr. `RUST_LOG` wins; otherwise `--debug` selects the level.
fn init_tracing(debug: bool) {
    let default_level = if debug { "igitt=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Ignore the error if a subscriber is already installed.
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

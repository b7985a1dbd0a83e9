//! CLI entry point for tuplectl.

pub mod auth;
pub mod errors;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// TupleStream command-line client
#[derive(Parser, Debug)]
#[command(name = "tuplectl", version, about = "TupleStream command-line client")]
pub struct Cli {
    /// Verbose diagnostics on stderr (same as TUPLECTL_DEBUG)
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authentication management
    Auth(AuthArgs),
    /// Check platform health (logs in if needed)
    Status,
    /// Print version and build information
    Version,
}

/// Arguments for the `auth` subcommand group.
#[derive(Parser, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth subcommands for login, status, and logout.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Run the browser login, replacing any cached credential
    Login,
    /// Show whether a valid credential is cached
    Status,
    /// Remove the cached credential
    Logout,
}

/// Install the stderr subscriber. `RUST_LOG` wins unless debug is forced.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("tuplectl=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tuplectl=warn"))
    };
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

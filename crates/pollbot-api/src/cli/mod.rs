//! CLI command definitions for the `pollbot` binary.

pub mod poll;
pub mod repl;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Run polls from chat: build, open, vote and report.
#[derive(Parser)]
#[command(name = "pollbot", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Grant admin rights to this identity (repeatable, adds to config.toml).
    #[arg(long = "admin", value_name = "NICK", global = true)]
    pub admins: Vec<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive console chat: type poll commands as `<nick>`.
    Repl {
        /// Identity used for commands until changed with `/nick`.
        #[arg(long, env = "USER", default_value = "you")]
        nick: String,
    },

    /// List polls.
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show the report of one poll.
    Info {
        /// Poll codename.
        name: String,
    },

    /// Import polls from a legacy JSON export (array or one document per line).
    Import {
        /// Path to the export file.
        file: PathBuf,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[derive(Args)]
pub struct ListArgs {
    /// Only open polls.
    #[arg(long, conflicts_with = "closed")]
    pub open: bool,

    /// Only closed polls.
    #[arg(long)]
    pub closed: bool,

    /// Only polls created by this identity.
    #[arg(long)]
    pub author: Option<String>,
}

impl ListArgs {
    pub fn open_filter(&self) -> Option<bool> {
        match (self.open, self.closed) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

//! Pollbot entry point.
//!
//! Binary name: `pollbot`
//!
//! Parses CLI arguments, initializes tracing, the poll store and services,
//! then dispatches to the console chat loop or a one-shot command.

mod chat;
mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,pollbot_core=debug,pollbot_infra=debug",
        _ => "trace",
    };
    pollbot_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "pollbot", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init(&cli.admins).await?;

    let result = match &cli.command {
        Commands::Repl { nick } => cli::repl::run(&state, nick.clone(), cli.quiet).await,
        Commands::List(args) => cli::poll::list_polls(&state, args, cli.json).await,
        Commands::Info { name } => cli::poll::show_poll(&state, name, cli.json).await,
        Commands::Import { file } => cli::poll::import_polls(&state, file, cli.json).await,
        Commands::Completions { .. } => Ok(()),
    };

    pollbot_observe::tracing_setup::shutdown_tracing();
    result
}

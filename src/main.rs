// elevd — Application Entry Point
//
// Parses CLI arguments, initializes structured logging, and dispatches to
// the command handler. Uses the tokio runtime for the UDS service.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use elevd::cli::{execute, Cli};

#[tokio::main]
async fn main() {
    // RUST_LOG=elevd=debug for verbose output; default stays at info.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("elevd=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = execute(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use glassblog_backend::bootstrap;
use glassblog_backend::cli;
use glassblog_backend::config::GlassblogConfig;
use glassblog_backend::telemetry;
use glassblog_backend::utils;

#[derive(Parser)]
#[command(author, version, about = "GlassBlog backend daemon and admin console")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (Axum) for REST/API access
    Serve,
    /// Start the interactive admin console for managing posts
    Admin,
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::print_banner();
    telemetry::init_tracing();

    let args = Args::parse();

    let config = GlassblogConfig::from_env()?;
    let resources = bootstrap::initialize(config)?;
    tracing::info!(
        base = %resources.config.paths.base.display(),
        "bootstrap complete"
    );

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => cli::run_server(resources.config, resources.database).await,
        Command::Admin => cli::run_admin(resources.config, resources.database).await,
    }
}

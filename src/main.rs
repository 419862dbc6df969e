//! IconeSign CLI entry point.

use anyhow::Result;
use clap::Parser;

use iconesign::cli::commands;
use iconesign::cli::{handle_error, AppContext, Cli, Commands};
use iconesign::infrastructure::config::ConfigLoader;
use iconesign::infrastructure::logging::LoggerImpl;

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    let _logger = LoggerImpl::init(&config.logging)?;
    let ctx = AppContext::new(config);
    let json = cli.json;

    match cli.command {
        Commands::Auth(args) => commands::auth::execute(args, &ctx, json).await,
        Commands::Process(args) => commands::process::execute(args, &ctx, json).await,
        Commands::Progress(args) => commands::progress::execute(args, &ctx, json).await,
        Commands::Sign(args) => commands::sign::execute(args, &ctx, json).await,
        Commands::Validate(args) => commands::validate::execute(args, &ctx, json).await,
        Commands::Ttn(args) => commands::ttn::execute(args, &ctx, json).await,
        Commands::Certificates(args) => commands::certificates::execute(args, &ctx, json).await,
        Commands::History(args) => commands::history::execute(args, &ctx, json).await,
        Commands::Download(args) => commands::download::execute(args, &ctx, json).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(&err, json);
    }
}

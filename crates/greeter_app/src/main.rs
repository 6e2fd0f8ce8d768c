mod cli;
mod commands;
mod config;
mod terminal;

use anyhow::Result;
use clap::Parser;
use run_logging::run_debug;

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load(&cli)?;
    run_logging::initialize(&config.log_destination, config.log_level);
    run_debug!("Using state directory {}", config.state_dir.display());

    match &cli.command {
        Commands::Login { token } => commands::login(&config, token),
        Commands::Logout => commands::logout(&config),
        Commands::Status => commands::status(&config),
        Commands::Quota => commands::quota(&config).await,
        Commands::Reset => commands::reset(&config),
        Commands::Start {
            count,
            tab,
            page,
            yes,
        } => commands::start(&config, *count, *tab, page, *yes).await,
        Commands::Step { page } => commands::step(&config, page).await,
    }
}

//! depcache - dependency install cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use depcache::cli::{Cli, Commands};
use depcache::config::ConfigManager;
use depcache::error::{DepcacheError, DepcacheResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> DepcacheResult<()> {
    let cli = Cli::parse();

    // Backends needs neither config nor logging
    if let Commands::Backends = cli.command {
        return depcache::cli::commands::backends().await;
    }

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    // Find local config unless --no-local is set, starting from the project
    // being installed
    let local_config_path = if cli.no_local {
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| DepcacheError::io("getting current directory", e))?;
        let start = match &cli.command {
            Commands::Install(args) => args.project.as_ref().map(|p| cwd.join(p)),
            _ => None,
        }
        .unwrap_or(cwd);
        ConfigManager::find_local_config(&start)
    };

    let mut config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;
    if let Some(dir) = cli.cache_directory {
        config.cache.directory = Some(dir);
    }

    init_tracing(cli.verbose, &config.general.log_format);
    if let Some(ref path) = local_config_path {
        debug!("Using local config: {}", path.display());
    }

    match cli.command {
        Commands::Backends => unreachable!("Backends handled above"),
        Commands::Install(args) => depcache::cli::commands::install(args, &config).await,
        Commands::Clean => depcache::cli::commands::clean(&config).await,
    }
}

/// 0 = warn, 1 = info, 2+ = debug
fn init_tracing(verbose: u8, log_format: &str) {
    let filter = match verbose {
        0 => EnvFilter::new("depcache=warn"),
        1 => EnvFilter::new("depcache=info"),
        _ => EnvFilter::new("depcache=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time();

    if log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

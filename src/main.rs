use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use magpie::cli::commands::{self, GrabOverrides};
use magpie::cli::{Cli, Commands};
use magpie::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("magpie=info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let result = match cli.command {
        Commands::Grab {
            query,
            limit,
            output_dir,
            concurrency,
            timeout,
            urls,
        } => {
            let overrides = GrabOverrides {
                output_dir,
                concurrency,
                timeout_secs: timeout,
                urls,
            };
            commands::grab(config, &query, limit, overrides).await
        }
        Commands::Search { query, limit } => commands::search(config, &query, limit).await,
        Commands::Config => {
            commands::show_config(&config, cli.config);
            Ok(())
        }
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("{}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

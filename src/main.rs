use std::process::ExitCode;

use clap::Parser;
use twitter_marketing_mcp::{cli, infra};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Credentials usually live in a local .env next to the binary.
    let _ = dotenvy::dotenv();
    infra::logging::init();

    let args = cli::Cli::parse();
    match args.command {
        Some(command) => Ok(cli::run_commands(command).await),
        None => {
            infra::boot::run_server().await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

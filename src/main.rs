//! VouchBot - vouch tracking bot for Telegram groups.

use clap::Parser;
use std::process::ExitCode;

mod cli;
mod config;
mod core;
mod error;
mod logging;
mod store;
mod telegram;

use cli::Commands;

#[tokio::main]
async fn main() -> ExitCode {
    // Keep the guard alive so buffered log lines reach the file.
    let _guard = match logging::init() {
        Ok((guard, _)) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let args = Commands::parse();

    match args.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tally - a Telegram bot for recording sales, stock and seller reports.
//!
//! This is the binary entry point.

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tally_config::TallyConfig;

/// Tally - a Telegram bot for recording sales, stock and seller reports.
#[derive(Parser, Debug)]
#[command(name = "tally", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the bot: Telegram polling, conversation engine and scheduled jobs.
    Serve,
    /// Validate the configuration and print the effective values.
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => tally_config::load_and_validate_path(path),
        None => tally_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            tally_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(errors) = tally_config::validate_for_serve(&config) {
                tally_config::render_errors(&errors);
                std::process::exit(1);
            }
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("tally: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::CheckConfig) => {
            let ready = tally_config::validate_for_serve(&config);
            match toml::to_string_pretty(&redacted(&config)) {
                Ok(rendered) => println!("{rendered}"),
                Err(e) => eprintln!("tally: failed to render configuration: {e}"),
            }
            match ready {
                Ok(()) => eprintln!("tally: configuration is valid and ready to serve"),
                Err(errors) => {
                    tally_config::render_errors(&errors);
                    std::process::exit(1);
                }
            }
        }
        None => {
            println!("tally: use --help for available commands");
        }
    }
}

const REDACTED: &str = "********";

/// A copy of `config` with secrets masked, for display.
fn redacted(config: &TallyConfig) -> TallyConfig {
    let mut shown = config.clone();
    let mask = |value: &mut Option<String>| {
        if value.is_some() {
            *value = Some(REDACTED.to_string());
        }
    };
    mask(&mut shown.telegram.bot_token);
    mask(&mut shown.admin.password);
    mask(&mut shown.monitor.api_key);
    shown
}

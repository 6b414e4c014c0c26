// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Draftline - support-email auto-drafts for merchants.
//!
//! This is the binary entry point: the gateway server, one-shot poll and
//! process commands, and a configuration check.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod runtime;
mod serve;
mod shutdown;
mod trigger;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use draftline_config::model::DraftlineConfig;
use draftline_core::types::MailProviderKind;

/// Draftline - support-email auto-drafts for merchants.
#[derive(Parser, Debug)]
#[command(name = "draftline", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway (and the in-process poller when scheduled).
    Serve,
    /// Run one poll and print the per-merchant results as JSON.
    Poll {
        /// External merchant id to poll; repeatable. Defaults to every eligible merchant.
        #[arg(long = "merchant")]
        merchants: Vec<String>,
        /// Maximum number of merchants in this run.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Draft a reply to a single message.
    Process {
        /// External merchant id.
        #[arg(long)]
        merchant: String,
        /// Provider message id.
        #[arg(long = "message")]
        message_id: String,
        /// Mail provider (gmail or outlook).
        #[arg(long, default_value = "gmail")]
        provider: MailProviderKind,
    },
    /// Configuration commands.
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Validate configuration and probe the database and integrations.
    Check,
}

fn load_config(path: Option<&PathBuf>) -> DraftlineConfig {
    let loaded = match path {
        Some(path) => draftline_config::load_and_validate_path(path),
        None => draftline_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            draftline_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("draftline={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref());
    init_tracing(&config.service.log_level);

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Poll { merchants, limit } => trigger::run_poll(config, merchants, limit).await,
        Commands::Process {
            merchant,
            message_id,
            provider,
        } => trigger::run_process(config, &merchant, &message_id, provider).await,
        Commands::Config {
            action: ConfigCommands::Check,
        } => check::run_check(&config).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

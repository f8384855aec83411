mod archive;
mod cli;
mod commands;
mod config;
mod error;
mod paths;
mod save_sync;
mod slots;
mod store;
mod util;

use crate::cli::Cli;
use crate::config::Settings;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    // Logs go to stderr, stdout carries the result line
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "slotsync=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env();
    tracing::debug!("Config dir {}", settings.config_dir.display());

    commands::run(cli.cmd, &settings)
}

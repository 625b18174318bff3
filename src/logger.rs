use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::storage::data_dir;

pub fn log_path() -> PathBuf {
    data_dir().join("kinoclub.log")
}

/// Installs the global subscriber: stderr plus an append-only log file.
/// `RUST_LOG` overrides the default filter.
pub fn init() -> PathBuf {
    let path = log_path();
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kinoclub=debug,kinoclub_core=debug,hyper_util=off"));

    let file_layer = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()
        .map(|f| tracing_subscriber::fmt::layer().with_ansi(false).with_writer(Mutex::new(f)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    path
}

/// Logs the command line before a player is spawned.
pub fn log_command(program: &str, args: &[String]) {
    tracing::info!("RUN: {} {}", program, args.join(" "));
}

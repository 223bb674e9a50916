//! mochilist command line client
//!
//! Every command runs against a [`SyncEngine`](mochi_sync::SyncEngine)
//! backed by a JSON draft file that is rewritten on each change. Without
//! `remote` the engine has no authority and every change stays local; with
//! it, changes are confirmed over HTTP and the file acts as a local copy.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod render;

pub use cli::{Cli, Command};
pub use commands::{open_engine, run};
pub use config::{ClientConfig, DEFAULT_CONFIG_FILE, LOG_ENV};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber: [`LOG_ENV`] if set, else `log_filter`
///
/// # Errors
/// Bad filter directives or a subscriber already installed
pub fn init_tracing(config: &ClientConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_filter)
            .with_context(|| format!("invalid log filter '{}'", config.log_filter))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

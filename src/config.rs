//! Command line and environment configuration.
//!
//! Every flag falls back to an environment variable. `.env.local` and `.env`
//! are read first (in that order, without overriding variables that are
//! already set).

use crate::register::{DEFAULT_CHAIN_IDS, DEFAULT_EVENTS_API};
use crate::server::StreamSettings;
use crate::store::{StoreConfig, DEFAULT_MAX_EVENTS};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Environment files read at startup, in priority order.
pub const ENV_FILES: [&str; 2] = [".env.local", ".env"];

#[derive(Parser, Debug)]
#[command(name = "safe-relay", version, about = "Relay Safe webhook events to live viewers")]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Receive webhooks and serve the event endpoints
    Serve(ServeArgs),
    /// Register this relay's webhook URL with the Safe Events Service
    RegisterWebhook(RegisterArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Bearer token expected on webhook deliveries (unset = no check)
    #[arg(long, env = "WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: Option<String>,

    /// Number of events kept in memory
    #[arg(long, env = "MAX_EVENTS", default_value_t = DEFAULT_MAX_EVENTS)]
    pub max_events: usize,

    /// Cap on concurrent live subscriptions (unset = unbounded)
    #[arg(long, env = "MAX_SUBSCRIBERS")]
    pub max_subscribers: Option<usize>,

    /// Notifications queued per stream client before dropping
    #[arg(long, env = "STREAM_BUFFER", default_value_t = 16)]
    pub stream_buffer: usize,

    /// Seconds between stream keep-alive comments (at least 1)
    #[arg(
        long,
        env = "KEEP_ALIVE_SECS",
        default_value_t = 15,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub keep_alive_secs: u64,
}

impl ServeArgs {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            max_events: self.max_events,
            max_subscribers: self.max_subscribers,
        }
    }

    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            buffer: self.stream_buffer,
            keep_alive: Duration::from_secs(self.keep_alive_secs),
        }
    }

    /// The configured secret; an empty value counts as unset.
    pub fn webhook_secret(&self) -> Option<&str> {
        self.webhook_secret.as_deref().filter(|s| !s.is_empty())
    }
}

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    /// Public base URL of this relay, e.g. https://relay.example.com
    #[arg(long, env = "PUBLIC_URL")]
    pub public_url: String,

    /// Token the Safe Events Service will send as `Authorization: Bearer`
    #[arg(long, env = "WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: String,

    /// Safe Events Service base URL
    #[arg(long, env = "SAFE_EVENTS_API", default_value = DEFAULT_EVENTS_API)]
    pub events_api: String,

    /// Chains to receive events for
    #[arg(long = "chain-id", value_delimiter = ',', default_values_t = DEFAULT_CHAIN_IDS)]
    pub chain_ids: Vec<u64>,
}

/// Load environment files. Returns the files that were found.
pub fn load_env_files() -> Vec<PathBuf> {
    ENV_FILES
        .iter()
        .filter_map(|name| dotenvy::from_filename(name).ok())
        .collect()
}

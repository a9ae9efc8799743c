pub mod checks;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod integrations;
pub mod state;
pub mod utils;
pub mod watcher;

use events::ready::StartLatch;
use integrations::query::QueryClient;

/// Shared data accessible across all Poise commands and event handlers.
pub struct Data {
    pub config: config::Config,
    pub http_client: reqwest::Client,
    pub query: QueryClient,
    /// Closed the first time the IP watcher is spawned.
    pub watcher_latch: StartLatch,
}

impl Data {
    pub fn new(config: config::Config) -> Self {
        let query = QueryClient::new(
            config.query_host.clone(),
            config.query_port,
            config.query_timeout,
        );
        Self {
            config,
            http_client: reqwest::Client::new(),
            query,
            watcher_latch: StartLatch::default(),
        }
    }
}

/// Poise context alias used throughout the bot.
pub type Context<'a> = poise::Context<'a, Data, error::Error>;

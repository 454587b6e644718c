pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod scraper;

use std::sync::Arc;

use config::Config;
use controller::{Controller, SessionStore};
use error::Result;
use llm::OpenAiClient;
use scraper::HttpFetcher;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<Controller>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    /// Wires the production HTTP fetcher and OpenAI client from `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.fetch_timeout)?;
        let model = OpenAiClient::from_config(&config)?;
        let controller = Controller::new(
            Arc::new(fetcher),
            Arc::new(model),
            config.completion.clone(),
            config.moderation_policy,
        );

        Ok(Self {
            controller: Arc::new(controller),
            sessions: Arc::new(SessionStore::with_capacity(config.max_sessions)),
        })
    }
}

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use concept_summariser::AppState;
use concept_summariser::config::ModerationPolicy;
use concept_summariser::controller::{Controller, DEFAULT_MAX_SESSIONS, SessionStore};
use concept_summariser::error::{AppError, Result};
use concept_summariser::llm::{
    CompletionOptions, LanguageModel, ModerationVerdict, clean_completion,
};
use concept_summariser::scraper::{
    ContentFetcher, Document, MAX_INPUT_CHARS, normalize_text, validate_url,
};

/// Every external call the controller made, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Fetch(String),
    Moderate(String),
    Complete(String),
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<Call> {
    log.lock().unwrap().clone()
}

pub enum FetchReply {
    Page(String),
    Status(u16),
}

pub struct MockFetcher {
    pub reply: FetchReply,
    pub log: CallLog,
}

#[async_trait]
impl ContentFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<Document> {
        validate_url(url)?;
        self.log.lock().unwrap().push(Call::Fetch(url.to_string()));
        match &self.reply {
            FetchReply::Page(text) => Ok(Document {
                url: url.to_string(),
                text: normalize_text(text, MAX_INPUT_CHARS),
            }),
            FetchReply::Status(code) => Err(AppError::HttpStatus(*code)),
        }
    }
}

pub struct MockModel {
    pub verdict: ModerationVerdict,
    pub completion: std::result::Result<String, String>,
    pub log: CallLog,
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn moderate(&self, text: &str) -> ModerationVerdict {
        self.log.lock().unwrap().push(Call::Moderate(text.to_string()));
        self.verdict.clone()
    }

    async fn complete(&self, prompt: &str, _options: &CompletionOptions) -> Result<String> {
        self.log.lock().unwrap().push(Call::Complete(prompt.to_string()));
        match &self.completion {
            Ok(text) => Ok(clean_completion(text)),
            Err(e) => Err(AppError::Completion(e.clone())),
        }
    }
}

pub fn controller(
    fetch: FetchReply,
    verdict: ModerationVerdict,
    completion: std::result::Result<&str, &str>,
    policy: ModerationPolicy,
) -> (Controller, CallLog) {
    let log = new_log();
    let fetcher = MockFetcher {
        reply: fetch,
        log: log.clone(),
    };
    let model = MockModel {
        verdict,
        completion: completion.map(str::to_string).map_err(str::to_string),
        log: log.clone(),
    };
    let controller = Controller::new(
        Arc::new(fetcher),
        Arc::new(model),
        CompletionOptions::default(),
        policy,
    );
    (controller, log)
}

pub fn app_state(controller: Controller) -> AppState {
    app_state_with_capacity(controller, DEFAULT_MAX_SESSIONS)
}

pub fn app_state_with_capacity(controller: Controller, max_sessions: usize) -> AppState {
    AppState {
        controller: Arc::new(controller),
        sessions: Arc::new(SessionStore::with_capacity(max_sessions)),
    }
}

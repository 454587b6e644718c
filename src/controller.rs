//! Sequencing of fetch → moderate → complete, and the per-session state
//! the web layer drives it through.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ModerationPolicy;
use crate::error::{AppError, Result};
use crate::llm::{CompletionOptions, LanguageModel, ModerationVerdict};
use crate::prompt::{Language, build_prompt};
use crate::scraper::{ContentFetcher, MAX_INPUT_CHARS, normalize_text};

/// What the user submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Input {
    Url(String),
    Text(String),
}

impl Input {
    pub fn is_blank(&self) -> bool {
        match self {
            Input::Url(s) | Input::Text(s) => s.trim().is_empty(),
        }
    }
}

/// Result of one run; exactly one of summary or error is ever shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Outcome {
    Success { summary: String },
    Failure { error: String },
}

impl Outcome {
    pub fn summary(&self) -> &str {
        match self {
            Outcome::Success { summary } => summary,
            Outcome::Failure { .. } => "",
        }
    }

    pub fn error(&self) -> &str {
        match self {
            Outcome::Success { .. } => "",
            Outcome::Failure { error } => error,
        }
    }
}

impl From<Result<String>> for Outcome {
    fn from(result: Result<String>) -> Self {
        match result {
            Ok(summary) => Outcome::Success { summary },
            Err(e) => Outcome::Failure { error: e.to_string() },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    AwaitingResult,
    Displaying,
}

/// Input cached after a successful fetch/normalize step, reused by regenerate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedInput {
    pub text: String,
    pub language: Language,
}

#[derive(Debug, Default)]
pub struct Session {
    phase: Phase,
    cached: Option<CachedInput>,
    outcome: Option<Outcome>,
}

impl Session {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cached(&self) -> Option<&CachedInput> {
        self.cached.as_ref()
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    fn recover_abandoned(&mut self) {
        if self.phase == Phase::AwaitingResult {
            warn!("Session left mid-run, restoring last displayed state");
            self.phase = if self.outcome.is_some() {
                Phase::Displaying
            } else {
                Phase::Idle
            };
        }
    }
}

/// Runs the three-step chain against pluggable fetch and model backends.
pub struct Controller {
    fetcher: Arc<dyn ContentFetcher>,
    model: Arc<dyn LanguageModel>,
    options: CompletionOptions,
    policy: ModerationPolicy,
}

impl Controller {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        model: Arc<dyn LanguageModel>,
        options: CompletionOptions,
        policy: ModerationPolicy,
    ) -> Self {
        Self {
            fetcher,
            model,
            options,
            policy,
        }
    }

    /// Turns raw input into the text the model will see.
    pub async fn prepare(&self, input: &Input) -> Result<String> {
        let text = match input {
            Input::Url(url) => {
                let document = self.fetcher.fetch(url).await?;
                debug!("Fetched {} chars from {}", document.text.chars().count(), document.url);
                document.text
            }
            Input::Text(text) => normalize_text(text, MAX_INPUT_CHARS),
        };

        if text.is_empty() {
            return Err(match input {
                Input::Url(_) => AppError::EmptyContent,
                Input::Text(_) => AppError::EmptyInput,
            });
        }
        Ok(text)
    }

    /// Moderate, then complete. Nothing reaches the completion call unless
    /// moderation passed (or failed under a fail-open policy).
    pub async fn generate(&self, text: &str, language: Language) -> Result<String> {
        match self.model.moderate(text).await {
            ModerationVerdict::Clear => {}
            ModerationVerdict::Flagged => return Err(AppError::ContentFlagged),
            ModerationVerdict::CheckFailed(reason) => match self.policy {
                ModerationPolicy::FailClosed => {
                    return Err(AppError::ModerationCheckFailed(reason));
                }
                ModerationPolicy::FailOpen => {
                    warn!("Moderation check failed, continuing (fail-open): {}", reason);
                }
            },
        }

        let prompt = build_prompt(text, language);
        self.model.complete(&prompt, &self.options).await
    }

    /// Seeds the session with new input and runs the full chain.
    pub async fn submit(
        &self,
        session: &mut Session,
        input: Input,
        language: Language,
    ) -> Result<Outcome> {
        if input.is_blank() {
            return Err(AppError::EmptyInput);
        }

        session.phase = Phase::AwaitingResult;
        session.cached = None;
        session.outcome = None;

        let result = match self.prepare(&input).await {
            Ok(text) => {
                session.cached = Some(CachedInput {
                    text: text.clone(),
                    language,
                });
                self.generate(&text, language).await
            }
            Err(e) => Err(e),
        };

        if let Ok(summary) = &result {
            match &input {
                Input::Url(url) => info!("URL: {}\nSummary: {}", url, summary),
                Input::Text(text) => info!("Text: {}\nSummary: {}", text, summary),
            }
        }

        Ok(self.finish(session, result))
    }

    /// Re-runs moderate → complete on the cached input.
    pub async fn regenerate(&self, session: &mut Session) -> Result<Outcome> {
        let cached = session.cached.clone().ok_or(AppError::NothingToRegenerate)?;

        session.phase = Phase::AwaitingResult;
        let result = self.generate(&cached.text, cached.language).await;
        if let Ok(summary) = &result {
            info!("Regenerated summary: {}", summary);
        }

        Ok(self.finish(session, result))
    }

    fn finish(&self, session: &mut Session, result: Result<String>) -> Outcome {
        if let Err(e) = &result {
            info!("Run failed: {}", e);
        }
        let outcome = Outcome::from(result);
        session.phase = Phase::Displaying;
        session.outcome = Some(outcome.clone());
        outcome
    }
}

/// Default number of sessions kept before the least recently used is dropped.
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

type SharedSession = Arc<tokio::sync::Mutex<Session>>;

/// Process-local registry of sessions, bounded by LRU eviction. Each session
/// is guarded by its own async lock; a run holds it for its whole duration.
pub struct SessionStore {
    sessions: Mutex<LruCache<Uuid, SharedSession>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(max_sessions: usize) -> Self {
        let capacity = NonZeroUsize::new(max_sessions).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the session for `id`, creating a fresh one when `id` is `None`.
    /// Evicted sessions stay alive for any run still holding them.
    pub fn get_or_create(&self, id: Option<Uuid>) -> Result<(Uuid, SharedSession)> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        match id {
            Some(id) => sessions
                .get(&id)
                .cloned()
                .map(|session| (id, session))
                .ok_or(AppError::SessionNotFound),
            None => {
                let id = Uuid::new_v4();
                let session = Arc::new(tokio::sync::Mutex::new(Session::default()));
                if let Some((evicted, _)) = sessions.push(id, session.clone()) {
                    debug!("Evicted idle session {}", evicted);
                }
                Ok((id, session))
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Result<SharedSession> {
        self.get_or_create(Some(id)).map(|(_, session)| session)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).cap().get()
    }
}

/// Locks a session for a run, rejecting the request if one is in flight.
///
/// `Phase::AwaitingResult` is only meaningful while the lock is held. A run
/// whose future was dropped (client disconnect) leaves it behind, so it is
/// rolled back here before the caller sees the session.
pub fn lock_session(
    session: &tokio::sync::Mutex<Session>,
) -> Result<tokio::sync::MutexGuard<'_, Session>> {
    let mut guard = session.try_lock().map_err(|_| AppError::Busy)?;
    guard.recover_abandoned();
    Ok(guard)
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::controller::{Input, Outcome, Phase};
use crate::prompt::Language;

#[derive(Deserialize)]
pub struct ConceptRequest {
    pub session_id: Option<Uuid>,
    pub source: Input,
    #[serde(default)]
    pub language: Language,
}

#[derive(Deserialize)]
pub struct RegenerateRequest {
    pub session_id: Uuid,
}

#[derive(Serialize)]
pub struct ConceptResponse {
    pub session_id: Uuid,
    pub phase: Phase,
    pub summary: String,
    pub error: String,
    pub generated_at: DateTime<Utc>,
}

impl ConceptResponse {
    pub fn new(session_id: Uuid, phase: Phase, outcome: &Outcome) -> Self {
        Self {
            session_id,
            phase,
            summary: outcome.summary().to_string(),
            error: outcome.error().to_string(),
            generated_at: Utc::now(),
        }
    }
}

/// Fields posted by the HTML form. Everything is optional because browsers
/// only send what the current page rendered.
#[derive(Debug, Default, Deserialize)]
pub struct FormSubmission {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub action: String,
}

impl FormSubmission {
    pub fn session_id(&self) -> Option<Uuid> {
        Uuid::parse_str(self.session_id.trim()).ok()
    }

    pub fn language(&self) -> Language {
        self.language.parse().unwrap_or_default()
    }

    pub fn is_regenerate(&self) -> bool {
        self.action == "regenerate"
    }

    pub fn input(&self) -> Input {
        if self.source == "text" {
            Input::Text(self.text.clone())
        } else {
            Input::Url(self.url.clone())
        }
    }
}

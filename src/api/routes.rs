use axum::{
    Router,
    extract::{Form, Json, State},
    response::{Html, IntoResponse},
    routing::{get, post},
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::AppState;
use crate::api::models::{ConceptRequest, ConceptResponse, FormSubmission, RegenerateRequest};
use crate::api::page::{self, PageView};
use crate::api::response;
use crate::controller::{Input, Outcome, Phase, lock_session};
use crate::error::{AppError, Result};
use crate::prompt::Language;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler).post(form_handler))
        .route("/api/concept", post(concept_handler))
        .route("/api/concept/regenerate", post(regenerate_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn index_handler() -> Html<String> {
    Html(page::render(&PageView::default()))
}

async fn form_handler(
    State(state): State<AppState>,
    Form(form): Form<FormSubmission>,
) -> Html<String> {
    let language = form.language();
    // A stale id (e.g. after a restart) silently starts a new session.
    let known_id = form
        .session_id()
        .filter(|id| state.sessions.get(*id).is_ok());

    let result = if form.is_regenerate() {
        match known_id {
            Some(id) => run_regenerate(&state, id).await,
            None => Err(AppError::NothingToRegenerate),
        }
    } else {
        run_submit(&state, known_id, form.input(), language).await
    };

    let mut view = PageView {
        session_id: known_id,
        text_mode: form.source == "text",
        url: &form.url,
        text: &form.text,
        language,
        ..Default::default()
    };

    let outcome: Outcome;
    let notice: String;
    match result {
        Ok((id, _, run_outcome)) => {
            outcome = run_outcome;
            view.session_id = Some(id);
            view.outcome = Some(&outcome);
        }
        Err(e) => {
            notice = e.to_string();
            view.notice = Some(&notice);
        }
    }

    Html(page::render(&view))
}

async fn concept_handler(
    State(state): State<AppState>,
    Json(req): Json<ConceptRequest>,
) -> Result<impl IntoResponse> {
    let (id, phase, outcome) = run_submit(&state, req.session_id, req.source, req.language).await?;
    Ok(response::success(ConceptResponse::new(id, phase, &outcome)))
}

async fn regenerate_handler(
    State(state): State<AppState>,
    Json(req): Json<RegenerateRequest>,
) -> Result<impl IntoResponse> {
    let (id, phase, outcome) = run_regenerate(&state, req.session_id).await?;
    Ok(response::success(ConceptResponse::new(id, phase, &outcome)))
}

async fn run_submit(
    state: &AppState,
    session_id: Option<Uuid>,
    input: Input,
    language: Language,
) -> Result<(Uuid, Phase, Outcome)> {
    if input.is_blank() {
        return Err(AppError::EmptyInput);
    }

    let (id, session) = state.sessions.get_or_create(session_id)?;
    let mut guard = lock_session(&session)?;
    info!("Processing submission for session {}", id);

    let outcome = state.controller.submit(&mut guard, input, language).await?;
    Ok((id, guard.phase(), outcome))
}

async fn run_regenerate(state: &AppState, session_id: Uuid) -> Result<(Uuid, Phase, Outcome)> {
    let session = state.sessions.get(session_id)?;
    let mut guard = lock_session(&session)?;
    info!("Regenerating summary for session {}", session_id);

    let outcome = state.controller.regenerate(&mut guard).await?;
    Ok((session_id, guard.phase(), outcome))
}

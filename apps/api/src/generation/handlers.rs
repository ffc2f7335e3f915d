//! Axum route handlers for the Generation API.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::drafting::handlers::{session_response, SessionResponse};
use crate::errors::AppError;
use crate::generation::generator::{generate_draft, GenerateRequest};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub session: SessionResponse,
    pub raw_text: String,
}

/// POST /api/v1/drafts/generate
///
/// Full generation pipeline: validate inputs → LLM call → parse → open an
/// editor session flagged as AI-generated. A model failure answers 503 with
/// `retryable`; the poster can also fall back to manual drafting.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let draft = generate_draft(&state.gateway, &state.llm, &state.editor, request).await?;

    Ok(Json(GenerateResponse {
        session: session_response(&draft.session),
        raw_text: draft.raw_text,
    }))
}

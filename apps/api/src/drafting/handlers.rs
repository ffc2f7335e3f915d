//! Axum route handlers for the Drafting API.
//!
//! Section mutations run on the live session under the store's write lock
//! and answer with the full updated session, so the client always renders
//! the state the server holds. Save and publish snapshot the session first;
//! the workflow enforces the one-operation-per-session rule.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::drafting::editor::EditorSession;
use crate::drafting::sections::{SectionError, SectionList, SectionView};
use crate::drafting::workflow;
use crate::errors::AppError;
use crate::models::draft::{JobDraftRow, JobRow};
use crate::progress::flags::MilestoneFlag;
use crate::progress::sync::ProgressSync;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UserIdBody {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct StartEditorRequest {
    pub user_id: Uuid,
    /// Pasted draft text. Absent or blank starts the placeholder skeleton.
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SectionEditRequest {
    pub user_id: Uuid,
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SectionLockRequest {
    pub user_id: Uuid,
    pub locked: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub user_id: Uuid,
    pub source_id: Uuid,
    pub target_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub draft_id: Option<Uuid>,
    pub ai_generated: bool,
    pub created_at: DateTime<Utc>,
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Serialize)]
pub struct CompileResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub draft_id: Uuid,
    pub created: bool,
}

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub job_id: Uuid,
    pub draft_id: Uuid,
    pub milestone_recorded: bool,
}

#[derive(Debug, Serialize)]
pub struct DraftListResponse {
    pub drafts: Vec<JobDraftRow>,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobRow>,
}

pub fn session_response(session: &EditorSession) -> SessionResponse {
    SessionResponse {
        session_id: session.id,
        draft_id: session.draft_id,
        ai_generated: session.ai_generated,
        created_at: session.created_at,
        sections: session.sections.views(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn session_not_found(session_id: Uuid) -> AppError {
    AppError::NotFound(format!("Editor session {session_id} not found"))
}

/// Snapshot with ownership check, for reads and for the persistence ops.
async fn authorized_snapshot(
    state: &AppState,
    session_id: Uuid,
    user_id: Uuid,
) -> Result<EditorSession, AppError> {
    let session = state
        .editor
        .snapshot(session_id)
        .await
        .ok_or_else(|| session_not_found(session_id))?;
    if session.user_id != user_id {
        return Err(AppError::Forbidden);
    }
    Ok(session)
}

/// Runs one section mutation on the live session and returns the updated
/// session view. Ownership is checked under the same lock as the mutation.
async fn mutate_session(
    state: &AppState,
    session_id: Uuid,
    user_id: Uuid,
    f: impl FnOnce(&mut SectionList) -> Result<(), SectionError>,
) -> Result<SessionResponse, AppError> {
    state
        .editor
        .mutate(session_id, |session| {
            if session.user_id != user_id {
                return Err(AppError::Forbidden);
            }
            f(&mut session.sections)?;
            Ok(session_response(session))
        })
        .await
        .ok_or_else(|| session_not_found(session_id))?
}

// ────────────────────────────────────────────────────────────────────────────
// Editor session handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/drafts/editor
///
/// Starts a drafting session from pasted text, or from the placeholder
/// skeleton when no text is given. Evicts the user's previous session.
pub async fn handle_start_editor(
    State(state): State<AppState>,
    Json(request): Json<StartEditorRequest>,
) -> Json<SessionResponse> {
    let sections = match request.text.as_deref().filter(|t| !t.trim().is_empty()) {
        Some(text) => SectionList::parse(text),
        None => SectionList::skeleton(),
    };
    let session = EditorSession::new(request.user_id, sections, false);
    let response = session_response(&session);
    state.editor.insert(session).await;

    // Milestone write is best-effort; the session exists either way.
    let mut sync = ProgressSync::new(Arc::clone(&state.gateway), request.user_id);
    sync.update_flag(MilestoneFlag::HasStartedJdDraft, true).await;

    Json(response)
}

/// GET /api/v1/drafts/editor/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = authorized_snapshot(&state, session_id, params.user_id).await?;
    Ok(Json(session_response(&session)))
}

/// GET /api/v1/drafts/editor/:id/compile
///
/// The canonical text for clipboard/export; the same blob a save persists.
pub async fn handle_compile(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<CompileResponse>, AppError> {
    let session = authorized_snapshot(&state, session_id, params.user_id).await?;
    Ok(Json(CompileResponse {
        text: session.sections.compile(),
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Section mutation handlers
// ────────────────────────────────────────────────────────────────────────────

/// PATCH /api/v1/drafts/editor/:id/sections/:sid
///
/// Replaces content and/or title. Content edits are applied first so a
/// locked section rejects the request before anything changes.
pub async fn handle_edit_section(
    State(state): State<AppState>,
    Path((session_id, section_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SectionEditRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    if request.title.is_none() && request.content.is_none() {
        return Err(AppError::Validation(
            "Provide a title or content to update".to_string(),
        ));
    }

    let response = mutate_session(&state, session_id, request.user_id, |sections| {
        if let Some(content) = request.content {
            sections.set_content(section_id, content)?;
        }
        if let Some(title) = request.title {
            sections.set_title(section_id, title)?;
        }
        Ok(())
    })
    .await?;
    Ok(Json(response))
}

/// PATCH /api/v1/drafts/editor/:id/sections/:sid/lock
pub async fn handle_lock_section(
    State(state): State<AppState>,
    Path((session_id, section_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SectionLockRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let response = mutate_session(&state, session_id, request.user_id, |sections| {
        sections.set_locked(section_id, request.locked)
    })
    .await?;
    Ok(Json(response))
}

/// POST /api/v1/drafts/editor/:id/sections/:sid/editing
///
/// Toggles the editing cursor; at most one section composes at a time.
pub async fn handle_toggle_editing(
    State(state): State<AppState>,
    Path((session_id, section_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UserIdBody>,
) -> Result<Json<SessionResponse>, AppError> {
    let response = mutate_session(&state, session_id, request.user_id, |sections| {
        sections.toggle_editing(section_id)
    })
    .await?;
    Ok(Json(response))
}

/// POST /api/v1/drafts/editor/:id/sections
///
/// Appends a custom section, opened for composition.
pub async fn handle_add_section(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<UserIdBody>,
) -> Result<Json<SessionResponse>, AppError> {
    let response = mutate_session(&state, session_id, request.user_id, |sections| {
        sections.add_custom();
        Ok(())
    })
    .await?;
    Ok(Json(response))
}

/// DELETE /api/v1/drafts/editor/:id/sections/:sid
///
/// Removes a custom section. The twelve known kinds are permanent.
pub async fn handle_remove_section(
    State(state): State<AppState>,
    Path((session_id, section_id)): Path<(Uuid, Uuid)>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<SessionResponse>, AppError> {
    let response = mutate_session(&state, session_id, params.user_id, |sections| {
        sections.remove(section_id)
    })
    .await?;
    Ok(Json(response))
}

/// POST /api/v1/drafts/editor/:id/reorder
///
/// Drag semantics: the source section lands where the target was.
pub async fn handle_reorder(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let response = mutate_session(&state, session_id, request.user_id, |sections| {
        sections.reorder(request.source_id, request.target_id)
    })
    .await?;
    Ok(Json(response))
}

// ────────────────────────────────────────────────────────────────────────────
// Persistence handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/drafts/editor/:id/save
pub async fn handle_save(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<UserIdBody>,
) -> Result<Json<SaveResponse>, AppError> {
    let session = authorized_snapshot(&state, session_id, request.user_id).await?;
    let outcome = workflow::save(&state.gateway, &state.op_locks, &state.editor, session).await?;
    Ok(Json(SaveResponse {
        draft_id: outcome.draft_id,
        created: outcome.created,
    }))
}

/// POST /api/v1/drafts/editor/:id/publish
pub async fn handle_publish(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<UserIdBody>,
) -> Result<Json<PublishResponse>, AppError> {
    let session = authorized_snapshot(&state, session_id, request.user_id).await?;
    let outcome =
        workflow::publish(&state.gateway, &state.op_locks, &state.editor, session).await?;
    Ok(Json(PublishResponse {
        job_id: outcome.job_id,
        draft_id: outcome.draft_id,
        milestone_recorded: outcome.milestone_recorded,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Read handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/drafts
pub async fn handle_list_drafts(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<DraftListResponse>, AppError> {
    let drafts = state.gateway.list_drafts(params.user_id).await?;
    Ok(Json(DraftListResponse { drafts }))
}

/// GET /api/v1/drafts/:id
pub async fn handle_get_draft(
    State(state): State<AppState>,
    Path(draft_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<JobDraftRow>, AppError> {
    let draft = state
        .gateway
        .fetch_draft(params.user_id, draft_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Draft {draft_id} not found")))?;
    Ok(Json(draft))
}

/// GET /api/v1/jobs
///
/// The public board: live listings, newest first.
pub async fn handle_list_jobs(
    State(state): State<AppState>,
) -> Result<Json<JobListResponse>, AppError> {
    let jobs = state.gateway.list_published_jobs().await?;
    Ok(Json(JobListResponse { jobs }))
}

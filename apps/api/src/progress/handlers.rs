//! Axum route handlers for the Progress API.
//!
//! Reads and writes here deliberately return 200 even when the gateway is
//! down: progress is decoration, and the client should never block on it.
//! `updated: false` tells callers a write did not land.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::progress::flags::{ProgressFlagSet, ProgressUpdate};
use crate::progress::sync::ProgressSync;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub flags: ProgressFlagSet,
}

#[derive(Debug, Deserialize)]
pub struct ProgressPatchRequest {
    pub user_id: Uuid,
    pub flags: ProgressUpdate,
}

#[derive(Debug, Deserialize)]
pub struct ProgressResetRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ProgressUpdateResponse {
    pub updated: bool,
    pub flags: ProgressFlagSet,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/progress?user_id=...
///
/// Returns the user's milestone flags, creating the backing row on first
/// contact. Infallible by design: gateway trouble yields the all-false set.
pub async fn handle_get_progress(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Json<ProgressResponse> {
    let mut sync = ProgressSync::new(Arc::clone(&state.gateway), params.user_id);
    sync.fetch().await;

    Json(ProgressResponse {
        flags: sync.flags().clone(),
    })
}

/// PATCH /api/v1/progress
///
/// Partial flag update. Unknown flag names are rejected with 400 at
/// deserialization; a write that cannot land reports `updated: false`
/// alongside the last known state.
pub async fn handle_update_progress(
    State(state): State<AppState>,
    Json(request): Json<ProgressPatchRequest>,
) -> Json<ProgressUpdateResponse> {
    let mut sync = ProgressSync::new(Arc::clone(&state.gateway), request.user_id);
    sync.fetch().await;
    let updated = sync.update_flags(request.flags).await;

    Json(ProgressUpdateResponse {
        updated,
        flags: sync.flags().clone(),
    })
}

/// POST /api/v1/progress/reset
///
/// Explicitly writes every flag back to false. Meant for testing and for
/// users who want to restart onboarding.
pub async fn handle_reset_progress(
    State(state): State<AppState>,
    Json(request): Json<ProgressResetRequest>,
) -> Json<ProgressUpdateResponse> {
    let mut sync = ProgressSync::new(Arc::clone(&state.gateway), request.user_id);
    let updated = sync.reset().await;

    Json(ProgressUpdateResponse {
        updated,
        flags: sync.flags().clone(),
    })
}

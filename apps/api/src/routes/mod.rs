pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::drafting::handlers as drafting;
use crate::generation::handlers as generation;
use crate::progress::handlers as progress;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Progress API
        .route(
            "/api/v1/progress",
            get(progress::handle_get_progress).patch(progress::handle_update_progress),
        )
        .route(
            "/api/v1/progress/reset",
            post(progress::handle_reset_progress),
        )
        // Generation API
        .route("/api/v1/drafts/generate", post(generation::handle_generate))
        // Editor API
        .route("/api/v1/drafts/editor", post(drafting::handle_start_editor))
        .route(
            "/api/v1/drafts/editor/:id",
            get(drafting::handle_get_session),
        )
        .route(
            "/api/v1/drafts/editor/:id/compile",
            get(drafting::handle_compile),
        )
        .route(
            "/api/v1/drafts/editor/:id/sections",
            post(drafting::handle_add_section),
        )
        .route(
            "/api/v1/drafts/editor/:id/sections/:sid",
            patch(drafting::handle_edit_section).delete(drafting::handle_remove_section),
        )
        .route(
            "/api/v1/drafts/editor/:id/sections/:sid/lock",
            patch(drafting::handle_lock_section),
        )
        .route(
            "/api/v1/drafts/editor/:id/sections/:sid/editing",
            post(drafting::handle_toggle_editing),
        )
        .route(
            "/api/v1/drafts/editor/:id/reorder",
            post(drafting::handle_reorder),
        )
        .route("/api/v1/drafts/editor/:id/save", post(drafting::handle_save))
        .route(
            "/api/v1/drafts/editor/:id/publish",
            post(drafting::handle_publish),
        )
        // Board reads
        .route("/api/v1/drafts", get(drafting::handle_list_drafts))
        .route("/api/v1/drafts/:id", get(drafting::handle_get_draft))
        .route("/api/v1/jobs", get(drafting::handle_list_jobs))
        .with_state(state)
}

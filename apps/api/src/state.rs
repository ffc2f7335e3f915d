use std::sync::Arc;

use crate::drafting::editor::EditorStore;
use crate::drafting::workflow::OpLocks;
use crate::gateway::Gateway;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable data gateway. Production: PgGateway over the Postgres pool.
    pub gateway: Arc<dyn Gateway>,
    pub llm: LlmClient,
    /// In-memory editor sessions, one per user.
    pub editor: EditorStore,
    /// Per-session save/publish locks.
    pub op_locks: OpLocks,
}

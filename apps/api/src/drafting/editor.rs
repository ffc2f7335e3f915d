//! Live editor sessions.
//!
//! A session is the server-side working copy of one draft being edited:
//! the section list, the persisted draft id once a save has landed, and
//! provenance. Sessions live in memory behind an `RwLock`; one session per
//! user, so starting a new draft evicts the previous one.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::drafting::sections::SectionList;

#[derive(Debug, Clone)]
pub struct EditorSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub sections: SectionList,
    /// Set after the first successful save; never cleared by failures.
    pub draft_id: Option<Uuid>,
    pub ai_generated: bool,
    pub created_at: DateTime<Utc>,
}

impl EditorSession {
    pub fn new(user_id: Uuid, sections: SectionList, ai_generated: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            sections,
            draft_id: None,
            ai_generated,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Default)]
pub struct EditorStore {
    sessions: Arc<RwLock<HashMap<Uuid, EditorSession>>>,
}

impl EditorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a session, evicting any other session owned by the same user.
    pub async fn insert(&self, session: EditorSession) {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, existing| existing.user_id != session.user_id);
        sessions.insert(session.id, session);
    }

    /// A point-in-time copy. Saves and publishes run on snapshots so slow
    /// gateway calls never hold the store lock.
    pub async fn snapshot(&self, session_id: Uuid) -> Option<EditorSession> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    /// Runs a closure on the live session under the write lock. Section
    /// mutations go through here so they are serialized per store.
    pub async fn mutate<R>(
        &self,
        session_id: Uuid,
        f: impl FnOnce(&mut EditorSession) -> R,
    ) -> Option<R> {
        let mut sessions = self.sessions.write().await;
        sessions.get_mut(&session_id).map(f)
    }

    /// Records the persisted draft id after a successful save.
    pub async fn set_draft_id(&self, session_id: Uuid, draft_id: Uuid) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(&session_id) {
            session.draft_id = Some(draft_id);
        }
    }
}

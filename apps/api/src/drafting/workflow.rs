//! Draft persistence workflow — save and publish.
//!
//! Flow: compile sections → derive title → metadata snapshot → upsert draft;
//! publish additionally: insert listing → mark draft ready → record milestone,
//! strictly in that order, each step awaited before the next. A failure
//! short-circuits the remaining steps, so a listing row can never exist
//! without its source draft and a draft is never marked ready unless the
//! listing insert landed.
//!
//! The per-session operation lock lives here, not in the UI: a second save
//! or publish for the same session is refused while one is in flight.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::drafting::catalogue::{self, SectionKind};
use crate::drafting::editor::{EditorSession, EditorStore};
use crate::drafting::sections::SectionList;
use crate::gateway::{Gateway, GatewayError};
use crate::models::draft::{DraftRecord, GenerationMetadata, JobRecord, SectionSnapshot};
use crate::progress::flags::MilestoneFlag;
use crate::progress::sync::ProgressSync;

/// Title stored when the title section holds nothing the user wrote.
const UNTITLED_TITLE: &str = "Untitled Job";

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("a save or publish is already running for session {0}")]
    Busy(Uuid),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

// ────────────────────────────────────────────────────────────────────────────
// Operation locks
// ────────────────────────────────────────────────────────────────────────────

/// At most one in-flight persistence operation per session. Claims are
/// RAII-released, so an early return on a gateway error frees the session.
#[derive(Clone, Default)]
pub struct OpLocks {
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
}

impl OpLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the session for one save or publish. None while another
    /// operation holds the claim.
    pub fn acquire(&self, session_id: Uuid) -> Option<OpGuard> {
        let mut in_flight = self.in_flight.lock().expect("op lock poisoned");
        if !in_flight.insert(session_id) {
            return None;
        }
        Some(OpGuard {
            in_flight: Arc::clone(&self.in_flight),
            session_id,
        })
    }
}

pub struct OpGuard {
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
    session_id: Uuid,
}

impl Drop for OpGuard {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .expect("op lock poisoned")
            .remove(&self.session_id);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Save
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct SaveOutcome {
    pub draft_id: Uuid,
    /// True when this save inserted the draft row rather than updating it.
    pub created: bool,
}

/// Compiles the session's sections and upserts the draft row: update when
/// the session already holds a draft id, insert otherwise. The held id is
/// never cleared, not even by a failed update.
pub async fn save(
    gateway: &Arc<dyn Gateway>,
    locks: &OpLocks,
    store: &EditorStore,
    mut session: EditorSession,
) -> Result<SaveOutcome, WorkflowError> {
    let _guard = locks
        .acquire(session.id)
        .ok_or(WorkflowError::Busy(session.id))?;
    adopt_live_draft_id(store, &mut session).await;

    Ok(persist(gateway.as_ref(), store, &mut session).await?)
}

/// Snapshots are taken before the lock is claimed, so one can predate a
/// concurrent operation's draft-id write-back. Once the lock is held the
/// live session's id wins; a held id never changes after the first save.
async fn adopt_live_draft_id(store: &EditorStore, session: &mut EditorSession) {
    if session.draft_id.is_none() {
        if let Some(live) = store.snapshot(session.id).await {
            session.draft_id = live.draft_id;
        }
    }
}

/// The lock-free save body, shared with `publish`.
async fn persist(
    gateway: &dyn Gateway,
    store: &EditorStore,
    session: &mut EditorSession,
) -> Result<SaveOutcome, GatewayError> {
    let record = draft_record(session);

    match session.draft_id {
        Some(draft_id) => {
            gateway
                .update_draft(session.user_id, draft_id, &record)
                .await?;
            info!("Updated draft {draft_id} for user {}", session.user_id);
            Ok(SaveOutcome {
                draft_id,
                created: false,
            })
        }
        None => {
            let draft_id = gateway.insert_draft(&record).await?;
            session.draft_id = Some(draft_id);
            store.set_draft_id(session.id, draft_id).await;
            info!("Created draft {draft_id} for user {}", session.user_id);
            Ok(SaveOutcome {
                draft_id,
                created: true,
            })
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Publish
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct PublishOutcome {
    pub job_id: Uuid,
    pub draft_id: Uuid,
    /// False when the listing went live but the milestone write was lost.
    pub milestone_recorded: bool,
}

/// Publishes the session as a live listing. Runs `save` first when no draft
/// id is held yet, so every listing traces back to a persisted draft.
pub async fn publish(
    gateway: &Arc<dyn Gateway>,
    locks: &OpLocks,
    store: &EditorStore,
    mut session: EditorSession,
) -> Result<PublishOutcome, WorkflowError> {
    let _guard = locks
        .acquire(session.id)
        .ok_or(WorkflowError::Busy(session.id))?;
    adopt_live_draft_id(store, &mut session).await;

    let draft_id = match session.draft_id {
        Some(draft_id) => draft_id,
        None => {
            persist(gateway.as_ref(), store, &mut session)
                .await?
                .draft_id
        }
    };

    let record = job_record(&session, draft_id);
    let job_id = gateway.insert_job(&record).await?;
    info!(
        "Published job {job_id} from draft {draft_id} for user {}",
        session.user_id
    );

    gateway.mark_draft_ready(session.user_id, draft_id).await?;

    let mut sync = ProgressSync::new(Arc::clone(gateway), session.user_id);
    let milestone_recorded = sync.update_flag(MilestoneFlag::HasPublishedJob, true).await;
    if !milestone_recorded {
        warn!(
            "Job {job_id} is live but the published-job milestone was not recorded for user {}",
            session.user_id
        );
    }

    Ok(PublishOutcome {
        job_id,
        draft_id,
        milestone_recorded,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Record builders
// ────────────────────────────────────────────────────────────────────────────

fn draft_record(session: &EditorSession) -> DraftRecord {
    DraftRecord {
        user_id: session.user_id,
        title: derive_title(&session.sections),
        content: session.sections.compile(),
        ai_generated: session.ai_generated,
        metadata: metadata_snapshot(&session.sections),
    }
}

fn job_record(session: &EditorSession, draft_id: Uuid) -> JobRecord {
    let sections = &session.sections;
    JobRecord {
        user_id: session.user_id,
        source_draft_id: draft_id,
        title: derive_title(sections),
        description: sections.compile(),
        organization_name: organization_name(sections),
        responsibilities: authored_content(sections, SectionKind::Responsibilities),
        qualifications: authored_content(sections, SectionKind::Qualifications),
        ai_generated: session.ai_generated,
        metadata: metadata_snapshot(sections),
    }
}

fn metadata_snapshot(sections: &SectionList) -> GenerationMetadata {
    let snapshots: Vec<SectionSnapshot> = sections
        .sections()
        .iter()
        .map(|s| SectionSnapshot {
            id: s.id,
            kind: s.kind,
            order: s.order,
        })
        .collect();

    GenerationMetadata::V1 {
        section_count: snapshots.len(),
        generated_at: Utc::now(),
        sections: snapshots,
    }
}

/// First line of the title section, or the untitled fallback.
pub(crate) fn derive_title(sections: &SectionList) -> String {
    first_line(&authored_content(sections, SectionKind::Title))
        .unwrap_or_else(|| UNTITLED_TITLE.to_string())
}

/// First line of the organization section; empty when nothing was written.
pub(crate) fn organization_name(sections: &SectionList) -> String {
    first_line(&authored_content(sections, SectionKind::Organization)).unwrap_or_default()
}

/// Section content with untouched catalogue placeholders treated as empty,
/// so instruction text never leaks into stored titles or listing fields.
fn authored_content(sections: &SectionList, kind: SectionKind) -> String {
    sections
        .by_kind(kind)
        .map(|s| s.content.trim())
        .filter(|content| !content.is_empty() && Some(*content) != catalogue::placeholder_for(kind))
        .map(str::to_string)
        .unwrap_or_default()
}

fn first_line(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::{Call, MockGateway};
    use crate::progress::flags::ProgressUpdate;

    fn gateway_pair(mock: MockGateway) -> (Arc<MockGateway>, Arc<dyn Gateway>) {
        let mock = Arc::new(mock);
        let gateway: Arc<dyn Gateway> = Arc::clone(&mock) as Arc<dyn Gateway>;
        (mock, gateway)
    }

    async fn stored_session(store: &EditorStore, user_id: Uuid) -> EditorSession {
        let session = EditorSession::new(user_id, SectionList::skeleton(), false);
        store.insert(session.clone()).await;
        session
    }

    fn set_section(session: &mut EditorSession, kind: SectionKind, content: &str) {
        let id = session
            .sections
            .by_kind(kind)
            .expect("known kind present")
            .id;
        session
            .sections
            .set_content(id, content.to_string())
            .expect("section is unlocked");
    }

    // ── save ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_first_save_inserts_and_stores_draft_id() {
        let (mock, gateway) = gateway_pair(MockGateway::new());
        let (locks, store) = (OpLocks::new(), EditorStore::new());
        let user_id = Uuid::new_v4();
        let session = stored_session(&store, user_id).await;

        let outcome = save(&gateway, &locks, &store, session.clone())
            .await
            .expect("save succeeds");

        assert!(outcome.created);
        assert_eq!(mock.calls(), vec![Call::InsertDraft(user_id)]);
        let snapshot = store.snapshot(session.id).await.expect("session stored");
        assert_eq!(
            snapshot.draft_id,
            Some(outcome.draft_id),
            "the returned id must be written back to the session"
        );
    }

    #[tokio::test]
    async fn test_resave_updates_existing_draft() {
        let (mock, gateway) = gateway_pair(MockGateway::new());
        let (locks, store) = (OpLocks::new(), EditorStore::new());
        let user_id = Uuid::new_v4();
        let mut session = stored_session(&store, user_id).await;
        let draft_id = Uuid::new_v4();
        session.draft_id = Some(draft_id);

        let outcome = save(&gateway, &locks, &store, session)
            .await
            .expect("save succeeds");

        assert!(!outcome.created);
        assert_eq!(outcome.draft_id, draft_id);
        assert_eq!(mock.calls(), vec![Call::UpdateDraft(user_id, draft_id)]);
    }

    #[tokio::test]
    async fn test_failed_save_never_clears_held_draft_id() {
        let (_, gateway) = gateway_pair(MockGateway {
            fail_update_draft: true,
            ..MockGateway::new()
        });
        let (locks, store) = (OpLocks::new(), EditorStore::new());
        let mut session = stored_session(&store, Uuid::new_v4()).await;
        let draft_id = Uuid::new_v4();
        session.draft_id = Some(draft_id);
        store.set_draft_id(session.id, draft_id).await;

        let result = save(&gateway, &locks, &store, session.clone()).await;

        assert!(matches!(result, Err(WorkflowError::Gateway(_))));
        let snapshot = store.snapshot(session.id).await.expect("session stored");
        assert_eq!(snapshot.draft_id, Some(draft_id), "id survives the failure");
    }

    #[tokio::test]
    async fn test_failed_insert_leaves_session_unsaved() {
        let (_, gateway) = gateway_pair(MockGateway {
            fail_insert_draft: true,
            ..MockGateway::new()
        });
        let (locks, store) = (OpLocks::new(), EditorStore::new());
        let session = stored_session(&store, Uuid::new_v4()).await;

        let result = save(&gateway, &locks, &store, session.clone()).await;

        assert!(result.is_err());
        let snapshot = store.snapshot(session.id).await.expect("session stored");
        assert_eq!(snapshot.draft_id, None);
    }

    #[tokio::test]
    async fn test_rapid_second_save_updates_instead_of_inserting() {
        let (mock, gateway) = gateway_pair(MockGateway::new());
        let (locks, store) = (OpLocks::new(), EditorStore::new());
        let user_id = Uuid::new_v4();
        let session = stored_session(&store, user_id).await;
        // Taken before the first save writes the draft id back.
        let stale = session.clone();

        let first = save(&gateway, &locks, &store, session)
            .await
            .expect("first save succeeds");
        let second = save(&gateway, &locks, &store, stale)
            .await
            .expect("second save succeeds");

        assert!(first.created);
        assert!(!second.created, "the live draft id must be adopted");
        assert_eq!(second.draft_id, first.draft_id);
        assert_eq!(
            mock.calls(),
            vec![
                Call::InsertDraft(user_id),
                Call::UpdateDraft(user_id, first.draft_id),
            ],
            "one session maps to exactly one draft row"
        );
    }

    // ── operation lock ──────────────────────────────────────────────────

    #[tokio::test]
    async fn test_second_operation_refused_while_first_in_flight() {
        let (mock, gateway) = gateway_pair(MockGateway::new());
        let (locks, store) = (OpLocks::new(), EditorStore::new());
        let session = stored_session(&store, Uuid::new_v4()).await;

        let guard = locks.acquire(session.id).expect("first claim succeeds");
        let result = save(&gateway, &locks, &store, session.clone()).await;

        assert!(matches!(result, Err(WorkflowError::Busy(id)) if id == session.id));
        assert!(mock.calls().is_empty(), "no gateway call behind the lock");

        drop(guard);
        save(&gateway, &locks, &store, session)
            .await
            .expect("lock released on drop");
    }

    #[tokio::test]
    async fn test_lock_released_after_failed_operation() {
        let (mock, gateway) = gateway_pair(MockGateway {
            fail_insert_draft: true,
            ..MockGateway::new()
        });
        let (locks, store) = (OpLocks::new(), EditorStore::new());
        let session = stored_session(&store, Uuid::new_v4()).await;

        assert!(save(&gateway, &locks, &store, session.clone()).await.is_err());
        assert_eq!(mock.calls().len(), 1);

        assert!(
            locks.acquire(session.id).is_some(),
            "a failed operation must not leak its claim"
        );
    }

    #[tokio::test]
    async fn test_locks_are_per_session() {
        let locks = OpLocks::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        let _held = locks.acquire(first).expect("claim first");
        assert!(
            locks.acquire(second).is_some(),
            "a claim on one session must not block another"
        );
    }

    // ── publish ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_publish_runs_steps_in_order() {
        let (mock, gateway) = gateway_pair(MockGateway::new());
        let (locks, store) = (OpLocks::new(), EditorStore::new());
        let user_id = Uuid::new_v4();
        let mut session = stored_session(&store, user_id).await;
        let draft_id = Uuid::new_v4();
        session.draft_id = Some(draft_id);

        let outcome = publish(&gateway, &locks, &store, session)
            .await
            .expect("publish succeeds");

        assert!(outcome.milestone_recorded);
        assert_eq!(outcome.draft_id, draft_id);
        let update = ProgressUpdate::single(MilestoneFlag::HasPublishedJob, true);
        assert_eq!(
            mock.calls(),
            vec![
                Call::InsertJob(user_id, draft_id),
                Call::MarkDraftReady(user_id, draft_id),
                Call::UserExists(user_id),
                Call::EnsureProgressRow(user_id),
                Call::UpdateProgress(user_id, update),
            ],
            "listing insert, then ready flip, then the milestone"
        );
    }

    #[tokio::test]
    async fn test_publish_without_draft_saves_first() {
        let (mock, gateway) = gateway_pair(MockGateway::new());
        let (locks, store) = (OpLocks::new(), EditorStore::new());
        let user_id = Uuid::new_v4();
        let session = stored_session(&store, user_id).await;

        let outcome = publish(&gateway, &locks, &store, session.clone())
            .await
            .expect("publish succeeds");

        let calls = mock.calls();
        assert_eq!(
            &calls[..2],
            &[
                Call::InsertDraft(user_id),
                Call::InsertJob(user_id, outcome.draft_id),
            ],
            "exactly one draft insert, then one job insert, in that order"
        );
        let snapshot = store.snapshot(session.id).await.expect("session stored");
        assert_eq!(
            snapshot.draft_id,
            Some(outcome.draft_id),
            "the implicit save must record its draft id"
        );
    }

    #[tokio::test]
    async fn test_stale_snapshot_publish_reuses_saved_draft() {
        let (mock, gateway) = gateway_pair(MockGateway::new());
        let (locks, store) = (OpLocks::new(), EditorStore::new());
        let user_id = Uuid::new_v4();
        let session = stored_session(&store, user_id).await;
        let stale = session.clone();

        let saved = save(&gateway, &locks, &store, session)
            .await
            .expect("save succeeds");
        let published = publish(&gateway, &locks, &store, stale)
            .await
            .expect("publish succeeds");

        assert_eq!(published.draft_id, saved.draft_id);
        let draft_inserts = mock
            .calls()
            .iter()
            .filter(|call| matches!(call, Call::InsertDraft(_)))
            .count();
        assert_eq!(draft_inserts, 1, "one logical draft, one draft row");
    }

    #[tokio::test]
    async fn test_failed_job_insert_short_circuits_ready_and_milestone() {
        let (mock, gateway) = gateway_pair(MockGateway {
            fail_insert_job: true,
            ..MockGateway::new()
        });
        let (locks, store) = (OpLocks::new(), EditorStore::new());
        let user_id = Uuid::new_v4();
        let mut session = stored_session(&store, user_id).await;
        let draft_id = Uuid::new_v4();
        session.draft_id = Some(draft_id);

        let result = publish(&gateway, &locks, &store, session).await;

        assert!(matches!(result, Err(WorkflowError::Gateway(_))));
        assert_eq!(
            mock.calls(),
            vec![Call::InsertJob(user_id, draft_id)],
            "neither the status flip nor the flag write may be attempted"
        );
    }

    #[tokio::test]
    async fn test_failed_ready_flip_skips_milestone() {
        let (mock, gateway) = gateway_pair(MockGateway {
            fail_mark_ready: true,
            ..MockGateway::new()
        });
        let (locks, store) = (OpLocks::new(), EditorStore::new());
        let user_id = Uuid::new_v4();
        let mut session = stored_session(&store, user_id).await;
        session.draft_id = Some(Uuid::new_v4());

        let result = publish(&gateway, &locks, &store, session).await;

        assert!(result.is_err());
        assert!(
            !mock
                .calls()
                .iter()
                .any(|call| matches!(call, Call::UpdateProgress(_, _))),
            "milestone writes only follow a confirmed publish"
        );
    }

    #[tokio::test]
    async fn test_lost_milestone_write_does_not_fail_publish() {
        let (_, gateway) = gateway_pair(MockGateway {
            fail_update_progress: true,
            ..MockGateway::new()
        });
        let (locks, store) = (OpLocks::new(), EditorStore::new());
        let mut session = stored_session(&store, Uuid::new_v4()).await;
        session.draft_id = Some(Uuid::new_v4());

        let outcome = publish(&gateway, &locks, &store, session)
            .await
            .expect("the listing is live regardless");

        assert!(!outcome.milestone_recorded);
    }

    // ── field extraction ────────────────────────────────────────────────

    #[test]
    fn test_title_derived_from_first_content_line() {
        let mut session = EditorSession::new(Uuid::new_v4(), SectionList::skeleton(), false);
        set_section(
            &mut session,
            SectionKind::Title,
            "  Emergency Response Coordinator  \nSouth Sudan",
        );

        assert_eq!(
            derive_title(&session.sections),
            "Emergency Response Coordinator"
        );
    }

    #[test]
    fn test_untouched_placeholder_falls_back_to_untitled() {
        let session = EditorSession::new(Uuid::new_v4(), SectionList::skeleton(), false);
        assert_eq!(derive_title(&session.sections), UNTITLED_TITLE);
    }

    #[test]
    fn test_organization_name_is_first_line_only() {
        let mut session = EditorSession::new(Uuid::new_v4(), SectionList::skeleton(), false);
        set_section(
            &mut session,
            SectionKind::Organization,
            "Relief Works International\n\nFounded in 1998, we operate in 14 countries.",
        );

        assert_eq!(
            organization_name(&session.sections),
            "Relief Works International"
        );
    }

    #[test]
    fn test_job_record_carries_structured_fields() {
        let mut session = EditorSession::new(Uuid::new_v4(), SectionList::skeleton(), true);
        set_section(&mut session, SectionKind::Title, "WASH Officer");
        set_section(&mut session, SectionKind::Responsibilities, "- Run the pumps");
        set_section(&mut session, SectionKind::Qualifications, "- 3 years in WASH");

        let draft_id = Uuid::new_v4();
        let record = job_record(&session, draft_id);

        assert_eq!(record.title, "WASH Officer");
        assert_eq!(record.source_draft_id, draft_id);
        assert_eq!(record.responsibilities, "- Run the pumps");
        assert_eq!(record.qualifications, "- 3 years in WASH");
        assert_eq!(
            record.organization_name, "",
            "untouched placeholder must not leak into the listing"
        );
        assert!(record.ai_generated);
        assert!(record.description.contains("## Job Title"));
    }

    #[test]
    fn test_metadata_snapshot_covers_every_section() {
        let mut session = EditorSession::new(Uuid::new_v4(), SectionList::skeleton(), false);
        session.sections.add_custom();

        let GenerationMetadata::V1 {
            section_count,
            sections,
            ..
        } = metadata_snapshot(&session.sections);

        assert_eq!(section_count, 13);
        assert_eq!(sections.len(), 13);
        assert!(sections.iter().any(|s| s.kind == SectionKind::Custom));
    }
}

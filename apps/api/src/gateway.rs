//! Data gateway — the one seam between the app and PostgreSQL.
//!
//! Every handler and workflow talks to `Arc<dyn Gateway>`, constructed once
//! at startup. Queries are scoped by the owning user id; callers never see
//! the pool directly. Tests swap in `mock::MockGateway` to assert call
//! ordering without a database.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::draft::{DraftRecord, JobDraftRow, JobRecord, JobRow};
use crate::progress::flags::{ProgressFlagSet, ProgressUpdate};

/// Wraps the driver error so callers depend on the gateway, not on sqlx.
#[derive(Debug, Error)]
#[error("database error: {0}")]
pub struct GatewayError(#[from] sqlx::Error);

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Persistence operations the application needs.
///
/// Carried in `AppState` as `Arc<dyn Gateway>`.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool, GatewayError>;

    /// Creates the progress row for a user if absent. Idempotent.
    async fn ensure_progress_row(&self, user_id: Uuid) -> Result<(), GatewayError>;

    async fn fetch_progress(&self, user_id: Uuid) -> Result<ProgressFlagSet, GatewayError>;

    /// Writes exactly the flags named in `update`; all other columns are
    /// left untouched. An empty update is a no-op.
    async fn update_progress(
        &self,
        user_id: Uuid,
        update: &ProgressUpdate,
    ) -> Result<(), GatewayError>;

    async fn insert_draft(&self, record: &DraftRecord) -> Result<Uuid, GatewayError>;

    async fn update_draft(
        &self,
        user_id: Uuid,
        draft_id: Uuid,
        record: &DraftRecord,
    ) -> Result<(), GatewayError>;

    /// Flips a draft to `ready` once a listing has been published from it.
    async fn mark_draft_ready(&self, user_id: Uuid, draft_id: Uuid) -> Result<(), GatewayError>;

    async fn insert_job(&self, record: &JobRecord) -> Result<Uuid, GatewayError>;

    async fn fetch_draft(
        &self,
        user_id: Uuid,
        draft_id: Uuid,
    ) -> Result<Option<JobDraftRow>, GatewayError>;

    async fn list_drafts(&self, user_id: Uuid) -> Result<Vec<JobDraftRow>, GatewayError>;

    async fn list_published_jobs(&self) -> Result<Vec<JobRow>, GatewayError>;
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL implementation
// ────────────────────────────────────────────────────────────────────────────

pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    /// Connects a pool and wraps it. The only place the app opens the database.
    pub async fn connect(database_url: &str) -> Result<Self, GatewayError> {
        info!("Connecting to PostgreSQL...");

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }
}

#[async_trait]
impl Gateway for PgGateway {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool, GatewayError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn ensure_progress_row(&self, user_id: Uuid) -> Result<(), GatewayError> {
        sqlx::query(ENSURE_PROGRESS_ROW_SQL)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fetch_progress(&self, user_id: Uuid) -> Result<ProgressFlagSet, GatewayError> {
        let flags = sqlx::query_as::<_, ProgressFlagSet>(
            r#"
            SELECT has_uploaded_cv, has_analyzed_cv, has_selected_job,
                   has_written_cover_letter, has_published_job, has_applied_to_job,
                   has_started_jd_draft, has_submitted_jd_inputs, has_generated_jd,
                   jd_generation_failed
            FROM user_progress_flags
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(flags)
    }

    async fn update_progress(
        &self,
        user_id: Uuid,
        update: &ProgressUpdate,
    ) -> Result<(), GatewayError> {
        let changed = update.changed();
        if changed.is_empty() {
            return Ok(());
        }

        let sql = progress_update_sql(update);
        let mut query = sqlx::query(&sql).bind(user_id);
        for (_, value) in changed {
            query = query.bind(value);
        }

        let result = query.execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        Ok(())
    }

    async fn insert_draft(&self, record: &DraftRecord) -> Result<Uuid, GatewayError> {
        let draft_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO job_drafts
                (id, user_id, title, content, status, ai_generated, generation_metadata, last_edited_at)
            VALUES ($1, $2, $3, $4, 'draft', $5, $6, now())
            "#,
        )
        .bind(draft_id)
        .bind(record.user_id)
        .bind(&record.title)
        .bind(&record.content)
        .bind(record.ai_generated)
        .bind(Json(&record.metadata))
        .execute(&self.pool)
        .await?;
        Ok(draft_id)
    }

    async fn update_draft(
        &self,
        user_id: Uuid,
        draft_id: Uuid,
        record: &DraftRecord,
    ) -> Result<(), GatewayError> {
        // Re-saving a ready draft moves it back to 'draft'; the published
        // listing made from it is untouched.
        let result = sqlx::query(
            r#"
            UPDATE job_drafts
            SET title = $3, content = $4, status = 'draft', ai_generated = $5,
                generation_metadata = $6, last_edited_at = now()
            WHERE id = $2 AND user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(draft_id)
        .bind(&record.title)
        .bind(&record.content)
        .bind(record.ai_generated)
        .bind(Json(&record.metadata))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        Ok(())
    }

    async fn mark_draft_ready(&self, user_id: Uuid, draft_id: Uuid) -> Result<(), GatewayError> {
        let result =
            sqlx::query("UPDATE job_drafts SET status = 'ready' WHERE id = $2 AND user_id = $1")
                .bind(user_id)
                .bind(draft_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound.into());
        }
        Ok(())
    }

    async fn insert_job(&self, record: &JobRecord) -> Result<Uuid, GatewayError> {
        let job_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO jobs
                (id, user_id, title, description, organization_name, responsibilities,
                 qualifications, status, source_draft_id, ai_generated, generation_metadata,
                 published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'published', $8, $9, $10, now())
            "#,
        )
        .bind(job_id)
        .bind(record.user_id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.organization_name)
        .bind(&record.responsibilities)
        .bind(&record.qualifications)
        .bind(record.source_draft_id)
        .bind(record.ai_generated)
        .bind(Json(&record.metadata))
        .execute(&self.pool)
        .await?;
        Ok(job_id)
    }

    async fn fetch_draft(
        &self,
        user_id: Uuid,
        draft_id: Uuid,
    ) -> Result<Option<JobDraftRow>, GatewayError> {
        let draft = sqlx::query_as::<_, JobDraftRow>(
            "SELECT * FROM job_drafts WHERE id = $2 AND user_id = $1",
        )
        .bind(user_id)
        .bind(draft_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(draft)
    }

    async fn list_drafts(&self, user_id: Uuid) -> Result<Vec<JobDraftRow>, GatewayError> {
        let drafts = sqlx::query_as::<_, JobDraftRow>(
            "SELECT * FROM job_drafts WHERE user_id = $1 ORDER BY last_edited_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(drafts)
    }

    async fn list_published_jobs(&self) -> Result<Vec<JobRow>, GatewayError> {
        let jobs = sqlx::query_as::<_, JobRow>(
            "SELECT * FROM jobs WHERE status = 'published' ORDER BY published_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SQL helpers
// ────────────────────────────────────────────────────────────────────────────

/// Insert-if-absent for a user's progress row. The conflict clause makes
/// repeat executions no-ops, so callers may ensure before every write.
pub(crate) const ENSURE_PROGRESS_ROW_SQL: &str =
    "INSERT INTO user_progress_flags (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING";

/// Builds the partial UPDATE for a flag set. Only columns named in the
/// update appear in SET, so concurrent writers to other flags are safe.
/// `$1` is the user id; values bind from `$2` in `changed()` order.
pub(crate) fn progress_update_sql(update: &ProgressUpdate) -> String {
    let mut sql = String::from("UPDATE user_progress_flags SET ");
    for (i, (flag, _)) in update.changed().iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push_str(flag.column());
        sql.push_str(&format!(" = ${}", i + 2));
    }
    sql.push_str(", updated_at = now() WHERE user_id = $1");
    sql
}

// ────────────────────────────────────────────────────────────────────────────
// Test double
// ────────────────────────────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::flags::MilestoneFlag;

    #[test]
    fn test_ensure_row_statement_is_insert_if_absent() {
        assert!(
            ENSURE_PROGRESS_ROW_SQL.contains("ON CONFLICT (user_id) DO NOTHING"),
            "a repeat ensure must neither error nor duplicate the row"
        );
    }

    #[test]
    fn test_update_sql_names_single_flag() {
        let update = ProgressUpdate::single(MilestoneFlag::HasGeneratedJd, true);
        assert_eq!(
            progress_update_sql(&update),
            "UPDATE user_progress_flags SET has_generated_jd = $2, updated_at = now() WHERE user_id = $1"
        );
    }

    #[test]
    fn test_update_sql_orders_placeholders_by_declaration() {
        let update = ProgressUpdate::default()
            .with(MilestoneFlag::HasGeneratedJd, true)
            .with(MilestoneFlag::HasUploadedCv, false);
        assert_eq!(
            progress_update_sql(&update),
            "UPDATE user_progress_flags SET has_uploaded_cv = $2, has_generated_jd = $3, \
             updated_at = now() WHERE user_id = $1"
        );
    }

    #[test]
    fn test_update_sql_covers_full_reset() {
        let sql = progress_update_sql(&ProgressUpdate::all_false());
        for flag in MilestoneFlag::ALL {
            assert!(
                sql.contains(flag.column()),
                "reset statement must name {}",
                flag.column()
            );
        }
        assert!(sql.ends_with("WHERE user_id = $1"));
    }
}

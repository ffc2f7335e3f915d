//! Milestone synchronizer — one user's flag state plus the remote row
//! behind it.
//!
//! Reads never fail: any gateway trouble degrades to the all-false default
//! so callers can always render something sensible. Writes report success
//! or failure as a bool and are logged, never thrown; the local mirror
//! only moves when the remote write landed.

use std::sync::Arc;

use tracing::{error, warn};
use uuid::Uuid;

use crate::gateway::Gateway;
use crate::progress::flags::{MilestoneFlag, ProgressFlagSet, ProgressUpdate};

pub struct ProgressSync {
    gateway: Arc<dyn Gateway>,
    user_id: Uuid,
    flags: ProgressFlagSet,
}

impl ProgressSync {
    pub fn new(gateway: Arc<dyn Gateway>, user_id: Uuid) -> Self {
        Self {
            gateway,
            user_id,
            flags: ProgressFlagSet::default(),
        }
    }

    /// The local mirror. All-false until the first successful fetch.
    pub fn flags(&self) -> &ProgressFlagSet {
        &self.flags
    }

    /// Guarantees a backing row exists, then loads it. Falls back to the
    /// all-false default on any failure rather than surfacing an error.
    pub async fn fetch(&mut self) -> &ProgressFlagSet {
        if !self.ensure_record().await {
            self.flags = ProgressFlagSet::default();
            return &self.flags;
        }

        match self.gateway.fetch_progress(self.user_id).await {
            Ok(flags) => self.flags = flags,
            Err(e) => {
                error!(
                    "Progress fetch failed for user {}: {e}; serving defaults",
                    self.user_id
                );
                self.flags = ProgressFlagSet::default();
            }
        }
        &self.flags
    }

    /// Lazily creates the progress row. Returns false (and logs) when the
    /// user row is missing or the insert fails; callers then skip writes.
    pub async fn ensure_record(&self) -> bool {
        match self.gateway.user_exists(self.user_id).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(
                    "No user row for {}; skipping progress record creation",
                    self.user_id
                );
                return false;
            }
            Err(e) => {
                error!("User lookup failed for {}: {e}", self.user_id);
                return false;
            }
        }

        match self.gateway.ensure_progress_row(self.user_id).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    "Could not ensure progress row for user {}: {e}",
                    self.user_id
                );
                false
            }
        }
    }

    /// Sets a single milestone. Returns true once the remote write landed.
    pub async fn update_flag(&mut self, flag: MilestoneFlag, value: bool) -> bool {
        self.update_flags(ProgressUpdate::single(flag, value)).await
    }

    /// Partial batch update. Sends exactly the named flags; the local
    /// mirror is only touched after the remote write succeeds.
    pub async fn update_flags(&mut self, update: ProgressUpdate) -> bool {
        if update.is_empty() {
            return true;
        }
        if !self.ensure_record().await {
            return false;
        }

        match self.gateway.update_progress(self.user_id, &update).await {
            Ok(()) => {
                self.flags.apply(&update);
                true
            }
            Err(e) => {
                error!("Progress update failed for user {}: {e}", self.user_id);
                false
            }
        }
    }

    /// Escape hatch: explicitly writes every flag back to false.
    pub async fn reset(&mut self) -> bool {
        self.update_flags(ProgressUpdate::all_false()).await
    }
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The fixed milestone vocabulary. One boolean column per variant in
/// `user_progress_flags`; the serde name doubles as the wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneFlag {
    HasUploadedCv,
    HasAnalyzedCv,
    HasSelectedJob,
    HasWrittenCoverLetter,
    HasPublishedJob,
    HasAppliedToJob,
    HasStartedJdDraft,
    HasSubmittedJdInputs,
    HasGeneratedJd,
    JdGenerationFailed,
}

impl MilestoneFlag {
    pub const ALL: [MilestoneFlag; 10] = [
        MilestoneFlag::HasUploadedCv,
        MilestoneFlag::HasAnalyzedCv,
        MilestoneFlag::HasSelectedJob,
        MilestoneFlag::HasWrittenCoverLetter,
        MilestoneFlag::HasPublishedJob,
        MilestoneFlag::HasAppliedToJob,
        MilestoneFlag::HasStartedJdDraft,
        MilestoneFlag::HasSubmittedJdInputs,
        MilestoneFlag::HasGeneratedJd,
        MilestoneFlag::JdGenerationFailed,
    ];

    /// Column name in `user_progress_flags`. Identical to the serde name.
    pub fn column(&self) -> &'static str {
        match self {
            MilestoneFlag::HasUploadedCv => "has_uploaded_cv",
            MilestoneFlag::HasAnalyzedCv => "has_analyzed_cv",
            MilestoneFlag::HasSelectedJob => "has_selected_job",
            MilestoneFlag::HasWrittenCoverLetter => "has_written_cover_letter",
            MilestoneFlag::HasPublishedJob => "has_published_job",
            MilestoneFlag::HasAppliedToJob => "has_applied_to_job",
            MilestoneFlag::HasStartedJdDraft => "has_started_jd_draft",
            MilestoneFlag::HasSubmittedJdInputs => "has_submitted_jd_inputs",
            MilestoneFlag::HasGeneratedJd => "has_generated_jd",
            MilestoneFlag::JdGenerationFailed => "jd_generation_failed",
        }
    }
}

/// The full flag set for one user. Defaults to all-false, which is also
/// what callers see when the backing row cannot be reached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ProgressFlagSet {
    pub has_uploaded_cv: bool,
    pub has_analyzed_cv: bool,
    pub has_selected_job: bool,
    pub has_written_cover_letter: bool,
    pub has_published_job: bool,
    pub has_applied_to_job: bool,
    pub has_started_jd_draft: bool,
    pub has_submitted_jd_inputs: bool,
    pub has_generated_jd: bool,
    pub jd_generation_failed: bool,
}

impl ProgressFlagSet {
    pub fn set(&mut self, flag: MilestoneFlag, value: bool) {
        match flag {
            MilestoneFlag::HasUploadedCv => self.has_uploaded_cv = value,
            MilestoneFlag::HasAnalyzedCv => self.has_analyzed_cv = value,
            MilestoneFlag::HasSelectedJob => self.has_selected_job = value,
            MilestoneFlag::HasWrittenCoverLetter => self.has_written_cover_letter = value,
            MilestoneFlag::HasPublishedJob => self.has_published_job = value,
            MilestoneFlag::HasAppliedToJob => self.has_applied_to_job = value,
            MilestoneFlag::HasStartedJdDraft => self.has_started_jd_draft = value,
            MilestoneFlag::HasSubmittedJdInputs => self.has_submitted_jd_inputs = value,
            MilestoneFlag::HasGeneratedJd => self.has_generated_jd = value,
            MilestoneFlag::JdGenerationFailed => self.jd_generation_failed = value,
        }
    }

    /// Applies a partial update to the local mirror. Only fields named in
    /// the update change; everything else keeps its current value.
    pub fn apply(&mut self, update: &ProgressUpdate) {
        for (flag, value) in update.changed() {
            self.set(flag, value);
        }
    }
}

/// A partial flag update. `None` fields are left untouched remotely, so a
/// single-flag update never clobbers milestones written by other features.
/// Unknown field names are rejected at the wire boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProgressUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_uploaded_cv: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_analyzed_cv: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_selected_job: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_written_cover_letter: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_published_job: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_applied_to_job: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_started_jd_draft: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_submitted_jd_inputs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_generated_jd: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jd_generation_failed: Option<bool>,
}

impl ProgressUpdate {
    /// An update naming exactly one flag.
    pub fn single(flag: MilestoneFlag, value: bool) -> Self {
        Self::default().with(flag, value)
    }

    /// Builder-style setter for multi-flag updates.
    pub fn with(mut self, flag: MilestoneFlag, value: bool) -> Self {
        let slot = match flag {
            MilestoneFlag::HasUploadedCv => &mut self.has_uploaded_cv,
            MilestoneFlag::HasAnalyzedCv => &mut self.has_analyzed_cv,
            MilestoneFlag::HasSelectedJob => &mut self.has_selected_job,
            MilestoneFlag::HasWrittenCoverLetter => &mut self.has_written_cover_letter,
            MilestoneFlag::HasPublishedJob => &mut self.has_published_job,
            MilestoneFlag::HasAppliedToJob => &mut self.has_applied_to_job,
            MilestoneFlag::HasStartedJdDraft => &mut self.has_started_jd_draft,
            MilestoneFlag::HasSubmittedJdInputs => &mut self.has_submitted_jd_inputs,
            MilestoneFlag::HasGeneratedJd => &mut self.has_generated_jd,
            MilestoneFlag::JdGenerationFailed => &mut self.jd_generation_failed,
        };
        *slot = Some(value);
        self
    }

    /// The reset escape hatch: every flag explicitly set to false.
    pub fn all_false() -> Self {
        let mut update = Self::default();
        for flag in MilestoneFlag::ALL {
            update = update.with(flag, false);
        }
        update
    }

    /// Named fields in declaration order. This is exactly the set of
    /// columns a remote update will touch.
    pub fn changed(&self) -> Vec<(MilestoneFlag, bool)> {
        let mut out = Vec::new();
        for flag in MilestoneFlag::ALL {
            if let Some(value) = self.value_of(flag) {
                out.push((flag, value));
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.changed().is_empty()
    }

    fn value_of(&self, flag: MilestoneFlag) -> Option<bool> {
        match flag {
            MilestoneFlag::HasUploadedCv => self.has_uploaded_cv,
            MilestoneFlag::HasAnalyzedCv => self.has_analyzed_cv,
            MilestoneFlag::HasSelectedJob => self.has_selected_job,
            MilestoneFlag::HasWrittenCoverLetter => self.has_written_cover_letter,
            MilestoneFlag::HasPublishedJob => self.has_published_job,
            MilestoneFlag::HasAppliedToJob => self.has_applied_to_job,
            MilestoneFlag::HasStartedJdDraft => self.has_started_jd_draft,
            MilestoneFlag::HasSubmittedJdInputs => self.has_submitted_jd_inputs,
            MilestoneFlag::HasGeneratedJd => self.has_generated_jd,
            MilestoneFlag::JdGenerationFailed => self.jd_generation_failed,
        }
    }
}

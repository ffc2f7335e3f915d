// User progress milestones.
// Tracks which onboarding steps a user has completed (CV upload, first
// generated draft, first published job, ...) so the client can adapt its UI.
// All reads degrade to the all-false default; writes are fire-and-report.

pub mod flags;
pub mod handlers;
pub mod sync;

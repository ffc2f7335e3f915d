//! Draft generation — one LLM call from poster inputs to an editor session.
//!
//! Flow: validate inputs → mark inputs milestone → build prompt →
//!       LLM call → record outcome flags → parse blob → open session.
//!
//! The LLM's answer is never trusted structurally: whatever comes back goes
//! through the same section parser as pasted text, so a malformed response
//! still yields an editable session. Generation failures leave the flags in
//! a state the client can read (`jd_generation_failed`) and the poster can
//! always continue by hand.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::drafting::editor::{EditorSession, EditorStore};
use crate::drafting::sections::SectionList;
use crate::errors::AppError;
use crate::gateway::Gateway;
use crate::generation::prompts::{JD_GENERATION_PROMPT_TEMPLATE, JD_GENERATION_SYSTEM};
use crate::llm_client::prompts::STRUCTURE_CONTRACT;
use crate::llm_client::LlmClient;
use crate::progress::flags::{MilestoneFlag, ProgressUpdate};
use crate::progress::sync::ProgressSync;

/// Stand-in for inputs the poster left blank.
const NONE_PROVIDED: &str = "(none provided)";

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Request body for draft generation. `brief` and `document_text` feed the
/// prompt directly; `organization_url` is passed to the model as employer
/// context. At least one of brief / document text must be present.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub user_id: Uuid,
    pub brief: Option<String>,
    pub organization_url: Option<String>,
    pub document_text: Option<String>,
}

/// A freshly generated draft: the session already inserted into the store,
/// plus the raw model output for clients that want to show it.
#[derive(Debug)]
pub struct GeneratedDraft {
    pub session: EditorSession,
    pub raw_text: String,
}

impl GenerateRequest {
    /// Input checks that run before any remote call. Violations are client
    /// errors and are never retried.
    pub fn validate(&self) -> Result<(), AppError> {
        if provided(self.brief.as_deref()).is_none()
            && provided(self.document_text.as_deref()).is_none()
        {
            return Err(AppError::Validation(
                "Provide a brief or a source document to generate from".to_string(),
            ));
        }

        if let Some(raw) = provided(self.organization_url.as_deref()) {
            let url = reqwest::Url::parse(raw).map_err(|_| {
                AppError::Validation(format!("organization_url is not a valid URL: {raw}"))
            })?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(AppError::Validation(
                    "organization_url must use http or https".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Trims an optional input and drops it entirely when blank.
fn provided(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Generation pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Runs the full generation pipeline and opens an editor session on success.
///
/// Steps:
/// 1. validate() — reject before anything leaves the process
/// 2. mark `has_submitted_jd_inputs` (best-effort)
/// 3. build the prompt from the structure contract and the poster's inputs
/// 4. LLM call (retry/backoff inside llm_client)
///    - on failure: set `jd_generation_failed`, answer 503 retryable
/// 5. on success: `{has_generated_jd: true, jd_generation_failed: false}`
///    in one batch, parse the blob, insert a session flagged ai_generated
pub async fn generate_draft(
    gateway: &Arc<dyn Gateway>,
    llm: &LlmClient,
    store: &EditorStore,
    request: GenerateRequest,
) -> Result<GeneratedDraft, AppError> {
    request.validate()?;

    info!("Generating draft for user {}", request.user_id);

    // The poster has committed inputs whether or not the model answers.
    let mut sync = ProgressSync::new(Arc::clone(gateway), request.user_id);
    sync.update_flag(MilestoneFlag::HasSubmittedJdInputs, true)
        .await;

    let prompt = build_generation_prompt(&request);

    let raw_text = match llm.call_text(&prompt, JD_GENERATION_SYSTEM).await {
        Ok(text) => text,
        Err(e) => {
            warn!(
                "Draft generation failed for user {}: {e}; recording failure flag",
                request.user_id
            );
            sync.update_flag(MilestoneFlag::JdGenerationFailed, true)
                .await;
            return Err(AppError::AssistantUnavailable(e.to_string()));
        }
    };

    // One batch write so the success and the cleared failure land together.
    sync.update_flags(
        ProgressUpdate::single(MilestoneFlag::HasGeneratedJd, true)
            .with(MilestoneFlag::JdGenerationFailed, false),
    )
    .await;

    let sections = SectionList::parse(&raw_text);
    let session = EditorSession::new(request.user_id, sections, true);
    let snapshot = session.clone();
    store.insert(session).await;

    info!(
        "Generated draft session {} with {} sections for user {}",
        snapshot.id,
        snapshot.sections.sections().len(),
        snapshot.user_id
    );

    Ok(GeneratedDraft {
        session: snapshot,
        raw_text,
    })
}

/// Builds the generation prompt by filling the template with the poster's
/// inputs. Blank inputs are marked rather than omitted so the model never
/// sees a dangling header.
fn build_generation_prompt(request: &GenerateRequest) -> String {
    let brief = provided(request.brief.as_deref()).unwrap_or(NONE_PROVIDED);
    let organization = provided(request.organization_url.as_deref()).unwrap_or(NONE_PROVIDED);
    let document = provided(request.document_text.as_deref()).unwrap_or(NONE_PROVIDED);

    JD_GENERATION_PROMPT_TEMPLATE
        .replace("{structure_contract}", STRUCTURE_CONTRACT)
        .replace("{brief}", brief)
        .replace("{organization_context}", organization)
        .replace("{document}", document)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_brief(brief: &str) -> GenerateRequest {
        GenerateRequest {
            user_id: Uuid::new_v4(),
            brief: Some(brief.to_string()),
            organization_url: None,
            document_text: None,
        }
    }

    #[test]
    fn test_validate_requires_brief_or_document() {
        let request = GenerateRequest {
            user_id: Uuid::new_v4(),
            brief: Some("   ".to_string()),
            organization_url: None,
            document_text: None,
        };

        assert!(matches!(
            request.validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_accepts_document_only() {
        let request = GenerateRequest {
            user_id: Uuid::new_v4(),
            brief: None,
            organization_url: None,
            document_text: Some("Existing JD text to rewrite".to_string()),
        };

        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unparseable_url() {
        let mut request = request_with_brief("WASH officer, Jordan");
        request.organization_url = Some("not a url".to_string());

        assert!(matches!(
            request.validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_non_http_scheme() {
        let mut request = request_with_brief("WASH officer, Jordan");
        request.organization_url = Some("ftp://example.org".to_string());

        assert!(matches!(
            request.validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_accepts_https_url() {
        let mut request = request_with_brief("WASH officer, Jordan");
        request.organization_url = Some("https://example.org/about".to_string());

        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_build_prompt_contains_contract_and_inputs() {
        let request = request_with_brief("We need a WASH officer for our Jordan office");

        let prompt = build_generation_prompt(&request);

        assert!(prompt.contains("## Job Title"));
        assert!(prompt.contains("## About the Organization"));
        assert!(prompt.contains("We need a WASH officer for our Jordan office"));
    }

    #[test]
    fn test_build_prompt_marks_missing_inputs() {
        let request = request_with_brief("Logistics coordinator");

        let prompt = build_generation_prompt(&request);

        // Brief present; organization and document blank.
        assert_eq!(prompt.matches(NONE_PROVIDED).count(), 2);
    }

    #[test]
    fn test_generate_request_deserializes_with_optional_fields() {
        let json = serde_json::json!({
            "user_id": Uuid::new_v4(),
            "brief": "Emergency response team lead"
        });
        let request: GenerateRequest = serde_json::from_value(json).unwrap();

        assert!(request.brief.is_some());
        assert!(request.organization_url.is_none());
        assert!(request.document_text.is_none());
    }
}

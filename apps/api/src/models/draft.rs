use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::drafting::catalogue::SectionKind;

/// A job draft as stored in `job_drafts`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobDraftRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub status: String,
    pub ai_generated: bool,
    pub generation_metadata: Option<Value>,
    pub last_edited_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A published listing as stored in `jobs`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub organization_name: String,
    pub responsibilities: String,
    pub qualifications: String,
    pub status: String,
    pub source_draft_id: Uuid,
    pub ai_generated: bool,
    pub generation_metadata: Option<Value>,
    pub published_at: DateTime<Utc>,
}

/// Write payload for inserting or updating a draft row.
#[derive(Debug, Clone)]
pub struct DraftRecord {
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub ai_generated: bool,
    pub metadata: GenerationMetadata,
}

/// Write payload for publishing a listing.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub user_id: Uuid,
    pub source_draft_id: Uuid,
    pub title: String,
    pub description: String,
    pub organization_name: String,
    pub responsibilities: String,
    pub qualifications: String,
    pub ai_generated: bool,
    pub metadata: GenerationMetadata,
}

/// Provenance metadata persisted alongside drafts and listings.
///
/// Versioned and tagged so old rows keep decoding after the shape evolves.
/// New shapes get a new variant; nothing edits `V1` in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "version", rename_all = "snake_case")]
pub enum GenerationMetadata {
    V1 {
        section_count: usize,
        generated_at: DateTime<Utc>,
        sections: Vec<SectionSnapshot>,
    },
}

/// Per-section provenance captured at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSnapshot {
    pub id: Uuid,
    pub kind: SectionKind,
    pub order: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_serializes_with_version_tag() {
        let metadata = GenerationMetadata::V1 {
            section_count: 2,
            generated_at: Utc::now(),
            sections: vec![
                SectionSnapshot {
                    id: Uuid::new_v4(),
                    kind: SectionKind::Title,
                    order: 0,
                },
                SectionSnapshot {
                    id: Uuid::new_v4(),
                    kind: SectionKind::Custom,
                    order: 1,
                },
            ],
        };

        let value = serde_json::to_value(&metadata).expect("metadata should serialize");
        assert_eq!(value["version"], "v1");
        assert_eq!(value["section_count"], 2);
        assert_eq!(value["sections"][0]["kind"], "title");
        assert_eq!(value["sections"][1]["kind"], "custom");
    }

    #[test]
    fn test_metadata_round_trips() {
        let metadata = GenerationMetadata::V1 {
            section_count: 1,
            generated_at: Utc::now(),
            sections: vec![SectionSnapshot {
                id: Uuid::new_v4(),
                kind: SectionKind::Overview,
                order: 0,
            }],
        };

        let json = serde_json::to_string(&metadata).expect("serialize");
        let decoded: GenerationMetadata = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded, metadata);
    }

    #[test]
    fn test_metadata_rejects_unknown_version() {
        let json = r#"{"version":"v9","section_count":0,"generated_at":"2025-01-01T00:00:00Z","sections":[]}"#;
        let result: Result<GenerationMetadata, _> = serde_json::from_str(json);
        assert!(result.is_err(), "unknown version tag must not decode");
    }
}

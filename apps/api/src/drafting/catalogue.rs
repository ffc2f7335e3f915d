//! The fixed section vocabulary for job-description drafts.
//!
//! Twelve known kinds cover the shape of a humanitarian-sector listing;
//! anything the matcher cannot place becomes `Custom`. Catalogue order is
//! the default display order; custom sections always sort after it.

use serde::{Deserialize, Serialize};

/// Section type tag. Known kinds are unique per draft; `Custom` may repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionKind {
    Title,
    Overview,
    Sdgs,
    Sectors,
    Dei,
    Summary,
    Responsibilities,
    Qualifications,
    Experience,
    Contract,
    HowToApply,
    Organization,
    Custom,
}

impl SectionKind {
    pub fn is_custom(&self) -> bool {
        matches!(self, SectionKind::Custom)
    }
}

/// One catalogue row: canonical title, default order, recognition keywords,
/// placeholder content, and the icon tag the client renders.
pub struct CatalogueEntry {
    pub kind: SectionKind,
    pub title: &'static str,
    pub order: i32,
    pub keywords: &'static [&'static str],
    pub placeholder: &'static str,
    pub icon: &'static str,
}

pub const CATALOGUE: [CatalogueEntry; 12] = [
    CatalogueEntry {
        kind: SectionKind::Title,
        title: "Job Title",
        order: 0,
        keywords: &["job title", "position title", "role title"],
        placeholder: "Add the job title here",
        icon: "briefcase",
    },
    CatalogueEntry {
        kind: SectionKind::Overview,
        title: "Overview",
        order: 1,
        keywords: &["overview", "about the role", "about this role"],
        placeholder: "Describe the role in one or two paragraphs",
        icon: "file-text",
    },
    CatalogueEntry {
        kind: SectionKind::Sdgs,
        title: "SDGs",
        order: 2,
        keywords: &["sdg", "sustainable development"],
        placeholder: "List the Sustainable Development Goals this role advances",
        icon: "globe",
    },
    CatalogueEntry {
        kind: SectionKind::Sectors,
        title: "Sectors",
        order: 3,
        keywords: &["sector", "thematic", "focus area"],
        placeholder: "List the sectors or thematic areas this role works in",
        icon: "layers",
    },
    CatalogueEntry {
        kind: SectionKind::Dei,
        title: "DEI Statement",
        order: 4,
        keywords: &["diversity", "equity", "inclusion", "dei"],
        placeholder: "Add your organization's diversity, equity and inclusion statement",
        icon: "users",
    },
    CatalogueEntry {
        kind: SectionKind::Summary,
        title: "Summary",
        order: 5,
        keywords: &["summary", "role purpose", "purpose of the role"],
        placeholder: "Summarize the role in a few sentences",
        icon: "align-left",
    },
    CatalogueEntry {
        kind: SectionKind::Responsibilities,
        title: "Responsibilities",
        order: 6,
        keywords: &["respons", "duties", "what you will do", "what you'll do", "key tasks"],
        placeholder: "List the key responsibilities of the role",
        icon: "check-square",
    },
    CatalogueEntry {
        kind: SectionKind::Qualifications,
        title: "Qualifications",
        order: 7,
        keywords: &["qualif", "requirement", "skills", "what you bring"],
        placeholder: "List the required qualifications and skills",
        icon: "award",
    },
    CatalogueEntry {
        kind: SectionKind::Experience,
        title: "Experience",
        order: 8,
        keywords: &["experience", "background"],
        placeholder: "Describe the experience level expected for this role",
        icon: "trending-up",
    },
    CatalogueEntry {
        kind: SectionKind::Contract,
        title: "Contract Details",
        order: 9,
        keywords: &["contract", "salary", "compensation", "employment type", "duration"],
        placeholder: "Add contract type, duration, salary range and location",
        icon: "file-signature",
    },
    CatalogueEntry {
        kind: SectionKind::HowToApply,
        title: "How to Apply",
        order: 10,
        keywords: &["how to apply", "application process", "apply"],
        placeholder: "Explain how candidates should apply",
        icon: "send",
    },
    CatalogueEntry {
        kind: SectionKind::Organization,
        title: "About the Organization",
        order: 11,
        keywords: &["organization", "organisation", "about us", "who we are"],
        placeholder: "Introduce your organization and its mission",
        icon: "home",
    },
];

/// Catalogue placeholder for a known kind. None for custom.
pub fn placeholder_for(kind: SectionKind) -> Option<&'static str> {
    CATALOGUE
        .iter()
        .find(|entry| entry.kind == kind)
        .map(|entry| entry.placeholder)
}

/// Fuzzy-matches a parsed heading against the catalogue. Substring test in
/// both directions on the canonical title, plus per-kind keywords. First
/// catalogue entry that matches wins; no match means a custom section.
pub fn match_heading(heading: &str) -> Option<&'static CatalogueEntry> {
    let needle = heading.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    CATALOGUE.iter().find(|entry| {
        let canonical = entry.title.to_lowercase();
        needle.contains(&canonical)
            || canonical.contains(&needle)
            || entry.keywords.iter().any(|keyword| needle.contains(keyword))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_orders_are_contiguous() {
        for (i, entry) in CATALOGUE.iter().enumerate() {
            assert_eq!(entry.order, i as i32, "catalogue order must be 0..=11");
        }
    }

    #[test]
    fn test_catalogue_kinds_are_unique_and_never_custom() {
        for (i, entry) in CATALOGUE.iter().enumerate() {
            assert!(!entry.kind.is_custom());
            for other in &CATALOGUE[i + 1..] {
                assert_ne!(entry.kind, other.kind);
            }
        }
    }

    #[test]
    fn test_exact_canonical_titles_match() {
        for entry in &CATALOGUE {
            let matched = match_heading(entry.title).expect("canonical title must match");
            assert_eq!(matched.kind, entry.kind);
        }
    }

    #[test]
    fn test_common_heading_variants_match() {
        let cases = [
            ("Key Responsibilities", SectionKind::Responsibilities),
            ("What You'll Do", SectionKind::Responsibilities),
            ("Requirements", SectionKind::Qualifications),
            ("Compensation & Benefits", SectionKind::Contract),
            ("Who We Are", SectionKind::Organization),
            ("About the Organisation", SectionKind::Organization),
            ("Sustainable Development Goals", SectionKind::Sdgs),
            ("Diversity, Equity & Inclusion", SectionKind::Dei),
            ("Thematic Areas", SectionKind::Sectors),
            ("Role Overview", SectionKind::Overview),
            ("Application Process", SectionKind::HowToApply),
            ("Experience Required", SectionKind::Experience),
        ];
        for (heading, expected) in cases {
            let matched = match_heading(heading)
                .unwrap_or_else(|| panic!("'{heading}' should match the catalogue"));
            assert_eq!(matched.kind, expected, "heading '{heading}'");
        }
    }

    #[test]
    fn test_truncated_heading_matches_via_reverse_containment() {
        // "Sector" is a prefix of the canonical "Sectors".
        let matched = match_heading("Sector").expect("truncated title should match");
        assert_eq!(matched.kind, SectionKind::Sectors);
    }

    #[test]
    fn test_unrecognized_headings_do_not_match() {
        assert!(match_heading("Benefits").is_none());
        assert!(match_heading("Our Values").is_none());
        assert!(match_heading("").is_none());
        assert!(match_heading("   ").is_none());
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let matched = match_heading("HOW TO APPLY").expect("case must not matter");
        assert_eq!(matched.kind, SectionKind::HowToApply);
    }

    #[test]
    fn test_placeholder_lookup_covers_known_kinds_only() {
        for entry in &CATALOGUE {
            assert_eq!(placeholder_for(entry.kind), Some(entry.placeholder));
        }
        assert_eq!(placeholder_for(SectionKind::Custom), None);
    }
}

#![allow(dead_code)]

// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces markdown-only output.
pub const MARKDOWN_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with plain markdown only. \
    Do NOT wrap the response in code fences. \
    Do NOT include any preamble, commentary or apologies.";

/// The section structure every generated job description must follow.
/// Spliced into generation prompts as `{structure_contract}`; the drafting
/// parser recognizes exactly these headings, so renaming one here without
/// updating the section catalogue breaks the round-trip.
pub const STRUCTURE_CONTRACT: &str = "\
Structure the job description as markdown using EXACTLY these `##` headings, in this order:

## Job Title
A single line containing only the title of the role.

## Overview
One or two paragraphs describing the role and why it matters.

## SDGs
The UN Sustainable Development Goals this role advances.

## Sectors
The humanitarian or development sectors and thematic areas the role works in.

## DEI Statement
The organization's diversity, equity and inclusion commitment.

## Summary
A few sentences summarizing the role for a listing page.

## Responsibilities
A bulleted list of the key responsibilities.

## Qualifications
A bulleted list of the required qualifications and skills.

## Experience
The experience level and background expected for the role.

## Contract Details
Contract type, duration, salary range and location.

## How to Apply
How candidates should apply, including any deadline.

## About the Organization
The organization and its mission.

Do NOT add, rename, reorder or omit headings. Do NOT nest headings deeper than `##`.";

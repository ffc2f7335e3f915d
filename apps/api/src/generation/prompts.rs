// All LLM prompt constants for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for job description generation — enforces markdown-only output.
pub const JD_GENERATION_SYSTEM: &str =
    "You are an expert recruitment writer for humanitarian and development \
    organizations. You write clear, inclusive, candidate-friendly job \
    descriptions. You MUST respond with plain markdown only. \
    Do NOT wrap the response in code fences. \
    Do NOT include any preamble, commentary or apologies.";

/// Job description generation prompt template.
/// Replace: {structure_contract}, {brief}, {organization_context}, {document}
pub const JD_GENERATION_PROMPT_TEMPLATE: &str = r#"Write a complete job description for a role in the humanitarian / development sector.

{structure_contract}

HIRING BRIEF (what the poster told us about the role):
{brief}

ORGANIZATION WEBSITE (context about the employer, if provided):
{organization_context}

SOURCE DOCUMENT (an existing description to rewrite, if provided):
{document}

HARD RULES:
1. Ground every section in the brief and source document — do NOT invent salary figures, deadlines or benefits that were not given
2. Where the inputs say nothing about a section, write one short neutral sentence the poster can replace
3. Use inclusive, plain language — expand acronyms on first use
4. Bulleted sections use `-` bullets, one point per line
5. Keep the whole description under 900 words"#;

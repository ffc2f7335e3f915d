// AI-assisted draft generation: poster inputs → one LLM call → editor session.
// All LLM calls go through llm_client — no direct Anthropic SDK calls here.

pub mod generator;
pub mod handlers;
pub mod prompts;

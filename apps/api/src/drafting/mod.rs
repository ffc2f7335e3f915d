// Job-description drafting.
// Implements: the section catalogue, markdown blob <-> section parsing and
// compilation, the live editor store, and the save/publish workflow.
// All persistence goes through the data gateway — no direct pool access here.

pub mod catalogue;
pub mod editor;
pub mod handlers;
pub mod sections;
pub mod workflow;

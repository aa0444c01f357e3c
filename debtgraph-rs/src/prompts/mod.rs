//! Prompt templates for LLM interactions.
//!
//! Prompts are stored as Rust string literals and rendered with `format!`.

pub mod extract_episode;

//! Shared utilities.
//!
//! Includes:
//! - Date/time helpers (flexible dataset parsing, Cypher timestamp formatting)
//! - String helpers (display-name normalisation, Cypher label checks, LLM JSON extraction)

pub mod datetime;
pub mod text;

pub use datetime::{format_neo4j_datetime, parse_flexible_datetime};
pub use text::{cypher_label, extract_json_from_response, normalize_whitespace, truncate_with_ellipsis};

//! Text helpers for display names, Cypher labels and LLM output.

use regex::Regex;
use std::sync::OnceLock;

static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();
static LABEL_RE: OnceLock<Regex> = OnceLock::new();

fn whitespace_re() -> &'static Regex {
    WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("static regex is valid"))
}

fn label_re() -> &'static Regex {
    LABEL_RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("static regex is valid"))
}

/// Collapse runs of whitespace into a single space and trim both ends.
pub fn normalize_whitespace(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    whitespace_re().replace_all(s, " ").trim().to_string()
}

/// Truncate `s` to at most `max_len` characters, ending in `"..."` when cut.
///
/// Counts `char`s, not bytes, so multi-byte names never split mid-character.
pub fn truncate_with_ellipsis(s: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return ".".repeat(max_len);
    }

    let byte_offset = s
        .char_indices()
        .nth(max_len - 3)
        .map(|(i, _)| i)
        .unwrap_or(s.len());

    format!("{}...", &s[..byte_offset])
}

/// Return `label` if it can be spliced into Cypher as a node label or
/// relationship type, `None` otherwise.
///
/// Cypher cannot parameterise labels, so anything reaching a query string
/// must pass this check first.
pub fn cypher_label(label: &str) -> Option<&str> {
    label_re().is_match(label).then_some(label)
}

/// Extract the first JSON object or array from an LLM response that may be
/// wrapped in markdown fences or surrounded by prose.
pub fn extract_json_from_response(s: &str) -> Option<&str> {
    if let Some(inner) = extract_fenced_block(s, "```json") {
        return Some(inner);
    }
    if let Some(inner) = extract_fenced_block(s, "```") {
        return Some(inner);
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (s.find(open), s.rfind(close)) {
            if end > start {
                return Some(&s[start..=end]);
            }
        }
    }

    None
}

fn extract_fenced_block<'a>(s: &'a str, fence: &str) -> Option<&'a str> {
    let start = s.find(fence)? + fence.len();
    let content_start = start + s[start..].find('\n')? + 1;
    let close = s[content_start..].find("```")?;
    let content = s[content_start..content_start + close].trim();

    (!content.is_empty()).then_some(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace_collapses_runs() {
        assert_eq!(normalize_whitespace("  María \t González\n"), "María González");
        assert_eq!(normalize_whitespace("   "), "");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn test_truncate_keeps_short_strings() {
        assert_eq!(truncate_with_ellipsis("Ana", 10), "Ana");
        assert_eq!(truncate_with_ellipsis("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_cuts_on_char_boundary() {
        assert_eq!(truncate_with_ellipsis("hello world", 8), "hello...");
        assert_eq!(truncate_with_ellipsis("ñandú ñandú", 6), "ñan...");
        assert_eq!(truncate_with_ellipsis("hello", 2), "..");
        assert_eq!(truncate_with_ellipsis("hello", 0), "");
    }

    #[test]
    fn test_cypher_label_accepts_domain_labels() {
        assert_eq!(cypher_label("CLIENTE"), Some("CLIENTE"));
        assert_eq!(cypher_label("PLAN_PAGO"), Some("PLAN_PAGO"));
        assert_eq!(cypher_label("RENEWS_PLAN"), Some("RENEWS_PLAN"));
    }

    #[test]
    fn test_cypher_label_rejects_injection() {
        assert_eq!(cypher_label("CLIENTE) DETACH DELETE (n"), None);
        assert_eq!(cypher_label("1ABC"), None);
        assert_eq!(cypher_label(""), None);
        assert_eq!(cypher_label("Nuevo Plan"), None);
    }

    #[test]
    fn test_extract_json_fenced() {
        let s = "Result:\n```json\n{\"entities\": []}\n```\nDone.";
        assert_eq!(extract_json_from_response(s), Some("{\"entities\": []}"));
    }

    #[test]
    fn test_extract_json_bare() {
        assert_eq!(
            extract_json_from_response("The answer is {\"a\": {\"b\": 1}} ok"),
            Some("{\"a\": {\"b\": 1}}")
        );
        assert_eq!(extract_json_from_response("Items: [1, 2]"), Some("[1, 2]"));
    }

    #[test]
    fn test_extract_json_none() {
        assert_eq!(extract_json_from_response("no json here"), None);
        assert_eq!(extract_json_from_response("```json\n\n```"), None);
    }
}

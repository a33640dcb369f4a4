//! Recovery of structured report drafts from free-form model output.
//!
//! Model responses are supposed to be a bare JSON object but routinely arrive wrapped in
//! prose, inside fenced code blocks, or with stray backslashes that break JSON string
//! escaping. Recovery runs an ordered cascade of strategies; the first one that yields a
//! JSON object wins:
//!
//! 1. the trimmed text parsed as-is
//! 2. the first fenced code block (optionally tagged `json`) parsed as-is
//! 3. that fenced block with escape repair applied
//! 4. the span from the first `{` to the last `}`, strict then with escape repair
//! 5. escape repair over the whole text, then the brace span of the result
//!
//! When every strategy fails the caller receives a fallback draft that explains the failure
//! and carries a prefix of the raw text, so no response is ever silently dropped.

use crate::constants::{FALLBACK_RAW_PREFIX_CHARS, TRUNCATION_MARKER};
use crate::report::{ReportDraft, Section};
use regex::Regex;
use std::sync::LazyLock;

const FALLBACK_SUMMARY: &str = "Error: Could not parse research results";
const FALLBACK_ERROR_TITLE: &str = "Error";
const FALLBACK_ERROR_CONTENT: &str =
    "There was an error processing the research results. Please try again.";
const FALLBACK_RAW_TITLE: &str = "Raw Response";

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("valid fenced block regex")
});

type Strategy = fn(&str) -> Option<ReportDraft>;

/// Recovery strategies in the order they are attempted.
///
/// `global_repair` never recovers more than `brace_span`: repair only inserts backslashes and
/// never pairs across a `{`, so the repaired brace span of the whole text equals the repaired
/// span itself. It is kept as the last resort of the cascade.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("direct", parse_direct),
    ("fenced", parse_fenced),
    ("fenced_repaired", parse_fenced_repaired),
    ("brace_span", parse_brace_span),
    ("global_repair", parse_global_repair),
];

/// Outcome of normalizing one model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// False when every strategy failed and `draft` is the fallback.
    pub success: bool,
    /// Name of the strategy that produced the draft, if any.
    pub strategy: Option<&'static str>,
    pub draft: ReportDraft,
}

/// Attempts every recovery strategy in order, returning the first draft recovered together
/// with the name of the strategy that produced it.
pub fn parse_report(raw: &str) -> Option<(&'static str, ReportDraft)> {
    STRATEGIES.iter().find_map(|(name, strategy)| {
        let draft = strategy(raw);
        if draft.is_none() {
            tracing::warn!("report recovery strategy '{}' did not match", name);
        }
        draft.map(|d| (*name, d))
    })
}

/// Normalizes raw model output into a draft, substituting the fallback on failure.
pub fn normalize(raw: &str) -> Normalized {
    match parse_report(raw) {
        Some((strategy, draft)) => Normalized {
            success: true,
            strategy: Some(strategy),
            draft,
        },
        None => {
            tracing::warn!(
                "could not recover a report from model output ({} chars), using fallback",
                raw.chars().count()
            );
            Normalized {
                success: false,
                strategy: None,
                draft: fallback_draft(raw),
            }
        }
    }
}

/// The draft used when no strategy can recover a report from `raw`.
pub fn fallback_draft(raw: &str) -> ReportDraft {
    let mut prefix: String = raw.chars().take(FALLBACK_RAW_PREFIX_CHARS).collect();
    if raw.chars().nth(FALLBACK_RAW_PREFIX_CHARS).is_some() {
        prefix.push_str(TRUNCATION_MARKER);
    }

    ReportDraft {
        summary: FALLBACK_SUMMARY.to_string(),
        sections: vec![
            Section {
                title: FALLBACK_ERROR_TITLE.to_string(),
                content: FALLBACK_ERROR_CONTENT.to_string(),
            },
            Section {
                title: FALLBACK_RAW_TITLE.to_string(),
                content: prefix,
            },
        ],
        sources: Vec::new(),
    }
}

/// Doubles every backslash that does not begin a valid JSON escape sequence.
///
/// Valid escapes are `\"`, `\\`, `\/`, `\b`, `\f`, `\n`, `\r`, `\t` and `\u` followed by
/// four hex digits. A valid escape is consumed as a unit, so an already-escaped `\\` is
/// never split.
pub fn repair_escapes(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len() + 8);
    let mut copied_to = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'\\' {
            i += 1;
            continue;
        }

        match escape_len(&bytes[i + 1..]) {
            Some(len) => i += 1 + len,
            None => {
                out.push_str(&text[copied_to..=i]);
                out.push('\\');
                i += 1;
                copied_to = i;
            }
        }
    }
    out.push_str(&text[copied_to..]);
    out
}

/// Length of the escape body following a backslash, if it forms a valid JSON escape.
fn escape_len(rest: &[u8]) -> Option<usize> {
    match rest.first()? {
        b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => Some(1),
        b'u' if rest.len() >= 5 && rest[1..5].iter().all(u8::is_ascii_hexdigit) => Some(5),
        _ => None,
    }
}

fn parse_object(text: &str) -> Option<ReportDraft> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    ReportDraft::from_value(value)
}

fn fenced_block(raw: &str) -> Option<&str> {
    FENCED_BLOCK
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn parse_direct(raw: &str) -> Option<ReportDraft> {
    parse_object(raw.trim())
}

fn parse_fenced(raw: &str) -> Option<ReportDraft> {
    parse_object(fenced_block(raw)?)
}

fn parse_fenced_repaired(raw: &str) -> Option<ReportDraft> {
    parse_object(&repair_escapes(fenced_block(raw)?))
}

fn parse_brace_span(raw: &str) -> Option<ReportDraft> {
    let span = brace_span(raw)?;
    parse_object(span).or_else(|| parse_object(&repair_escapes(span)))
}

fn parse_global_repair(raw: &str) -> Option<ReportDraft> {
    let repaired = repair_escapes(raw);
    parse_object(brace_span(&repaired)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Source;
    use pretty_assertions::assert_eq;

    fn draft(summary: &str) -> ReportDraft {
        ReportDraft {
            summary: summary.to_string(),
            sections: vec![Section {
                title: "T".into(),
                content: "C".into(),
            }],
            sources: vec![],
        }
    }

    #[test]
    fn test_direct_parse() {
        let raw = r#"  {"summary":"S","sections":[{"title":"T","content":"C"}],"sources":[]}  "#;
        let result = normalize(raw);
        assert!(result.success);
        assert_eq!(result.strategy, Some("direct"));
        assert_eq!(result.draft, draft("S"));
    }

    #[test]
    fn test_fenced_block_with_prose() {
        let raw = "Here is the report:\n```json\n{\"summary\":\"S\",\"sections\":[{\"title\":\"T\",\"content\":\"C\"}],\"sources\":[]}\n```\nThanks.";
        let result = normalize(raw);
        assert!(result.success);
        assert_eq!(result.strategy, Some("fenced"));
        assert_eq!(result.draft, draft("S"));
    }

    #[test]
    fn test_fenced_block_needing_repair() {
        let raw = "```\n{\"summary\":\"path C:\\qdir\\data\",\"sections\":[],\"sources\":[]}\n```";
        let result = normalize(raw);
        assert!(result.success);
        assert_eq!(result.strategy, Some("fenced_repaired"));
        assert_eq!(result.draft.summary, "path C:\\qdir\\data");
    }

    #[test]
    fn test_brace_span_surrounded_by_prose() {
        let raw = "Sure! {\"summary\":\"S\",\"sections\":[{\"title\":\"T\",\"content\":\"C\"}],\"sources\":[]} Hope it helps.";
        let result = normalize(raw);
        assert_eq!(result.strategy, Some("brace_span"));
        assert_eq!(result.draft, draft("S"));
    }

    #[test]
    fn test_brace_span_with_invalid_escape() {
        let raw = r#"Result: {"summary":"x\y","sections":[],"sources":[]}"#;
        let result = normalize(raw);
        assert!(result.success);
        assert_eq!(result.strategy, Some("brace_span"));
        assert_eq!(result.draft.summary, "x\\y");
    }

    #[test]
    fn test_missing_fields_default_empty() {
        let result = normalize(r#"{"summary":"Only summary"}"#);
        assert!(result.success);
        assert_eq!(
            result.draft,
            ReportDraft {
                summary: "Only summary".into(),
                sections: vec![],
                sources: vec![],
            }
        );
    }

    #[test]
    fn test_unrecoverable_text_yields_fallback() {
        let result = normalize("I could not find anything useful.");
        assert!(!result.success);
        assert_eq!(result.draft.summary, FALLBACK_SUMMARY);
        assert_eq!(result.draft.sections.len(), 2);
        assert_eq!(result.draft.sections[0].title, "Error");
        assert_eq!(result.draft.sections[1].title, "Raw Response");
        assert_eq!(
            result.draft.sections[1].content,
            "I could not find anything useful."
        );
        assert!(result.draft.sources.is_empty());
    }

    #[test]
    fn test_fallback_truncates_raw_prefix() {
        let raw = "z".repeat(2500);
        let fallback = fallback_draft(&raw);
        let content = &fallback.sections[1].content;
        assert_eq!(content.len(), 1003);
        assert!(content.ends_with("..."));

        let exact = "z".repeat(1000);
        assert_eq!(fallback_draft(&exact).sections[1].content, exact);
    }

    #[test]
    fn test_repair_escapes() {
        assert_eq!(repair_escapes(r"a\qb"), r"a\\qb");
        assert_eq!(repair_escapes(r#"\n\t\"\/\u00e9"#), r#"\n\t\"\/\u00e9"#);
        assert_eq!(repair_escapes(r"\\d"), r"\\d");
        assert_eq!(repair_escapes(r"\u12"), r"\\u12");
        assert_eq!(repair_escapes("end\\"), "end\\\\");
        assert_eq!(repair_escapes("café \\x"), "café \\\\x");
    }

    #[test]
    fn test_normalize_is_idempotent_on_canonical_json() {
        let original = ReportDraft {
            summary: "S with \"quotes\" and \\ slash".into(),
            sections: vec![Section {
                title: "T".into(),
                content: "- item\n- item".into(),
            }],
            sources: vec![Source {
                title: "Src".into(),
                url: "https://example.com".into(),
                snippet: Some("snip".into()),
            }],
        };
        let once = normalize(&original.to_canonical_json().unwrap());
        assert!(once.success);
        assert_eq!(once.draft, original);
        let twice = normalize(&once.draft.to_canonical_json().unwrap());
        assert_eq!(twice.draft, original);
    }

    #[test]
    fn test_garbled_braces_yield_fallback() {
        let raw = "Note {summary: \\q broken, }";
        let result = normalize(raw);
        assert!(!result.success);
        assert_eq!(result.strategy, None);
        let titles: Vec<&str> = result.draft.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Error", "Raw Response"]);
        assert_eq!(result.draft.sections[1].content, raw);
    }

    #[test]
    fn test_global_repair_matches_repaired_brace_span() {
        let inputs = [
            r#"Result: {"summary":"x\y","sections":[],"sources":[]}"#,
            r#"pre \ {"summary":"a\qb\\c"} post \"#,
            r#"\{"summary":"lead\"}"#,
            "Note {summary: \\q broken, }",
            "no braces at all \\",
        ];
        for raw in inputs {
            assert_eq!(parse_global_repair(raw), parse_brace_span(raw), "input {:?}", raw);
        }

        let recovered = parse_global_repair(r#"pre \ {"summary":"a\qb"} post"#);
        assert_eq!(recovered.map(|d| d.summary), Some("a\\qb".to_string()));
    }

    #[test]
    fn test_non_object_json_falls_back() {
        let result = normalize("[1, 2, 3]");
        assert!(!result.success);
    }
}

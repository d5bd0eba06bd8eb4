//! Content classification
//!
//! Pure, deterministic heuristics that map clipboard text to a [`ClipType`]
//! and flag secret-shaped content. Matching is linear in the input length.

use std::sync::LazyLock;

use regex::{Regex, RegexSet};

use crate::domain::ClipType;

/// Result of classifying a piece of content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub clip_type: ClipType,
    pub is_sensitive: bool,
}

static URL: LazyLock<Regex> = LazyLock::new(|| build(r"(?i)^https?://\S+$"));
static EMAIL: LazyLock<Regex> = LazyLock::new(|| build(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"));
static PHONE_CHARS: LazyLock<Regex> = LazyLock::new(|| build(r"^[\d\s\-+().]+$"));

static CODE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    build(
        r"(?m)^\s*(?:function|const|let|var|import|export|class|if|for|while|def|fn|pub|impl|struct|enum|package|func|return|public|private|using|namespace|#include)\s",
    )
});
static SQL_VERB: LazyLock<Regex> =
    LazyLock::new(|| build(r"(?m)^\s*(?:SELECT|INSERT|UPDATE|DELETE|CREATE|ALTER|DROP|WITH)\s"));
static BRACKETS: LazyLock<Regex> = LazyLock::new(|| build(r"[{}\[\]();]"));
static COMMENT_START: LazyLock<Regex> = LazyLock::new(|| build(r"^\s*(?://|/\*|#!|<!--|--\s)"));
static INDENTED_LINE: LazyLock<Regex> = LazyLock::new(|| build(r"(?m)^(?: {2,}|\t)\S"));

/// Named secret shapes, checked in order
const SENSITIVE_PATTERNS: &[(&str, &str)] = &[
    ("openai_key", r"sk-[A-Za-z0-9]{20,}"),
    ("stripe_key", r"[sr]k_(?:live|test)_[A-Za-z0-9]{24,}"),
    ("aws_access_key", r"AKIA[0-9A-Z]{16}"),
    ("github_token", r"gh[pousr]_[A-Za-z0-9]{36,}"),
    ("slack_token", r"xox[abprs]-[A-Za-z0-9-]{10,}"),
    ("google_api_key", r"AIza[0-9A-Za-z_-]{35}"),
    ("hex_token", r"(?i)^\s*(?:[0-9a-f]{32}|[0-9a-f]{40}|[0-9a-f]{64})\s*$"),
    ("password_assignment", r"(?i)password\s*[:=]\s*\S+"),
    ("private_key", r"-----BEGIN (?:[A-Z]+ )*PRIVATE KEY-----"),
    ("jwt", r"eyJ[A-Za-z0-9_-]+\.eyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+"),
];

static SENSITIVE: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(SENSITIVE_PATTERNS.iter().map(|(_, p)| *p)).unwrap_or_else(|e| panic!("invalid secret pattern: {e}"))
});

fn build(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid classifier pattern {pattern}: {e}"))
}

/// Classify content type and sensitivity in one pass; the capture path of `save`
pub fn classify(content: &str) -> Classification {
    Classification {
        clip_type: detect_type(content),
        is_sensitive: is_sensitive(content),
    }
}

/// Detect the content type; first matching rule wins
pub fn detect_type(content: &str) -> ClipType {
    let trimmed = content.trim();
    if URL.is_match(trimmed) {
        return ClipType::Url;
    }
    if EMAIL.is_match(trimmed) {
        return ClipType::Email;
    }
    if is_phone(trimmed) {
        return ClipType::Phone;
    }
    if is_code(content) {
        return ClipType::Code;
    }
    ClipType::Text
}

fn is_phone(content: &str) -> bool {
    PHONE_CHARS.is_match(content) && content.chars().filter(char::is_ascii_digit).count() >= 7
}

fn is_code(content: &str) -> bool {
    let multiline = content.contains('\n');
    CODE_KEYWORD.is_match(content)
        || SQL_VERB.is_match(content)
        || (multiline && BRACKETS.is_match(content))
        || COMMENT_START.is_match(content)
        || (multiline && INDENTED_LINE.find_iter(content).take(2).count() == 2)
}

/// True iff the content matches any secret pattern
pub fn is_sensitive(content: &str) -> bool {
    SENSITIVE.is_match(content)
}

/// Name of the first secret pattern the content matches
pub fn sensitive_pattern(content: &str) -> Option<&'static str> {
    SENSITIVE
        .matches(content)
        .iter()
        .next()
        .map(|index| SENSITIVE_PATTERNS[index].0)
}

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::debug;

use crate::extractor::UNDETERMINED_CATEGORY;

const MIN_TOKEN_CHARS: usize = 3;

/// A quoted string, optionally with backslash-escaped quotes. The body may
/// carry escape sequences (`\\u00e9`, `\u0026`) but never a bare or escaped
/// quote.
static QUOTED_TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\\?"((?:[^"\\]|\\\\|\\[^"\\])*)\\?""#)
        .expect("Failed to compile quoted token regex")
});

static UNICODE_ESCAPE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\u([0-9a-fA-F]{4})").expect("Failed to compile unicode escape regex")
});

/// Recovers category labels that only exist in the page's inline script data.
pub trait HiddenFieldMiner: Send + Sync {
    fn mine(&self, markup: &str, primary_category: &str) -> BTreeSet<String>;
}

/// Finds the array literal that opens with the primary category, e.g.
/// `[\"Pharmacy\",\"Drug Store\"]`, and keeps its other string entries.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexCategoryMiner;

impl RegexCategoryMiner {
    pub fn new() -> Self {
        Self
    }

    fn span_regex(category: &str) -> Option<Regex> {
        let pattern = format!(r#"\[\\?"{}\\?"[^\]]*\]"#, regex::escape(category));
        Regex::new(&pattern).ok()
    }
}

impl HiddenFieldMiner for RegexCategoryMiner {
    fn mine(&self, markup: &str, primary_category: &str) -> BTreeSet<String> {
        let category = primary_category.trim();
        if category.is_empty() || category == UNDETERMINED_CATEGORY {
            return BTreeSet::new();
        }

        let Some(span_regex) = Self::span_regex(category) else {
            return BTreeSet::new();
        };
        let Some(span) = span_regex.find(markup) else {
            debug!(category = %category, "no inline category array");
            return BTreeSet::new();
        };

        let found: BTreeSet<String> = QUOTED_TOKEN_REGEX
            .captures_iter(span.as_str())
            .filter_map(|caps| caps.get(1))
            .map(|token| decode_escapes(token.as_str()))
            .map(|token| token.trim().to_string())
            .filter(|token| keep_token(token, category))
            .collect();

        debug!(category = %category, count = found.len(), "mined hidden categories");
        found
    }
}

/// Undo JS string escaping, once or twice applied: `Caf\\u00e9` and
/// `Caf\u00e9` both become `Café`. Unknown or invalid escapes stay as written.
fn decode_escapes(token: &str) -> String {
    if !token.contains('\\') {
        return token.to_string();
    }
    let single = token.replace(r"\\", r"\").replace(r"\/", "/");
    UNICODE_ESCAPE_REGEX
        .replace_all(&single, |caps: &regex::Captures| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn keep_token(token: &str, category: &str) -> bool {
    token.chars().count() >= MIN_TOKEN_CHARS
        && !token.chars().all(|c| c.is_ascii_digit())
        && token != category
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mine(markup: &str, category: &str) -> BTreeSet<String> {
        RegexCategoryMiner::new().mine(markup, category)
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_escaped_quote_array() {
        let markup = r#"window.APP_INITIALIZATION_STATE=[[null,[\"Pharmacy\",\"Drug Store\",\"24\",\"Rx\"],1]];"#;
        assert_eq!(mine(markup, "Pharmacy"), set(&["Drug Store"]));
    }

    #[test]
    fn test_plain_quote_array() {
        let markup = r#"<script>var d = ["Pharmacy","Drug Store","Medical supply store","Drug Store"];</script>"#;
        assert_eq!(
            mine(markup, "Pharmacy"),
            set(&["Drug Store", "Medical supply store"])
        );
    }

    #[test]
    fn test_stops_at_first_closing_bracket() {
        let markup = r#"[\"Cafe\",\"Coffee shop\"],[\"Bakery\"]"#;
        assert_eq!(mine(markup, "Cafe"), set(&["Coffee shop"]));
    }

    #[test]
    fn test_category_is_matched_literally() {
        let markup = r#"[\"Cafe (24h)\",\"Espresso bar\"] [\"Cafe x24hx\",\"Wrong\"]"#;
        assert_eq!(mine(markup, "Cafe (24h)"), set(&["Espresso bar"]));
    }

    #[test]
    fn test_no_array_is_empty() {
        assert!(mine("<html><body>Pharmacy</body></html>", "Pharmacy").is_empty());
        assert!(mine("", "Pharmacy").is_empty());
    }

    #[test]
    fn test_array_must_open_with_category() {
        let markup = r#"[\"Drug Store\",\"Pharmacy\",\"Chemist\"]"#;
        assert!(mine(markup, "Pharmacy").is_empty());
    }

    #[test]
    fn test_empty_or_sentinel_category() {
        let markup = r#"[\"\",\"Drug Store\"] [\"Undetermined\",\"Drug Store\"]"#;
        assert!(mine(markup, "").is_empty());
        assert!(mine(markup, "   ").is_empty());
        assert!(mine(markup, UNDETERMINED_CATEGORY).is_empty());
    }

    #[test]
    fn test_escaped_token_keeps_later_tokens() {
        let markup = r#"[\"Pharmacy\",\"Caf\\u00e9 bar\",\"Drug Store\",\"Chemist\"]"#;
        assert_eq!(
            mine(markup, "Pharmacy"),
            set(&["Café bar", "Chemist", "Drug Store"])
        );
    }

    #[test]
    fn test_single_escaped_tokens_are_decoded() {
        let markup = r#"["Spa","Beauty \u0026 wellness","Caf\u00e9","http:\/\/x"]"#;
        assert_eq!(
            mine(markup, "Spa"),
            set(&["Beauty & wellness", "Café", "http://x"])
        );
    }

    #[test]
    fn test_decode_escapes() {
        assert_eq!(decode_escapes("Drug Store"), "Drug Store");
        assert_eq!(decode_escapes(r"Caf\\u00e9"), "Café");
        assert_eq!(decode_escapes(r"Caf\u00e9"), "Café");
        // Lone surrogates cannot become a char and are left alone.
        assert_eq!(decode_escapes(r"x\ud83d"), r"x\ud83d");
    }

    #[test]
    fn test_mining_is_idempotent() {
        let markup = r#"[\"Pharmacy\",\"Drug Store\",\"Chemist\",\"Drug Store\"]"#;
        let first = mine(markup, "Pharmacy");
        let second = mine(markup, "Pharmacy");
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }
}

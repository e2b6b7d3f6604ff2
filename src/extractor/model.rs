use regex::Regex;
use std::sync::LazyLock;

/// Used when neither the heading, the document title nor the page metadata
/// yields a name.
pub const UNKNOWN_NAME: &str = "Unknown listing";
/// Used when no category strategy succeeds.
pub const UNDETERMINED_CATEGORY: &str = "Undetermined";

static WHITESPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Failed to compile whitespace regex"));

/// Everything pulled out of one listing page. Each field degrades on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    pub name: String,
    pub category: String,
    pub review_text: String,
    pub visible_text: String,
    pub raw_markup: String,
    pub screenshot: Option<Vec<u8>>,
}

impl ExtractionResult {
    pub fn has_category(&self) -> bool {
        !self.category.trim().is_empty() && self.category != UNDETERMINED_CATEGORY
    }
}

/// Cut `text` to at most `budget` characters (not bytes).
pub fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Collapse runs of whitespace (newlines included) into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text.trim(), " ").into_owned()
}

/// Drop blank lines from rendered page text.
pub fn clean_visible_text(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

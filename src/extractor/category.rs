use async_trait::async_trait;
use std::time::Duration;

use crate::browser::{BrowserError, BrowserSession, Locator};
use crate::extractor::model::collapse_whitespace;
use crate::extractor::strategy::{Strategy, StrategyChain};

const MAX_CATEGORY_CHARS: usize = 80;

pub fn category_chain(wait: Duration) -> StrategyChain<String> {
    StrategyChain::new("category")
        .then(CategoryControlStrategy { wait })
        .then(AdjacentToTitleStrategy)
}

/// The button whose action handler is wired to the category filter.
pub struct CategoryControlStrategy {
    pub wait: Duration,
}

#[async_trait]
impl Strategy<String> for CategoryControlStrategy {
    fn name(&self) -> &'static str {
        "category_control"
    }

    async fn attempt(&self, session: &dyn BrowserSession) -> Result<String, BrowserError> {
        let control = Locator::attr_contains("jsaction", "category");
        session.wait_for(&control, self.wait).await?;
        let text = collapse_whitespace(&session.text(&control).await?);
        if text.is_empty() {
            return Err(BrowserError::EmptyText(control.to_string()));
        }
        Ok(text)
    }
}

/// First plausible label in the block rendered right after the heading.
pub struct AdjacentToTitleStrategy;

#[async_trait]
impl Strategy<String> for AdjacentToTitleStrategy {
    fn name(&self) -> &'static str {
        "adjacent_to_title"
    }

    async fn attempt(&self, session: &dyn BrowserSession) -> Result<String, BrowserError> {
        let block = Locator::next_sibling_of(Locator::css("h1"));
        let text = session.text(&block).await?;
        pick_category_line(&text).ok_or_else(|| BrowserError::EmptyText(block.to_string()))
    }
}

/// Skip rating and review-count lines ("4.5", "(1,204)") and anything too long
/// to be a label.
fn pick_category_line(text: &str) -> Option<String> {
    text.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .filter(|line| line.chars().count() <= MAX_CATEGORY_CHARS)
        .find(|line| {
            line.chars().any(char::is_alphabetic)
                && !line.starts_with(|c: char| c.is_ascii_digit() || c == '(')
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::{FakePage, FakeSession};

    #[test]
    fn picks_first_label_line() {
        assert_eq!(
            pick_category_line("4.5\n(1,204)\nPharmacy\nOpen 24 hours").as_deref(),
            Some("Pharmacy")
        );
        assert_eq!(pick_category_line("4.5\n(12)"), None);
        assert_eq!(pick_category_line(""), None);
    }

    #[tokio::test]
    async fn control_wins_when_present() {
        let session = FakeSession::new(
            FakePage::default()
                .with(&Locator::attr_contains("jsaction", "category"), &["Pharmacy"])
                .with(
                    &Locator::next_sibling_of(Locator::css("h1")),
                    &["Drug store"],
                ),
        );
        let outcome = category_chain(Duration::ZERO).run(&session).await;
        assert_eq!(outcome.value.as_deref(), Some("Pharmacy"));
    }

    #[tokio::test]
    async fn adjacent_text_used_when_control_missing() {
        let session = FakeSession::new(FakePage::default().with(
            &Locator::next_sibling_of(Locator::css("h1")),
            &["4.2\nCoffee shop"],
        ));
        let outcome = category_chain(Duration::ZERO).run(&session).await;
        assert_eq!(outcome.value.as_deref(), Some("Coffee shop"));
        assert!(outcome.failed("category_control"));
    }

    #[tokio::test]
    async fn nothing_found() {
        let session = FakeSession::new(FakePage::default());
        let outcome = category_chain(Duration::ZERO).run(&session).await;
        assert!(outcome.value.is_none());
    }
}

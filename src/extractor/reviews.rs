use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::browser::{BrowserError, BrowserSession, Locator};
use crate::extractor::model::collapse_whitespace;
use crate::extractor::strategy::{Strategy, StrategyChain};

const SCROLL_STEP_PX: i64 = 2_000;

#[derive(Debug, Clone)]
pub struct ReviewSettings {
    /// Accessible labels of the reviews tab, one per supported language.
    pub tab_labels: Vec<String>,
    pub click_timeout: Duration,
    /// Pause after opening the tab, before anything is scrolled.
    pub settle: Duration,
    pub scroll_rounds: usize,
    pub scroll_pause: Duration,
    pub feed: Locator,
    pub snippet: Locator,
    /// "See more" buttons that expand truncated reviews.
    pub expand: Locator,
}

impl ReviewSettings {
    pub fn new(tab_labels: Vec<String>) -> Self {
        Self {
            tab_labels,
            click_timeout: Duration::from_secs(5),
            settle: Duration::from_secs(2),
            scroll_rounds: 3,
            scroll_pause: Duration::from_millis(800),
            feed: Locator::css("div.m6QErb.DxyBCb"),
            snippet: Locator::css(".wiI7pd"),
            expand: Locator::aria_label("See more"),
        }
    }

    /// No pauses; for scripted sessions.
    pub fn immediate(mut self) -> Self {
        self.click_timeout = Duration::ZERO;
        self.settle = Duration::ZERO;
        self.scroll_pause = Duration::ZERO;
        self
    }
}

pub fn review_chain(settings: ReviewSettings) -> StrategyChain<String> {
    StrategyChain::new("reviews").then(ReviewsTabStrategy { settings })
}

/// Open the reviews tab, coax lazy content into rendering, then collect every
/// snippet.
pub struct ReviewsTabStrategy {
    pub settings: ReviewSettings,
}

impl ReviewsTabStrategy {
    async fn open_tab(&self, session: &dyn BrowserSession) -> Result<(), BrowserError> {
        let mut last_error = None;
        for label in &self.settings.tab_labels {
            match session
                .click(&Locator::aria_label(label.as_str()), self.settings.click_timeout)
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            BrowserError::ElementNotFound("reviews tab (no labels configured)".to_string())
        }))
    }
}

#[async_trait]
impl Strategy<String> for ReviewsTabStrategy {
    fn name(&self) -> &'static str {
        "reviews_tab"
    }

    async fn attempt(&self, session: &dyn BrowserSession) -> Result<String, BrowserError> {
        let settings = &self.settings;
        self.open_tab(session).await?;
        tokio::time::sleep(settings.settle).await;

        for round in 0..settings.scroll_rounds {
            if let Err(e) = session.scroll(&settings.feed, SCROLL_STEP_PX).await {
                debug!(round, error = %e, "review feed scroll failed");
            }
            match session.click_all(&settings.expand).await {
                Ok(expanded) if expanded > 0 => debug!(round, expanded, "expanded reviews"),
                Ok(_) => {}
                Err(e) => debug!(round, error = %e, "review expansion failed"),
            }
            tokio::time::sleep(settings.scroll_pause).await;
        }

        let snippets = session.texts(&settings.snippet).await?;
        Ok(join_snippets(&snippets))
    }
}

/// Space-join non-empty snippets, each flattened to one line.
pub fn join_snippets(snippets: &[String]) -> String {
    snippets
        .iter()
        .map(|s| collapse_whitespace(s))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

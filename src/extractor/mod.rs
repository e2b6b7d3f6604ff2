pub mod category;
pub mod model;
pub mod reviews;
pub mod strategy;
pub mod title;

#[cfg(test)]
mod tests;

pub use model::{ExtractionResult, UNDETERMINED_CATEGORY, UNKNOWN_NAME};

use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::browser::{BrowserError, BrowserSession, Locator};
use crate::config::{Config, WaitMode};
use model::{clean_visible_text, truncate_chars};
use reviews::ReviewSettings;
use strategy::StrategyChain;

const DEFAULT_SELECTOR_WAIT: Duration = Duration::from_secs(5);
const CONSENT_CLICK_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    pub wait_mode: WaitMode,
    pub nav_timeout: Duration,
    pub settle_delay: Duration,
    pub heading_wait: Duration,
    pub selector_wait: Duration,
    pub consent_labels: Vec<String>,
    pub consent_timeout: Duration,
    pub char_budget: usize,
    pub diagnostic_mode: bool,
    pub reviews: ReviewSettings,
}

impl ExtractorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            wait_mode: config.wait_mode(),
            nav_timeout: config.nav_timeout(),
            settle_delay: config.settle_delay(),
            heading_wait: config.heading_wait(),
            selector_wait: DEFAULT_SELECTOR_WAIT,
            consent_labels: config.consent_labels().to_vec(),
            consent_timeout: CONSENT_CLICK_TIMEOUT,
            char_budget: config.char_budget(),
            diagnostic_mode: config.diagnostic_mode(),
            reviews: ReviewSettings::new(config.review_tab_labels().to_vec()),
        }
    }
}

/// Walks one listing page and fills in an [`ExtractionResult`].
pub struct PageExtractor {
    settings: ExtractorSettings,
    title: StrategyChain<String>,
    category: StrategyChain<String>,
    reviews: StrategyChain<String>,
}

impl PageExtractor {
    pub fn new(settings: ExtractorSettings) -> Self {
        Self {
            title: title::title_chain(settings.heading_wait),
            category: category::category_chain(settings.selector_wait),
            reviews: reviews::review_chain(settings.reviews.clone()),
            settings,
        }
    }

    pub fn settings(&self) -> &ExtractorSettings {
        &self.settings
    }

    /// Navigate and extract. Only a failed navigation is an error; every field
    /// afterwards falls back to a sentinel or an empty string.
    #[instrument(skip(self, session), fields(url = %url))]
    pub async fn extract(
        &self,
        session: &dyn BrowserSession,
        url: &str,
    ) -> Result<ExtractionResult, BrowserError> {
        let settings = &self.settings;
        session
            .goto(url, settings.wait_mode, settings.nav_timeout)
            .await?;

        if !settings.settle_delay.is_zero() {
            tokio::time::sleep(settings.settle_delay).await;
        }

        self.dismiss_consent(session).await;

        let title = self.title.run(session).await;
        let screenshot = if settings.diagnostic_mode && title.failed(title::HEADING_STRATEGY) {
            self.capture_diagnostic(session).await
        } else {
            None
        };
        let name = title.value.unwrap_or_else(|| {
            warn!("no name strategy succeeded, using sentinel");
            UNKNOWN_NAME.to_string()
        });

        let category = self.category.run(session).await.value.unwrap_or_else(|| {
            warn!("no category strategy succeeded, using sentinel");
            UNDETERMINED_CATEGORY.to_string()
        });

        let visible_text = match session.text(&Locator::css("body")).await {
            Ok(text) => truncate_chars(&clean_visible_text(&text), settings.char_budget).to_string(),
            Err(e) => {
                warn!(error = %e, "visible text unavailable");
                String::new()
            }
        };

        let review_text = self
            .reviews
            .run(session)
            .await
            .value
            .map(|text| truncate_chars(&text, settings.char_budget).to_string())
            .unwrap_or_default();

        let raw_markup = match session.content().await {
            Ok(markup) => markup,
            Err(e) => {
                warn!(error = %e, "rendered markup unavailable");
                String::new()
            }
        };

        debug!(
            name = %name,
            category = %category,
            review_chars = review_text.chars().count(),
            markup_bytes = raw_markup.len(),
            "extraction finished"
        );

        Ok(ExtractionResult {
            name,
            category,
            review_text,
            visible_text,
            raw_markup,
            screenshot,
        })
    }

    async fn dismiss_consent(&self, session: &dyn BrowserSession) {
        for label in &self.settings.consent_labels {
            let button = Locator::text_contains("button", label.as_str());
            match session.click(&button, self.settings.consent_timeout).await {
                Ok(()) => {
                    debug!(label = %label, "dismissed consent dialog");
                    return;
                }
                Err(e) => debug!(label = %label, error = %e, "no consent button"),
            }
        }
    }

    async fn capture_diagnostic(&self, session: &dyn BrowserSession) -> Option<Vec<u8>> {
        match session.screenshot().await {
            Ok(bytes) => {
                warn!(bytes = bytes.len(), "heading missing, captured diagnostic screenshot");
                Some(bytes)
            }
            Err(e) => {
                warn!(error = %e, "heading missing and diagnostic screenshot failed");
                None
            }
        }
    }
}

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;

use crate::browser::{BrowserError, BrowserSession, Locator};
use crate::extractor::model::collapse_whitespace;
use crate::extractor::strategy::{Strategy, StrategyChain};

pub const HEADING_STRATEGY: &str = "heading";

const BRAND: &str = "Google Maps";
const BRAND_SEPARATORS: [&str; 3] = [" - ", " – ", " | "];

pub fn title_chain(heading_wait: Duration) -> StrategyChain<String> {
    StrategyChain::new("name")
        .then(HeadingStrategy { wait: heading_wait })
        .then(DocumentTitleStrategy)
        .then(MetaTitleStrategy)
}

/// The listing's primary heading.
pub struct HeadingStrategy {
    pub wait: Duration,
}

#[async_trait]
impl Strategy<String> for HeadingStrategy {
    fn name(&self) -> &'static str {
        HEADING_STRATEGY
    }

    async fn attempt(&self, session: &dyn BrowserSession) -> Result<String, BrowserError> {
        let heading = Locator::css("h1");
        session.wait_for(&heading, self.wait).await?;
        let text = session.text(&heading).await?;
        non_empty(collapse_whitespace(&text), "css:h1")
    }
}

/// The `<title>` of the document, minus the site brand.
pub struct DocumentTitleStrategy;

#[async_trait]
impl Strategy<String> for DocumentTitleStrategy {
    fn name(&self) -> &'static str {
        "document_title"
    }

    async fn attempt(&self, session: &dyn BrowserSession) -> Result<String, BrowserError> {
        let title = session.title().await?;
        non_empty(strip_brand_suffix(&title).to_string(), "title")
    }
}

/// `og:title` from the rendered markup.
pub struct MetaTitleStrategy;

#[async_trait]
impl Strategy<String> for MetaTitleStrategy {
    fn name(&self) -> &'static str {
        "og_title"
    }

    async fn attempt(&self, session: &dyn BrowserSession) -> Result<String, BrowserError> {
        let markup = session.content().await?;
        let title = og_title(&markup)
            .ok_or_else(|| BrowserError::ElementNotFound("meta:og:title".to_string()))?;
        non_empty(strip_brand_suffix(&title).to_string(), "meta:og:title")
    }
}

fn og_title(markup: &str) -> Option<String> {
    let document = Html::parse_document(markup);
    let selector = Selector::parse("meta[property='og:title']").ok()?;
    document
        .select(&selector)
        .find_map(|element| element.value().attr("content"))
        .map(str::to_string)
}

/// "Example Pharmacy - Google Maps" -> "Example Pharmacy".
pub fn strip_brand_suffix(title: &str) -> &str {
    let trimmed = title.trim();
    for separator in BRAND_SEPARATORS {
        if let Some(pos) = trimmed.rfind(separator)
            && trimmed[pos + separator.len()..].trim() == BRAND
        {
            return trimmed[..pos].trim_end();
        }
    }
    if trimmed == BRAND {
        return "";
    }
    trimmed
}

fn non_empty(text: String, what: &str) -> Result<String, BrowserError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(BrowserError::EmptyText(what.to_string()));
    }
    Ok(text.to_string())
}

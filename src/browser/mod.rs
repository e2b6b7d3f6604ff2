//! Browser capability used by the page extractor.
//!
//! The extractor only talks to [`BrowserSession`]; the chromiumoxide-backed
//! implementation lives in [`chromium`], and tests drive a scripted fake.

pub mod chromium;
pub mod errors;
pub mod setup;

#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{Config, WaitMode};

pub use chromium::ChromiumLauncher;
pub use errors::BrowserError;

const DEFAULT_VIEWPORT: (u32, u32) = (1280, 900);

/// Ways of picking elements out of the rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Plain CSS selector (tag names included).
    Css(String),
    /// Any element whose attribute value contains a substring.
    AttributeContains { attr: String, value: String },
    /// Any element whose `aria-label` contains a substring.
    AriaLabelContains(String),
    /// Elements of `tag` whose visible text contains a substring.
    TextContains { tag: String, text: String },
    /// The element that follows each match's parent container.
    NextSiblingOf(Box<Locator>),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn attr_contains(attr: impl Into<String>, value: impl Into<String>) -> Self {
        Self::AttributeContains {
            attr: attr.into(),
            value: value.into(),
        }
    }

    pub fn aria_label(text: impl Into<String>) -> Self {
        Self::AriaLabelContains(text.into())
    }

    pub fn text_contains(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self::TextContains {
            tag: tag.into(),
            text: text.into(),
        }
    }

    pub fn next_sibling_of(inner: Locator) -> Self {
        Self::NextSiblingOf(Box::new(inner))
    }

    /// JavaScript expression that evaluates to an array of matching elements.
    pub fn to_js(&self) -> String {
        match self {
            Self::Css(selector) => format!(
                "Array.from(document.querySelectorAll({}))",
                js_string(selector)
            ),
            Self::AttributeContains { attr, value } => format!(
                "Array.from(document.querySelectorAll('*')).filter(e => (e.getAttribute({}) || '').includes({}))",
                js_string(attr),
                js_string(value)
            ),
            Self::AriaLabelContains(text) => format!(
                "Array.from(document.querySelectorAll('[aria-label]')).filter(e => e.getAttribute('aria-label').includes({}))",
                js_string(text)
            ),
            Self::TextContains { tag, text } => format!(
                "Array.from(document.querySelectorAll({})).filter(e => (e.innerText || e.textContent || '').includes({}))",
                js_string(tag),
                js_string(text)
            ),
            Self::NextSiblingOf(inner) => format!(
                "({}).map(e => e.parentElement ? e.parentElement.nextElementSibling : null).filter(e => e)",
                inner.to_js()
            ),
        }
    }
}

impl Display for Locator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(selector) => write!(f, "css:{selector}"),
            Self::AttributeContains { attr, value } => write!(f, "attr:{attr}*={value}"),
            Self::AriaLabelContains(text) => write!(f, "aria:{text}"),
            Self::TextContains { tag, text } => write!(f, "text:{tag}~{text}"),
            Self::NextSiblingOf(inner) => write!(f, "next:{inner}"),
        }
    }
}

/// Quote a Rust string as a JavaScript string literal.
pub(crate) fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_owned()).to_string()
}

/// Client identity and limits for a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProfile {
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub executable: Option<PathBuf>,
    pub request_timeout: Duration,
}

impl SessionProfile {
    pub fn from_config(config: &Config) -> Self {
        Self {
            user_agent: config.user_agent().to_string(),
            viewport: DEFAULT_VIEWPORT,
            executable: config.chrome_executable().cloned(),
            request_timeout: config.nav_timeout(),
        }
    }
}

/// One open page in a browser. Every method is bounded by its own timeout or
/// by the session's request timeout.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn goto(&self, url: &str, mode: WaitMode, timeout: Duration)
    -> Result<(), BrowserError>;

    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<(), BrowserError>;

    /// Visible text of the first match.
    async fn text(&self, locator: &Locator) -> Result<String, BrowserError>;

    /// Visible text of every match, in document order.
    async fn texts(&self, locator: &Locator) -> Result<Vec<String>, BrowserError>;

    async fn click(&self, locator: &Locator, timeout: Duration) -> Result<(), BrowserError>;

    /// Click every match; returns how many were clicked.
    async fn click_all(&self, locator: &Locator) -> Result<usize, BrowserError>;

    /// Scroll the first match (or the window when nothing matches) by `pixels`.
    async fn scroll(&self, locator: &Locator, pixels: i64) -> Result<(), BrowserError>;

    async fn title(&self) -> Result<String, BrowserError>;

    /// Full rendered markup.
    async fn content(&self) -> Result<String, BrowserError>;

    /// Full-page PNG.
    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError>;

    async fn close(&self) -> Result<(), BrowserError>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(
        &self,
        profile: &SessionProfile,
    ) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

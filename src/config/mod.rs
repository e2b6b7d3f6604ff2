//! Configuration handling for the analysis service.
//!
//! Everything that the various hand-tuned scrapers used to hardcode (character
//! budgets, wait strategies, consent labels, model names) lives here so it can
//! be tuned per deployment. `Config::from_env` reads environment variables and
//! falls back to the defaults below.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable names.
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_GEMINI_BASE_URL: &str = "GEMINI_BASE_URL";
pub const ENV_MODEL_CANDIDATES: &str = "MODEL_CANDIDATES";
pub const ENV_CHAR_BUDGET: &str = "CHAR_BUDGET";
pub const ENV_NAV_TIMEOUT_SECS: &str = "NAV_TIMEOUT_SECS";
pub const ENV_HEADING_WAIT_SECS: &str = "HEADING_WAIT_SECS";
pub const ENV_SETTLE_DELAY_MS: &str = "SETTLE_DELAY_MS";
pub const ENV_WAIT_MODE: &str = "WAIT_MODE";
pub const ENV_USER_AGENT: &str = "USER_AGENT";
pub const ENV_CHROME_EXECUTABLE: &str = "CHROME_EXECUTABLE";
pub const ENV_BROWSER_INSTALL_CMD: &str = "BROWSER_INSTALL_CMD";
pub const ENV_DIAGNOSTIC_MODE: &str = "DIAGNOSTIC_MODE";
pub const ENV_REPORT_LANGUAGE: &str = "REPORT_LANGUAGE";
pub const ENV_CONSENT_LABELS: &str = "CONSENT_LABELS";
pub const ENV_REVIEW_TAB_LABELS: &str = "REVIEW_TAB_LABELS";

#[cfg(test)]
const ALL_VARS: [&str; 15] = [
    ENV_BIND_ADDR,
    ENV_GEMINI_BASE_URL,
    ENV_MODEL_CANDIDATES,
    ENV_CHAR_BUDGET,
    ENV_NAV_TIMEOUT_SECS,
    ENV_HEADING_WAIT_SECS,
    ENV_SETTLE_DELAY_MS,
    ENV_WAIT_MODE,
    ENV_USER_AGENT,
    ENV_CHROME_EXECUTABLE,
    ENV_BROWSER_INSTALL_CMD,
    ENV_DIAGNOSTIC_MODE,
    ENV_REPORT_LANGUAGE,
    ENV_CONSENT_LABELS,
    ENV_REVIEW_TAB_LABELS,
];

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL_CANDIDATES: [&str; 2] = ["gemini-1.5-flash", "gemini-pro"];
/// Review and page-text excerpts are cut to this many characters before they
/// reach the prompt.
pub const DEFAULT_CHAR_BUDGET: usize = 12_000;
const DEFAULT_NAV_TIMEOUT_SECS: u64 = 60;
const DEFAULT_HEADING_WAIT_SECS: u64 = 15;
const DEFAULT_SETTLE_DELAY_MS: u64 = 4_000;
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 10; SM-A205U) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/98.0.4758.101 Mobile Safari/537.36";
const DEFAULT_REPORT_LANGUAGE: &str = "English";
const DEFAULT_CONSENT_LABELS: [&str; 4] = [
    "Accept all",
    "قبول الكل",
    "Alle akzeptieren",
    "Tout accepter",
];
const DEFAULT_REVIEW_TAB_LABELS: [&str; 4] = ["Reviews", "المراجعات", "Rezensionen", "Avis"];

/// How long navigation waits before the page counts as ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitMode {
    /// Document parsed; images and scripts may still be loading.
    #[default]
    DomContentLoaded,
    /// The `load` event fired.
    Load,
    /// `load` fired and no new resources were requested for a short window.
    NetworkIdle,
}

impl FromStr for WaitMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dom_content_loaded" | "domcontentloaded" => Ok(Self::DomContentLoaded),
            "load" => Ok(Self::Load),
            "network_idle" | "networkidle" => Ok(Self::NetworkIdle),
            other => Err(ConfigError::InvalidValue {
                field: ENV_WAIT_MODE,
                reason: format!("unknown wait mode '{other}'"),
            }),
        }
    }
}

/// Application runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    bind_addr: String,
    gemini_base_url: String,
    model_candidates: Vec<String>,
    char_budget: usize,
    nav_timeout: Duration,
    heading_wait: Duration,
    settle_delay: Duration,
    wait_mode: WaitMode,
    user_agent: String,
    chrome_executable: Option<PathBuf>,
    browser_install_cmd: Option<String>,
    diagnostic_mode: bool,
    report_language: String,
    consent_labels: Vec<String>,
    review_tab_labels: Vec<String>,
}

impl Config {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Ok(v) = env::var(ENV_BIND_ADDR) {
            cfg.bind_addr = v;
        }
        if let Ok(v) = env::var(ENV_GEMINI_BASE_URL) {
            cfg.gemini_base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var(ENV_MODEL_CANDIDATES) {
            let models = split_list(&v);
            if models.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: ENV_MODEL_CANDIDATES,
                    reason: "at least one model is required".to_string(),
                });
            }
            cfg.model_candidates = models;
        }
        if let Some(v) = parse_var::<usize>(ENV_CHAR_BUDGET)? {
            cfg.char_budget = v;
        }
        if let Some(v) = parse_var::<u64>(ENV_NAV_TIMEOUT_SECS)? {
            cfg.nav_timeout = Duration::from_secs(v);
        }
        if let Some(v) = parse_var::<u64>(ENV_HEADING_WAIT_SECS)? {
            cfg.heading_wait = Duration::from_secs(v);
        }
        if let Some(v) = parse_var::<u64>(ENV_SETTLE_DELAY_MS)? {
            cfg.settle_delay = Duration::from_millis(v);
        }
        if let Ok(v) = env::var(ENV_WAIT_MODE) {
            cfg.wait_mode = v.parse()?;
        }
        if let Ok(v) = env::var(ENV_USER_AGENT) {
            cfg.user_agent = v;
        }
        cfg.chrome_executable = env::var(ENV_CHROME_EXECUTABLE)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        cfg.browser_install_cmd = env::var(ENV_BROWSER_INSTALL_CMD)
            .ok()
            .filter(|v| !v.trim().is_empty());
        if let Ok(v) = env::var(ENV_DIAGNOSTIC_MODE) {
            cfg.diagnostic_mode = parse_bool(ENV_DIAGNOSTIC_MODE, &v)?;
        }
        if let Ok(v) = env::var(ENV_REPORT_LANGUAGE) {
            cfg.report_language = v;
        }
        if let Ok(v) = env::var(ENV_CONSENT_LABELS) {
            cfg.consent_labels = split_list(&v);
        }
        if let Ok(v) = env::var(ENV_REVIEW_TAB_LABELS) {
            cfg.review_tab_labels = split_list(&v);
        }

        Ok(cfg)
    }

    /// TCP bind address (host:port) for the HTTP server.
    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }
    /// Base URL of the text-generation REST API.
    pub fn gemini_base_url(&self) -> &str {
        &self.gemini_base_url
    }
    /// Model identifiers, tried in order.
    pub fn model_candidates(&self) -> &[String] {
        &self.model_candidates
    }
    pub fn char_budget(&self) -> usize {
        self.char_budget
    }
    pub fn nav_timeout(&self) -> Duration {
        self.nav_timeout
    }
    pub fn heading_wait(&self) -> Duration {
        self.heading_wait
    }
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }
    pub fn wait_mode(&self) -> WaitMode {
        self.wait_mode
    }
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
    /// Explicit browser binary; `None` lets the launcher probe for one.
    pub fn chrome_executable(&self) -> Option<&PathBuf> {
        self.chrome_executable.as_ref()
    }
    /// Command run once per process before the first browser launch.
    pub fn browser_install_cmd(&self) -> Option<&str> {
        self.browser_install_cmd.as_deref()
    }
    /// Capture a screenshot when the listing heading never shows up.
    pub fn diagnostic_mode(&self) -> bool {
        self.diagnostic_mode
    }
    pub fn report_language(&self) -> &str {
        &self.report_language
    }
    pub fn consent_labels(&self) -> &[String] {
        &self.consent_labels
    }
    pub fn review_tab_labels(&self) -> &[String] {
        &self.review_tab_labels
    }

    pub fn with_model_candidates(mut self, models: Vec<String>) -> Self {
        self.model_candidates = models;
        self
    }

    pub fn with_char_budget(mut self, budget: usize) -> Self {
        self.char_budget = budget;
        self
    }

    pub fn with_diagnostic_mode(mut self, enabled: bool) -> Self {
        self.diagnostic_mode = enabled;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_wait_mode(mut self, mode: WaitMode) -> Self {
        self.wait_mode = mode;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model_candidates: DEFAULT_MODEL_CANDIDATES.map(String::from).to_vec(),
            char_budget: DEFAULT_CHAR_BUDGET,
            nav_timeout: Duration::from_secs(DEFAULT_NAV_TIMEOUT_SECS),
            heading_wait: Duration::from_secs(DEFAULT_HEADING_WAIT_SECS),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            wait_mode: WaitMode::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            chrome_executable: None,
            browser_install_cmd: None,
            diagnostic_mode: false,
            report_language: DEFAULT_REPORT_LANGUAGE.to_string(),
            consent_labels: DEFAULT_CONSENT_LABELS.map(String::from).to_vec(),
            review_tab_labels: DEFAULT_REVIEW_TAB_LABELS.map(String::from).to_vec(),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_var<T: FromStr>(field: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: Display,
{
    match env::var(field) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                field,
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

fn parse_bool(field: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            field,
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}

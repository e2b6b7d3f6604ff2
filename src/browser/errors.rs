use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("timed out after {timeout:?} waiting for {locator}")]
    WaitTimeout { locator: String, timeout: Duration },

    #[error("no element matched {0}")]
    ElementNotFound(String),

    #[error("element {0} has no text")]
    EmptyText(String),

    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("screenshot failed: {0}")]
    Screenshot(String),

    #[error("session closed")]
    Closed,
}

impl BrowserError {
    /// Errors that end the request: without a page there is nothing to
    /// degrade gracefully to.
    pub fn is_session_fatal(&self) -> bool {
        match self {
            Self::Launch(_) => true,
            Self::Navigation { .. } => true,
            Self::NavigationTimeout { .. } => true,
            Self::Closed => true,

            Self::WaitTimeout { .. } => false,
            Self::ElementNotFound(_) => false,
            Self::EmptyText(_) => false,
            Self::Script(_) => false,
            Self::Screenshot(_) => false,
        }
    }
}

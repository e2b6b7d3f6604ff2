//! Scripted browser used by unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::browser::{BrowserError, BrowserLauncher, BrowserSession, Locator, SessionProfile};
use crate::config::WaitMode;

/// Page contents keyed by locator descriptor (`Locator`'s `Display`).
#[derive(Debug, Default)]
pub struct FakePage {
    pub elements: HashMap<String, Vec<String>>,
    pub title: Option<String>,
    pub markup: Option<String>,
    pub fail_navigation: bool,
    pub fail_launch: bool,
}

impl FakePage {
    pub fn with(mut self, locator: &Locator, texts: &[&str]) -> Self {
        self.elements.insert(
            locator.to_string(),
            texts.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_markup(mut self, markup: &str) -> Self {
        self.markup = Some(markup.to_string());
        self
    }
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub page: FakePage,
    pub clicks: Mutex<Vec<String>>,
    pub visited: Mutex<Vec<String>>,
    pub screenshots: AtomicUsize,
    pub closed: AtomicBool,
}

impl FakeState {
    pub fn clicked(&self) -> Vec<String> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn lookup(&self, locator: &Locator) -> Option<&Vec<String>> {
        self.page.elements.get(&locator.to_string())
    }
}

pub struct FakeSession {
    pub state: Arc<FakeState>,
}

impl FakeSession {
    pub fn new(page: FakePage) -> Self {
        Self {
            state: Arc::new(FakeState {
                page,
                ..Default::default()
            }),
        }
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn goto(
        &self,
        url: &str,
        _mode: WaitMode,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        self.state.visited.lock().unwrap().push(url.to_string());
        if self.state.page.fail_navigation {
            return Err(BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout,
            });
        }
        Ok(())
    }

    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<(), BrowserError> {
        match self.state.lookup(locator) {
            Some(found) if !found.is_empty() => Ok(()),
            _ => Err(BrowserError::WaitTimeout {
                locator: locator.to_string(),
                timeout,
            }),
        }
    }

    async fn text(&self, locator: &Locator) -> Result<String, BrowserError> {
        self.state
            .lookup(locator)
            .and_then(|found| found.first().cloned())
            .ok_or_else(|| BrowserError::ElementNotFound(locator.to_string()))
    }

    async fn texts(&self, locator: &Locator) -> Result<Vec<String>, BrowserError> {
        Ok(self.state.lookup(locator).cloned().unwrap_or_default())
    }

    async fn click(&self, locator: &Locator, timeout: Duration) -> Result<(), BrowserError> {
        self.wait_for(locator, timeout).await?;
        self.state.clicks.lock().unwrap().push(locator.to_string());
        Ok(())
    }

    async fn click_all(&self, locator: &Locator) -> Result<usize, BrowserError> {
        let count = self.state.lookup(locator).map_or(0, Vec::len);
        if count > 0 {
            self.state.clicks.lock().unwrap().push(locator.to_string());
        }
        Ok(count)
    }

    async fn scroll(&self, _locator: &Locator, _pixels: i64) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn title(&self) -> Result<String, BrowserError> {
        self.state
            .page
            .title
            .clone()
            .ok_or_else(|| BrowserError::ElementNotFound("title".to_string()))
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.state
            .page
            .markup
            .clone()
            .ok_or_else(|| BrowserError::Script("document unavailable".to_string()))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError> {
        self.state.screenshots.fetch_add(1, Ordering::SeqCst);
        Ok(b"\x89PNG fake".to_vec())
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.state.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out sessions that all share one [`FakeState`].
pub struct FakeLauncher {
    pub state: Arc<FakeState>,
}

impl FakeLauncher {
    pub fn new(page: FakePage) -> Self {
        Self {
            state: FakeSession::new(page).state,
        }
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(
        &self,
        _profile: &SessionProfile,
    ) -> Result<Box<dyn BrowserSession>, BrowserError> {
        if self.state.page.fail_launch {
            return Err(BrowserError::Launch("no browser binary".to_string()));
        }
        Ok(Box::new(FakeSession {
            state: Arc::clone(&self.state),
        }))
    }
}

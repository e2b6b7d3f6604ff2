use async_trait::async_trait;
use chromiumoxide::Handler;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, NavigateParams,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::browser::{
    BrowserError, BrowserLauncher, BrowserSession, Locator, SessionProfile, setup,
};
use crate::config::WaitMode;

const POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Quiet period with no new resource entries before the network counts as idle.
const NETWORK_IDLE_WINDOW: Duration = Duration::from_millis(500);

const HIDE_WEBDRIVER_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

/// Launches a headless Chromium per session.
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher;

impl ChromiumLauncher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    #[instrument(skip_all)]
    async fn launch(
        &self,
        profile: &SessionProfile,
    ) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let executable = setup::resolve_executable(profile.executable.as_deref());

        let (browser, mut handler) = match launch_browser(profile, executable.as_deref()).await {
            Ok(pair) => pair,
            Err(e) if executable.is_some() => {
                warn!(error = %e, "system browser failed to start, retrying with auto-detection");
                launch_browser(profile, None).await?
            }
            Err(e) => return Err(e),
        };

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "chromiumoxide handler event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(BrowserError::Launch(format!("failed to open page: {e}")));
            }
        };

        if let Err(e) = page
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(
                HIDE_WEBDRIVER_SCRIPT,
            ))
            .await
        {
            debug!(error = %e, "could not install webdriver masking script");
        }

        Ok(Box::new(ChromiumSession {
            browser: Mutex::new(browser),
            page,
            handler_task,
        }))
    }
}

async fn launch_browser(
    profile: &SessionProfile,
    executable: Option<&Path>,
) -> Result<(Browser, Handler), BrowserError> {
    let mut builder = BrowserConfig::builder()
        .arg("--no-sandbox")
        .arg("--disable-setuid-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-gpu")
        .arg("--disable-blink-features=AutomationControlled")
        .arg(format!("--user-agent={}", profile.user_agent))
        .window_size(profile.viewport.0, profile.viewport.1)
        .viewport(page_viewport(profile))
        .request_timeout(profile.request_timeout);

    if let Some(path) = executable {
        builder = builder.chrome_executable(path);
    }

    let config = builder.build().map_err(BrowserError::Launch)?;

    Browser::launch(config)
        .await
        .map_err(|e| BrowserError::Launch(e.to_string()))
}

/// The emulated viewport otherwise stays at the driver's 800x600 default.
fn page_viewport(profile: &SessionProfile) -> Viewport {
    let (width, height) = profile.viewport;
    Viewport {
        width,
        height,
        ..Default::default()
    }
}

pub struct ChromiumSession {
    browser: Mutex<Browser>,
    page: Page,
    handler_task: JoinHandle<()>,
}

#[derive(Debug, Deserialize)]
struct ReadyProbe {
    state: String,
    href: String,
    resources: usize,
}

#[derive(Debug, Deserialize)]
struct TextProbe {
    found: bool,
    text: String,
}

impl ChromiumSession {
    async fn eval<T: DeserializeOwned>(&self, script: &str) -> Result<T, BrowserError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| BrowserError::Script(e.to_string()))
    }

    async fn count(&self, locator: &Locator) -> Result<usize, BrowserError> {
        self.eval(&format!("({}).length", locator.to_js())).await
    }

    async fn wait_until_ready(&self, mode: WaitMode) {
        let mut idle_since: Option<(Instant, usize)> = None;

        loop {
            // Evaluation fails while the old document is torn down; keep polling.
            if let Ok(probe) = self
                .eval::<ReadyProbe>(
                    "(() => ({ state: document.readyState, href: location.href, resources: performance.getEntriesByType('resource').length }))()",
                )
                .await
                && probe.href != "about:blank"
            {
                match mode {
                    WaitMode::DomContentLoaded if probe.state != "loading" => return,
                    WaitMode::Load if probe.state == "complete" => return,
                    WaitMode::NetworkIdle if probe.state == "complete" => match idle_since {
                        Some((since, seen)) if seen == probe.resources => {
                            if since.elapsed() >= NETWORK_IDLE_WINDOW {
                                return;
                            }
                        }
                        _ => idle_since = Some((Instant::now(), probe.resources)),
                    },
                    _ => {}
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    #[instrument(skip(self), fields(url = %url))]
    async fn goto(
        &self,
        url: &str,
        mode: WaitMode,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let navigation = async {
            let response = self
                .page
                .execute(NavigateParams::new(url))
                .await
                .map_err(|e| BrowserError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

            if let Some(reason) = response.result.error_text.clone() {
                return Err(BrowserError::Navigation {
                    url: url.to_string(),
                    reason,
                });
            }

            self.wait_until_ready(mode).await;
            Ok(())
        };

        tokio::time::timeout(timeout, navigation)
            .await
            .map_err(|_| BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout,
            })?
    }

    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<(), BrowserError> {
        let wait = async {
            loop {
                if matches!(self.count(locator).await, Ok(n) if n > 0) {
                    return;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| BrowserError::WaitTimeout {
                locator: locator.to_string(),
                timeout,
            })
    }

    async fn text(&self, locator: &Locator) -> Result<String, BrowserError> {
        let script = format!(
            "(() => {{ const els = {}; return els.length ? {{ found: true, text: els[0].innerText || els[0].textContent || '' }} : {{ found: false, text: '' }}; }})()",
            locator.to_js()
        );
        let probe: TextProbe = self.eval(&script).await?;
        if !probe.found {
            return Err(BrowserError::ElementNotFound(locator.to_string()));
        }
        Ok(probe.text)
    }

    async fn texts(&self, locator: &Locator) -> Result<Vec<String>, BrowserError> {
        self.eval(&format!(
            "({}).map(e => e.innerText || e.textContent || '')",
            locator.to_js()
        ))
        .await
    }

    async fn click(&self, locator: &Locator, timeout: Duration) -> Result<(), BrowserError> {
        self.wait_for(locator, timeout).await?;
        let clicked: bool = self
            .eval(&format!(
                "(() => {{ const els = {}; if (!els.length) return false; els[0].click(); return true; }})()",
                locator.to_js()
            ))
            .await?;
        if !clicked {
            return Err(BrowserError::ElementNotFound(locator.to_string()));
        }
        Ok(())
    }

    async fn click_all(&self, locator: &Locator) -> Result<usize, BrowserError> {
        self.eval(&format!(
            "(() => {{ const els = {}; els.forEach(e => e.click()); return els.length; }})()",
            locator.to_js()
        ))
        .await
    }

    async fn scroll(&self, locator: &Locator, pixels: i64) -> Result<(), BrowserError> {
        let _: bool = self
            .eval(&format!(
                "(() => {{ const els = {}; if (els.length) {{ els[0].scrollBy(0, {pixels}); }} else {{ window.scrollBy(0, {pixels}); }} return true; }})()",
                locator.to_js()
            ))
            .await?;
        Ok(())
    }

    async fn title(&self) -> Result<String, BrowserError> {
        self.page
            .get_title()
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?
            .ok_or_else(|| BrowserError::ElementNotFound("title".to_string()))
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.page
            .content()
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError> {
        self.page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .map_err(|e| BrowserError::Screenshot(e.to_string()))
    }

    async fn close(&self) -> Result<(), BrowserError> {
        if let Err(e) = self.page.clone().close().await {
            debug!(error = %e, "page close error");
        }

        let mut browser = self.browser.lock().await;
        let closed = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::Script(format!("browser close failed: {e}")));
        if let Err(e) = browser.wait().await {
            debug!(error = %e, "waiting for browser exit failed");
        }
        self.handler_task.abort();
        closed
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

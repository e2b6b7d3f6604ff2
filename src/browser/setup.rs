//! One-time browser environment preparation.
//!
//! Hosts that ship without a browser can set an install command; it runs at
//! most once per process, before the first launch. Later calls return
//! immediately.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

static ENVIRONMENT_PREPARED: AtomicBool = AtomicBool::new(false);
static PREPARE_LOCK: Mutex<()> = Mutex::const_new(());

/// Well-known locations of a system Chromium, probed in order.
const SYSTEM_BROWSER_PATHS: [&str; 4] = [
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
];

pub fn is_prepared() -> bool {
    ENVIRONMENT_PREPARED.load(Ordering::Acquire)
}

/// Run the optional install command once. Safe to call from any number of
/// entry points; a failing command is logged and still marks the environment
/// as prepared, since the launcher falls back to auto-detection anyway.
#[instrument(skip_all)]
pub async fn prepare_environment(install_cmd: Option<&str>) {
    if is_prepared() {
        return;
    }

    let _guard = PREPARE_LOCK.lock().await;
    if is_prepared() {
        return;
    }

    if let Some(cmd) = install_cmd {
        run_install_command(cmd).await;
    }

    ENVIRONMENT_PREPARED.store(true, Ordering::Release);
    info!("browser environment prepared");
}

async fn run_install_command(cmd: &str) {
    let mut parts = cmd.split_whitespace();
    let Some(program) = parts.next() else {
        return;
    };

    info!(command = %cmd, "running browser install command");
    match Command::new(program).args(parts).status().await {
        Ok(status) if status.success() => info!("browser install command finished"),
        Ok(status) => warn!(%status, "browser install command exited unsuccessfully"),
        Err(e) => warn!(error = %e, "browser install command could not be started"),
    }
}

/// Pick the browser binary: the configured path if it exists, otherwise the
/// first system install found. `None` defers to the driver's own detection.
pub fn resolve_executable(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        warn!(path = %path.display(), "configured browser executable not found");
    }

    SYSTEM_BROWSER_PATHS
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}

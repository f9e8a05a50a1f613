use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use ferry_core::error::AppError;
use ferry_core::models::RawRecord;
use ferry_core::traits::RecordSource;
use futures::StreamExt;

use crate::selectors::{ACTION_CONTROL, RECORD, TIME_VALUE, USER_AGENT};

const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);
const ATTACH_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Headless-browser record source using Chromium via the Chrome DevTools Protocol.
///
/// The schedule rows are rendered client-side, so this is the source to use
/// against the live site. A single Chromium process is shared across all
/// clones; each [`RecordSource::fetch_records`] call opens a tab, waits for
/// the rows to attach, reads them out and closes the tab.
///
/// # Example
///
/// ```rust,no_run
/// use ferry_client::BrowserRecordSource;
/// use ferry_core::traits::RecordSource;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let source = BrowserRecordSource::new().await?;
/// let records = source
///     .fetch_records("https://meinefaehre.faehre.de/fahrplanauskunft?departure_harbor=DEWYK&arrival_harbor=DEDAG&date=2026-01-02")
///     .await?;
/// println!("{} rows", records.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BrowserRecordSource {
    browser: Arc<Browser>,
    navigation_timeout: Duration,
    wait_timeout: Duration,
}

impl BrowserRecordSource {
    /// Launches headless Chromium with a 60 s navigation timeout and a
    /// 30 s wait for schedule rows.
    pub async fn new() -> Result<Self, AppError> {
        Self::with_timeouts(DEFAULT_NAVIGATION_TIMEOUT, DEFAULT_WAIT_TIMEOUT).await
    }

    pub async fn with_timeouts(
        navigation_timeout: Duration,
        wait_timeout: Duration,
    ) -> Result<Self, AppError> {
        let mut builder = BrowserConfig::builder();
        builder = builder.no_sandbox().disable_default_args();

        // Snap-packaged Chromium exposes a wrapper that rejects standard
        // Chrome CLI flags (--headless, --disable-gpu, …), so prefer the
        // real binary when one can be found.
        if let Some(bin) = Self::find_chrome_binary() {
            tracing::info!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }

        let config = builder
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-popup-blocking")
            .arg("--disable-translate")
            .arg("--no-first-run")
            .build()
            .map_err(|e| AppError::BrowserError(format!("Browser config error: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled continuously for the connection to work.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::warn!("Browser CDP handler error: {event:?}");
                    break;
                }
            }
        });

        Ok(Self {
            browser: Arc::new(browser),
            navigation_timeout,
            wait_timeout,
        })
    }

    /// Tries to locate the real Chrome/Chromium binary.
    ///
    /// `CHROME_BIN` wins when it points at an existing file; otherwise the
    /// snap-internal binary and well-known system paths are tried. `None`
    /// lets `chromiumoxide` do its own lookup.
    fn find_chrome_binary() -> Option<PathBuf> {
        let candidates: &[&str] = &[
            // Snap (Ubuntu default)
            "/snap/chromium/current/usr/lib/chromium-browser/chrome",
            // Flatpak
            "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
        ];

        if let Ok(p) = std::env::var("CHROME_BIN") {
            let path = PathBuf::from(&p);
            if path.exists() {
                return Some(path);
            }
        }

        candidates.iter().map(PathBuf::from).find(|p| p.exists())
    }

    async fn open(&self, url: &str) -> Result<Page, AppError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to open tab: {e}")))?;

        match self.prepare(&page, url).await {
            Ok(()) => Ok(page),
            Err(e) => {
                // Any setup failure leaves the tab behind otherwise.
                let _ = page.close().await;
                Err(e)
            }
        }
    }

    async fn prepare(&self, page: &Page, url: &str) -> Result<(), AppError> {
        page.set_user_agent(SetUserAgentOverrideParams::new(USER_AGENT))
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to set user agent: {e}")))?;

        match tokio::time::timeout(self.navigation_timeout, page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(AppError::BrowserError(format!(
                "Failed to navigate to {url}: {e}"
            ))),
            Err(_) => Err(AppError::Timeout(self.navigation_timeout.as_secs())),
        }
    }

    /// Poll until at least one record element is attached.
    ///
    /// Returns false when the wait timeout elapses first.
    async fn wait_for_records(&self, page: &Page) -> bool {
        let attached = async {
            loop {
                if let Ok(elements) = page.find_elements(RECORD).await
                    && !elements.is_empty()
                {
                    return;
                }
                tokio::time::sleep(ATTACH_POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(self.wait_timeout, attached).await.is_ok()
    }

    async fn read_records(&self, page: &Page) -> Result<Vec<RawRecord>, AppError> {
        page.evaluate(extract_script())
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to read records: {e}")))?
            .into_value::<Vec<RawRecord>>()
            .map_err(AppError::from)
    }
}

impl RecordSource for BrowserRecordSource {
    async fn fetch_records(&self, url: &str) -> Result<Vec<RawRecord>, AppError> {
        let page = self.open(url).await?;

        let result = if self.wait_for_records(&page).await {
            self.read_records(&page).await
        } else {
            tracing::debug!(
                %url,
                wait_secs = self.wait_timeout.as_secs(),
                "No schedule records attached"
            );
            Ok(Vec::new())
        };

        // Close the tab to free browser resources.
        let _ = page.close().await;
        result
    }
}

/// In-page script returning one [`RawRecord`] per row.
///
/// Mirrors what a user sees: `innerText` of the row, the texts of its time
/// elements and whether its first action button is actually rendered.
fn extract_script() -> String {
    let record = serde_json::to_string(RECORD).unwrap_or_default();
    let time_value = serde_json::to_string(TIME_VALUE).unwrap_or_default();
    let action = serde_json::to_string(ACTION_CONTROL).unwrap_or_default();
    format!(
        r#"(() => Array.from(document.querySelectorAll({record})).map(el => {{
    const btn = el.querySelector({action});
    const visible = !!btn && !!(btn.offsetWidth || btn.offsetHeight || btn.getClientRects().length);
    return {{
        text: el.innerText || "",
        time_texts: Array.from(el.querySelectorAll({time_value})).map(t => (t.innerText || "").trim()),
        has_action_control: visible,
    }};
}}))()"#
    )
}

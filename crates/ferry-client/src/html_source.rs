use std::sync::LazyLock;
use std::time::Duration;

use ferry_core::error::AppError;
use ferry_core::models::RawRecord;
use ferry_core::traits::RecordSource;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::selectors::{ACTION_CONTROL, RECORD, TIME_VALUE, USER_AGENT};

static RECORD_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(RECORD).expect("static selector"));
static TIME_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(TIME_VALUE).expect("static selector"));
static ACTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(ACTION_CONTROL).expect("static selector"));

/// Record source for server-rendered schedule pages.
///
/// Downloads the page with reqwest and picks the record elements out of the
/// static HTML. Cheaper than `BrowserRecordSource` but blind to
/// rows that are only inserted by client-side scripts.
#[derive(Clone)]
pub struct HtmlRecordSource {
    client: Client,
    timeout_secs: u64,
}

impl HtmlRecordSource {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: timeout.as_secs(),
        })
    }
}

impl RecordSource for HtmlRecordSource {
    async fn fetch_records(&self, url: &str) -> Result<Vec<RawRecord>, AppError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))?;

        let records = records_from_html(&html);
        tracing::debug!(%url, bytes = html.len(), records = records.len(), "Parsed schedule page");
        Ok(records)
    }
}

/// Extract every schedule record element from a page, in document order.
pub fn records_from_html(html: &str) -> Vec<RawRecord> {
    let document = Html::parse_document(html);
    document.select(&RECORD_SEL).map(record_from_element).collect()
}

fn record_from_element(element: ElementRef<'_>) -> RawRecord {
    let time_texts = element
        .select(&TIME_SEL)
        .map(element_text)
        .collect();

    let has_action_control = element.select(&ACTION_SEL).any(is_visible);

    RawRecord {
        text: element_text(element),
        time_texts,
        has_action_control,
    }
}

/// Text nodes joined line by line, roughly what `innerText` gives for rows
/// laid out as blocks.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Best effort without a layout engine: hidden or disabled buttons and
/// inline `display: none` count as not visible.
fn is_visible(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if value.attr("hidden").is_some() || value.attr("disabled").is_some() {
        return false;
    }
    match value.attr("style") {
        Some(style) => {
            let style: String = style.chars().filter(|c| !c.is_whitespace()).collect();
            let style = style.to_lowercase();
            !style.contains("display:none") && !style.contains("visibility:hidden")
        }
        None => true,
    }
}

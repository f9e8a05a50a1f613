use std::time::Duration;

use ferry_core::error::AppError;
use ferry_core::models::Notification;
use ferry_core::traits::Notifier;
use reqwest::Client;

pub const DEFAULT_NTFY_SERVER: &str = "https://ntfy.sh";
const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(15);

/// Push notifications via an ntfy server.
///
/// Messages are POSTed as plain text to `{server}/{topic}` with the title
/// and priority in headers. Without a topic the notifier only logs what it
/// would have sent.
#[derive(Clone)]
pub struct NtfyNotifier {
    client: Client,
    server: String,
    topic: Option<String>,
    timeout_secs: u64,
}

impl NtfyNotifier {
    pub fn new(topic: Option<String>) -> Result<Self, AppError> {
        Self::with_server(topic, DEFAULT_NTFY_SERVER)
    }

    pub fn with_server(topic: Option<String>, server: &str) -> Result<Self, AppError> {
        Self::build(topic, server, DEFAULT_NOTIFY_TIMEOUT)
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self, AppError> {
        Self::build(self.topic, &self.server, timeout)
    }

    fn build(topic: Option<String>, server: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            server: server.trim_end_matches('/').to_string(),
            topic: topic.filter(|t| !t.trim().is_empty()),
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.topic.is_some()
    }

    fn topic_url(&self, topic: &str) -> String {
        format!("{}/{}", self.server, topic)
    }
}

impl Notifier for NtfyNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), AppError> {
        let Some(topic) = &self.topic else {
            tracing::warn!(
                body = %notification.body,
                "NTFY_TOPIC not set, skipping notification"
            );
            return Ok(());
        };

        let response = self
            .client
            .post(self.topic_url(topic))
            .header("Title", notification.title.as_str())
            .header("Priority", notification.priority.as_str())
            .body(notification.body.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(self.timeout_secs)
                } else {
                    AppError::NotificationError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::NotificationError(format!(
                "ntfy returned HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        tracing::info!(%topic, "Notification sent via ntfy");
        Ok(())
    }
}

//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::models::{Connection, ExportDocument, Notification, QueryConstraints, RawRecord};
use crate::query::{DEFAULT_BASE_URL, booking_url};
use crate::traits::{ConnectionQuery, ExportSink, Notifier, RecordSource};

/// A bookable, vehicle-capable DEWYK → DEDAG connection.
pub fn make_connection(date: &str, departure_time: &str) -> Connection {
    Connection {
        date: date.to_string(),
        departure_time: departure_time.to_string(),
        arrival_time: String::new(),
        departure_harbor: "DEWYK".to_string(),
        arrival_harbor: "DEDAG".to_string(),
        available: true,
        only_persons: false,
        booking_url: booking_url(DEFAULT_BASE_URL, "DEWYK", "DEDAG", date),
        raw_text: format!("{departure_time} AUSWÄHLEN"),
    }
}

// ---------------------------------------------------------------------------
// MockRecordSource
// ---------------------------------------------------------------------------

/// Mock record source that returns configurable records and records URLs.
#[derive(Clone)]
pub struct MockRecordSource {
    /// Queue of responses. Each call pops the first element.
    responses: Arc<Mutex<Vec<Result<Vec<RawRecord>, AppError>>>>,
    /// Returned for every call once the queue is empty.
    fallback: Vec<RawRecord>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl MockRecordSource {
    /// Same records for every date.
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            fallback: records,
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// One response per call, then empty record lists.
    pub fn with_responses(responses: Vec<Result<Vec<RawRecord>, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            fallback: Vec::new(),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl RecordSource for MockRecordSource {
    async fn fetch_records(&self, url: &str) -> Result<Vec<RawRecord>, AppError> {
        self.requested.lock().unwrap().push(url.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.fallback.clone())
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockQuery
// ---------------------------------------------------------------------------

/// Mock query returning one queued result per cycle.
#[derive(Clone)]
pub struct MockQuery {
    responses: Arc<Mutex<Vec<Result<Vec<Connection>, AppError>>>>,
    calls: Arc<Mutex<usize>>,
    cancel_on_drain: Option<CancellationToken>,
}

impl MockQuery {
    pub fn with_responses(responses: Vec<Result<Vec<Connection>, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(0)),
            cancel_on_drain: None,
        }
    }

    /// Cancel `token` as soon as the last queued response has been handed out.
    pub fn cancel_when_drained(mut self, token: CancellationToken) -> Self {
        self.cancel_on_drain = Some(token);
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl ConnectionQuery for MockQuery {
    async fn query(&self, _constraints: &QueryConstraints) -> Result<Vec<Connection>, AppError> {
        *self.calls.lock().unwrap() += 1;
        let mut responses = self.responses.lock().unwrap();
        let result = if responses.is_empty() {
            Ok(Vec::new())
        } else {
            responses.remove(0)
        };
        if responses.is_empty()
            && let Some(token) = &self.cancel_on_drain
        {
            token.cancel();
        }
        result
    }
}

// ---------------------------------------------------------------------------
// MockNotifier
// ---------------------------------------------------------------------------

/// Mock notifier that records every delivery attempt.
#[derive(Clone)]
pub struct MockNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    attempts: Arc<Mutex<usize>>,
    error: Option<Arc<AppError>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            attempts: Arc::new(Mutex::new(0)),
            error: None,
        }
    }

    /// Every delivery fails with a copy of `error`'s message.
    pub fn failing(error: AppError) -> Self {
        Self {
            error: Some(Arc::new(error)),
            ..Self::new()
        }
    }

    /// Successfully delivered notifications.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

impl Notifier for MockNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), AppError> {
        *self.attempts.lock().unwrap() += 1;
        if let Some(e) = &self.error {
            return Err(AppError::NotificationError(e.to_string()));
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockExportSink
// ---------------------------------------------------------------------------

/// Mock export sink that keeps written documents in memory.
#[derive(Clone)]
pub struct MockExportSink {
    written: Arc<Mutex<Vec<ExportDocument>>>,
    error: Arc<Mutex<Option<AppError>>>,
}

impl MockExportSink {
    pub fn new() -> Self {
        Self {
            written: Arc::new(Mutex::new(Vec::new())),
            error: Arc::new(Mutex::new(None)),
        }
    }

    /// The next write fails with `error`.
    pub fn failing(error: AppError) -> Self {
        Self {
            written: Arc::new(Mutex::new(Vec::new())),
            error: Arc::new(Mutex::new(Some(error))),
        }
    }

    pub fn written(&self) -> Vec<ExportDocument> {
        self.written.lock().unwrap().clone()
    }
}

impl ExportSink for MockExportSink {
    async fn write(&self, document: &ExportDocument) -> Result<(), AppError> {
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        self.written.lock().unwrap().push(document.clone());
        Ok(())
    }
}

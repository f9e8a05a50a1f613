use std::future::Future;

use crate::error::AppError;
use crate::models::{Connection, ExportDocument, Notification, QueryConstraints, RawRecord};

/// Renders a schedule page and returns its candidate record elements.
///
/// Implementations bound their own wait time. "No records within the
/// timeout" is `Ok(vec![])`; navigation and transport problems are errors.
pub trait RecordSource: Send + Sync + Clone {
    fn fetch_records(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Vec<RawRecord>, AppError>> + Send;
}

/// Delivers a push notification.
pub trait Notifier: Send + Sync + Clone {
    fn notify(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Persists the export document (single-shot mode only).
pub trait ExportSink: Send + Sync + Clone {
    fn write(&self, document: &ExportDocument)
    -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Anything that can answer a full multi-date query.
///
/// Implemented by [`crate::query::QueryService`]; the watcher depends on
/// this rather than on a concrete record source.
pub trait ConnectionQuery: Send + Sync {
    fn query(
        &self,
        constraints: &QueryConstraints,
    ) -> impl Future<Output = Result<Vec<Connection>, AppError>> + Send;
}

/// A no-op Notifier for runs that should only log.
#[derive(Debug, Clone)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), AppError> {
        tracing::debug!(title = %notification.title, "Notification suppressed");
        Ok(())
    }
}

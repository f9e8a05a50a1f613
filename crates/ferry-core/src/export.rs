use chrono::Utc;

use crate::error::AppError;
use crate::models::{ExportDocument, QueryConstraints};
use crate::traits::{ConnectionQuery, ExportSink};

/// Single-shot export: one query, full filtered result, no deduplication.
///
/// Unlike the watch loop, a failed query ends the run with the error.
/// Returns the number of connections written.
pub async fn run_export<Q, S>(
    query: &Q,
    constraints: &QueryConstraints,
    sink: &S,
) -> Result<usize, AppError>
where
    Q: ConnectionQuery,
    S: ExportSink,
{
    let connections = query.query(constraints).await?;
    let document = ExportDocument::new(&connections, Utc::now());
    sink.write(&document).await?;

    tracing::info!(connections = connections.len(), "Export written");
    Ok(connections.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;

    fn constraints() -> QueryConstraints {
        QueryConstraints::available("DEWYK", "DEDAG", vec!["2026-01-02".into()])
    }

    #[tokio::test]
    async fn writes_every_connection_including_repeats() {
        let conn = make_connection("2026-01-02", "10:00");
        let query = MockQuery::with_responses(vec![
            Ok(vec![conn.clone()]),
            Ok(vec![conn.clone(), make_connection("2026-01-02", "12:00")]),
        ]);
        let sink = MockExportSink::new();

        assert_eq!(run_export(&query, &constraints(), &sink).await.unwrap(), 1);
        assert_eq!(run_export(&query, &constraints(), &sink).await.unwrap(), 2);

        let written = sink.written();
        assert_eq!(written.len(), 2);
        assert_eq!(written[1].connections.len(), 2);
        assert_eq!(written[1].connections[0].departure_time, "10:00");
    }

    #[tokio::test]
    async fn empty_result_still_writes_document() {
        let query = MockQuery::with_responses(vec![Ok(vec![])]);
        let sink = MockExportSink::new();

        assert_eq!(run_export(&query, &constraints(), &sink).await.unwrap(), 0);
        assert!(sink.written()[0].connections.is_empty());
    }

    #[tokio::test]
    async fn query_failure_aborts_without_writing() {
        let query = MockQuery::with_responses(vec![Err(AppError::InvalidConstraints(
            "no dates".into(),
        ))]);
        let sink = MockExportSink::new();

        let err = run_export(&query, &constraints(), &sink).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidConstraints(_)));
        assert!(sink.written().is_empty());
    }

    #[tokio::test]
    async fn sink_failure_propagates() {
        let query = MockQuery::with_responses(vec![Ok(vec![])]);
        let sink = MockExportSink::failing(AppError::ExportError("read-only fs".into()));

        let err = run_export(&query, &constraints(), &sink).await.unwrap_err();

        assert!(matches!(err, AppError::ExportError(_)));
    }
}

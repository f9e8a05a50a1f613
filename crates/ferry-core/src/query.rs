use crate::error::AppError;
use crate::filter::classify;
use crate::models::{Connection, DateOutcome, QueryConstraints};
use crate::parser::{RecordContext, RecordLabels, parse_record};
use crate::traits::{ConnectionQuery, RecordSource};

/// Public schedule lookup of the North Frisian ferry operator.
pub const DEFAULT_BASE_URL: &str = "https://meinefaehre.faehre.de/fahrplanauskunft";

/// Build the schedule URL for one route and date.
pub fn booking_url(base_url: &str, departure: &str, arrival: &str, date: &str) -> String {
    format!("{base_url}?departure_harbor={departure}&arrival_harbor={arrival}&date={date}")
}

/// Orchestrates a multi-date query: fetch → parse → filter, one date at a time.
///
/// Generic over the record source so tests can run without a browser.
/// Per-date failures are isolated: a date whose records cannot be fetched
/// contributes nothing and the remaining dates are still queried.
pub struct QueryService<R>
where
    R: RecordSource,
{
    source: R,
    base_url: String,
    labels: RecordLabels,
}

impl<R> QueryService<R>
where
    R: RecordSource,
{
    pub fn new(source: R) -> Self {
        Self::with_base_url(source, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(source: R, base_url: &str) -> Self {
        Self {
            source,
            base_url: base_url.trim_end_matches('/').to_string(),
            labels: RecordLabels::default(),
        }
    }

    pub fn with_labels(mut self, labels: RecordLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query every date in order and concatenate the kept connections.
    ///
    /// Only malformed constraints are an error; fetch failures are logged
    /// and absorbed per date.
    pub async fn query(&self, constraints: &QueryConstraints) -> Result<Vec<Connection>, AppError> {
        constraints.validate()?;

        let mut all = Vec::new();
        for date in &constraints.dates {
            let outcome = self.query_date(constraints, date).await;
            all.extend(outcome.into_connections());
        }

        tracing::info!(
            dates = constraints.dates.len(),
            connections = all.len(),
            "Query complete"
        );
        Ok(all)
    }

    /// Query a single date. Never fails; see [`DateOutcome`].
    pub async fn query_date(&self, constraints: &QueryConstraints, date: &str) -> DateOutcome {
        let url = booking_url(
            &self.base_url,
            &constraints.departure,
            &constraints.arrival,
            date,
        );

        tracing::debug!(%date, stage = "fetch", %url, "Fetching schedule records");
        let records = match self.source.fetch_records(&url).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    %date,
                    stage = "fetch",
                    error = %e,
                    retryable = e.is_retryable(),
                    "Failed to fetch schedule records"
                );
                return DateOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let ctx = RecordContext {
            date,
            departure: &constraints.departure,
            arrival: &constraints.arrival,
            booking_url: &url,
        };

        let mut kept = Vec::new();
        for record in &records {
            let connection = parse_record(record, ctx, &self.labels);
            let verdict = classify(&connection, constraints);
            if verdict.is_keep() {
                kept.push(connection);
            } else {
                tracing::debug!(
                    %date,
                    stage = "filter",
                    departure_time = %connection.departure_time,
                    reason = %verdict,
                    "Connection filtered out"
                );
            }
        }

        tracing::info!(%date, records = records.len(), kept = kept.len(), "Date checked");

        if kept.is_empty() {
            DateOutcome::Empty
        } else {
            DateOutcome::Found(kept)
        }
    }
}

impl<R> ConnectionQuery for QueryService<R>
where
    R: RecordSource,
{
    async fn query(&self, constraints: &QueryConstraints) -> Result<Vec<Connection>, AppError> {
        QueryService::query(self, constraints).await
    }
}

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One sailing on one queried date, as read from the schedule page.
///
/// `date`, the harbor codes and `booking_url` come from the query context;
/// only the times and the two flags are recovered from the record itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub date: String,
    /// `HH:MM`, or empty when the record carried no recognisable time.
    pub departure_time: String,
    /// `HH:MM`, or empty when the record carried no recognisable time.
    pub arrival_time: String,
    pub departure_harbor: String,
    pub arrival_harbor: String,
    pub available: bool,
    /// Foot passengers only, no vehicle capacity.
    pub only_persons: bool,
    pub booking_url: String,
    /// Newline-collapsed, trimmed record text.
    pub raw_text: String,
}

impl Connection {
    pub fn identity(&self) -> ConnectionIdentity {
        ConnectionIdentity {
            date: self.date.clone(),
            departure_time: self.departure_time.clone(),
            departure_harbor: self.departure_harbor.clone(),
            arrival_harbor: self.arrival_harbor.clone(),
        }
    }
}

/// Deduplication key: the same slot across polls, regardless of how the
/// record text changed in between.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionIdentity {
    pub date: String,
    pub departure_time: String,
    pub departure_harbor: String,
    pub arrival_harbor: String,
}

impl fmt::Display for ConnectionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}->{}",
            self.date, self.departure_time, self.departure_harbor, self.arrival_harbor
        )
    }
}

/// Caller-supplied constraints for one orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryConstraints {
    pub departure: String,
    pub arrival: String,
    /// Queried in this order.
    pub dates: Vec<String>,
    /// Inclusive lower bound on `departure_time`, `HH:MM`.
    pub time_from: Option<String>,
    /// Inclusive upper bound on `departure_time`, `HH:MM`.
    pub time_to: Option<String>,
    pub only_available: bool,
    pub exclude_only_persons: bool,
}

impl QueryConstraints {
    /// Bookable connections with vehicle capacity only.
    pub fn available(departure: &str, arrival: &str, dates: Vec<String>) -> Self {
        Self {
            departure: departure.to_string(),
            arrival: arrival.to_string(),
            dates,
            time_from: None,
            time_to: None,
            only_available: true,
            exclude_only_persons: true,
        }
    }

    pub fn with_time_window(mut self, from: Option<String>, to: Option<String>) -> Self {
        self.time_from = from;
        self.time_to = to;
        self
    }

    /// Reject constraints that cannot be queried meaningfully.
    ///
    /// Lexicographic time comparison in the filter relies on the bounds
    /// being fixed-width `HH:MM`, so that shape is enforced here.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.departure.trim().is_empty() {
            return Err(AppError::InvalidConstraints(
                "departure harbor is empty".into(),
            ));
        }
        if self.arrival.trim().is_empty() {
            return Err(AppError::InvalidConstraints(
                "arrival harbor is empty".into(),
            ));
        }
        if self.dates.is_empty() {
            return Err(AppError::InvalidConstraints(
                "at least one target date is required".into(),
            ));
        }
        for date in &self.dates {
            if !is_valid_date(date) {
                return Err(AppError::InvalidConstraints(format!(
                    "date '{date}' is not YYYY-MM-DD"
                )));
            }
        }
        for (name, bound) in [("time_from", &self.time_from), ("time_to", &self.time_to)] {
            if let Some(t) = bound
                && !is_valid_clock_time(t)
            {
                return Err(AppError::InvalidConstraints(format!(
                    "{name} '{t}' is not HH:MM"
                )));
            }
        }
        if let (Some(from), Some(to)) = (&self.time_from, &self.time_to)
            && from > to
        {
            return Err(AppError::InvalidConstraints(format!(
                "time window {from}-{to} is empty"
            )));
        }
        Ok(())
    }
}

fn is_valid_date(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Fixed-width, zero-padded 24-hour `HH:MM`.
pub fn is_valid_clock_time(s: &str) -> bool {
    s.len() == 5 && NaiveTime::parse_from_str(s, "%H:%M").is_ok()
}

/// One schedule-row element as handed over by a record source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Rendered text of the whole element.
    pub text: String,
    /// Texts of sub-elements explicitly marked up as times, in document order.
    #[serde(default)]
    pub time_texts: Vec<String>,
    /// A visible primary "select/book" button is present.
    #[serde(default)]
    pub has_action_control: bool,
}

impl RawRecord {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Result of querying a single date.
#[derive(Debug, Clone, PartialEq)]
pub enum DateOutcome {
    /// At least one connection survived parsing and filtering.
    Found(Vec<Connection>),
    /// Records were fetched (possibly none) but nothing was kept.
    Empty,
    /// The record source failed; the date contributes nothing this cycle.
    Failed { reason: String },
}

impl DateOutcome {
    pub fn into_connections(self) -> Vec<Connection> {
        match self {
            DateOutcome::Found(connections) => connections,
            DateOutcome::Empty | DateOutcome::Failed { .. } => Vec::new(),
        }
    }
}

/// Priority levels understood by ntfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    Min,
    Low,
    #[default]
    Default,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Min => "min",
            Priority::Low => "low",
            Priority::Default => "default",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A push message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub priority: Priority,
}

pub const NOTIFICATION_TITLE: &str = "Ferry Checker Alert";

impl Notification {
    /// The alert sent when a bookable connection shows up.
    pub fn connection_found(connection: &Connection) -> Self {
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            body: format!(
                "🚢 Ferry Found!\nDate: {}\nTime: {}\nLink: {}",
                connection.date, connection.departure_time, connection.booking_url
            ),
            priority: Priority::High,
        }
    }
}

/// JSON document written in export mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    pub updated_at: DateTime<Utc>,
    pub connections: Vec<ExportedConnection>,
}

impl ExportDocument {
    pub fn new(connections: &[Connection], updated_at: DateTime<Utc>) -> Self {
        Self {
            updated_at,
            connections: connections.iter().map(ExportedConnection::from).collect(),
        }
    }
}

/// The subset of [`Connection`] published in the export file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedConnection {
    pub date: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub departure_harbor: String,
    pub arrival_harbor: String,
    pub booking_url: String,
    pub available: bool,
}

impl From<&Connection> for ExportedConnection {
    fn from(c: &Connection) -> Self {
        Self {
            date: c.date.clone(),
            departure_time: c.departure_time.clone(),
            arrival_time: c.arrival_time.clone(),
            departure_harbor: c.departure_harbor.clone(),
            arrival_harbor: c.arrival_harbor.clone(),
            booking_url: c.booking_url.clone(),
            available: c.available,
        }
    }
}

use std::fmt;

use crate::models::{Connection, QueryConstraints};

/// Why a connection was kept or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    NotAvailable,
    OnlyPersons,
    BeforeWindow,
    AfterWindow,
}

impl Verdict {
    pub fn is_keep(&self) -> bool {
        matches!(self, Verdict::Keep)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Keep => "keep",
            Verdict::NotAvailable => "not available",
            Verdict::OnlyPersons => "foot passengers only",
            Verdict::BeforeWindow => "departs before time window",
            Verdict::AfterWindow => "departs after time window",
        };
        f.write_str(s)
    }
}

/// Apply the constraints in a fixed order, stopping at the first failure.
///
/// Times compare as strings. An empty `departure_time` sorts before any
/// bound, so it is dropped whenever `time_from` is set.
pub fn classify(connection: &Connection, constraints: &QueryConstraints) -> Verdict {
    if constraints.only_available && !connection.available {
        return Verdict::NotAvailable;
    }
    if constraints.exclude_only_persons && connection.only_persons {
        return Verdict::OnlyPersons;
    }
    if let Some(from) = &constraints.time_from
        && connection.departure_time.as_str() < from.as_str()
    {
        return Verdict::BeforeWindow;
    }
    if let Some(to) = &constraints.time_to
        && connection.departure_time.as_str() > to.as_str()
    {
        return Verdict::AfterWindow;
    }
    Verdict::Keep
}

pub fn keep(connection: &Connection, constraints: &QueryConstraints) -> bool {
    classify(connection, constraints).is_keep()
}

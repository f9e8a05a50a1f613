//! Record parsing: turns one rendered schedule row into a [`Connection`].
//!
//! Everything here is a pure function over strings. The heuristics are tied
//! to the markup and display language of the schedule site, so they live
//! behind this narrow module and nothing else inspects record text.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Connection, RawRecord};

static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    // Bounded on both sides so "123:456" style runs never match.
    Regex::new(r"\b(\d{2}:\d{2})\b").expect("static regex")
});

/// Literal phrases the site uses for the signals we classify on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLabels {
    /// Booking button label, matched against the upper-cased text.
    pub booking: String,
    /// "Foot passengers only" marker, matched against the lower-cased text.
    pub only_persons: String,
}

impl Default for RecordLabels {
    fn default() -> Self {
        Self {
            booking: "AUSWÄHLEN".to_string(),
            only_persons: "nur personen".to_string(),
        }
    }
}

/// Query context shared by every record of one date.
#[derive(Debug, Clone, Copy)]
pub struct RecordContext<'a> {
    pub date: &'a str,
    pub departure: &'a str,
    pub arrival: &'a str,
    pub booking_url: &'a str,
}

/// Collapse newlines to spaces and trim.
pub fn normalize_text(text: &str) -> String {
    text.replace('\n', " ").trim().to_string()
}

/// Departure and arrival time, either possibly empty.
///
/// Explicit time sub-texts win when at least two have the `HH:MM` shape;
/// otherwise the first two clock times found in `text` are used.
pub fn extract_times(time_texts: &[String], text: &str) -> (String, String) {
    let explicit: Vec<&str> = time_texts
        .iter()
        .map(|t| t.trim())
        .filter(|t| t.contains(':') && t.chars().count() == 5)
        .collect();

    if let [departure, arrival, ..] = explicit.as_slice() {
        return (departure.to_string(), arrival.to_string());
    }

    let mut matches = CLOCK_TIME.find_iter(text).map(|m| m.as_str().to_string());
    let departure = matches.next().unwrap_or_default();
    let arrival = matches.next().unwrap_or_default();
    (departure, arrival)
}

/// Either signal is enough; the rendering does not always expose both.
pub fn is_available(record: &RawRecord, normalized: &str, labels: &RecordLabels) -> bool {
    record.has_action_control || normalized.to_uppercase().contains(&labels.booking)
}

pub fn is_only_persons(normalized: &str, labels: &RecordLabels) -> bool {
    normalized.to_lowercase().contains(&labels.only_persons)
}

/// Parse one record.
///
/// Every record yields a connection. Whatever cannot be recovered (times,
/// text) is left empty; classification still runs on the rest.
pub fn parse_record(
    record: &RawRecord,
    ctx: RecordContext<'_>,
    labels: &RecordLabels,
) -> Connection {
    let raw_text = normalize_text(&record.text);
    let (departure_time, arrival_time) = extract_times(&record.time_texts, &raw_text);
    let available = is_available(record, &raw_text, labels);
    let only_persons = is_only_persons(&raw_text, labels);

    Connection {
        date: ctx.date.to_string(),
        departure_time,
        arrival_time,
        departure_harbor: ctx.departure.to_string(),
        arrival_harbor: ctx.arrival.to_string(),
        available,
        only_persons,
        booking_url: ctx.booking_url.to_string(),
        raw_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://example.com/fahrplanauskunft?departure_harbor=DEWYK&arrival_harbor=DEDAG&date=2026-01-02";

    fn ctx() -> RecordContext<'static> {
        RecordContext {
            date: "2026-01-02",
            departure: "DEWYK",
            arrival: "DEDAG",
            booking_url: URL,
        }
    }

    fn parse(record: &RawRecord) -> Connection {
        parse_record(record, ctx(), &RecordLabels::default())
    }

    #[test]
    fn explicit_time_texts_take_precedence() {
        let record = RawRecord {
            text: "10:00 Wyk 11:00 Dagebüll".into(),
            time_texts: vec!["08:15".into(), "09:05".into()],
            has_action_control: false,
        };
        let c = parse(&record);
        assert_eq!(c.departure_time, "08:15");
        assert_eq!(c.arrival_time, "09:05");
    }

    #[test]
    fn explicit_time_texts_are_trimmed_and_shape_checked() {
        let record = RawRecord {
            text: "Abfahrt 07:30 Ankunft 08:20".into(),
            // Only one qualifies, so fall back to the free text.
            time_texts: vec![" 12:45 ".into(), "ca. 13".into(), "13:5".into()],
            has_action_control: false,
        };
        let c = parse(&record);
        assert_eq!(c.departure_time, "07:30");
        assert_eq!(c.arrival_time, "08:20");
    }

    #[test]
    fn extra_explicit_times_are_ignored() {
        let times = vec!["06:00".into(), "06:50".into(), "07:10".into()];
        assert_eq!(
            extract_times(&times, ""),
            ("06:00".to_string(), "06:50".to_string())
        );
    }

    #[test]
    fn free_text_two_times_in_order() {
        let c = parse(&RawRecord::from_text("Wyk\n14:10\nDagebüll\n15:00\n"));
        assert_eq!(c.departure_time, "14:10");
        assert_eq!(c.arrival_time, "15:00");
    }

    #[test]
    fn free_text_single_time_sets_departure_only() {
        let c = parse(&RawRecord::from_text("Abfahrt 16:40, Ankunft unbekannt"));
        assert_eq!(c.departure_time, "16:40");
        assert_eq!(c.arrival_time, "");
    }

    #[test]
    fn free_text_without_times_still_yields_connection() {
        let c = parse(&RawRecord::from_text("Fahrt fällt aus"));
        assert_eq!(c.departure_time, "");
        assert_eq!(c.arrival_time, "");
        assert_eq!(c.raw_text, "Fahrt fällt aus");
    }

    #[test]
    fn longer_digit_runs_are_not_times() {
        let (dep, arr) = extract_times(&[], "ref 123:456 then 08:15");
        assert_eq!(dep, "08:15");
        assert_eq!(arr, "");
    }

    #[test]
    fn available_via_action_control_only() {
        let record = RawRecord {
            text: "08:15 09:05".into(),
            time_texts: vec![],
            has_action_control: true,
        };
        assert!(parse(&record).available);
    }

    #[test]
    fn available_via_label_case_insensitive() {
        let c = parse(&RawRecord::from_text("08:15 09:05 Auswählen"));
        assert!(c.available);
    }

    #[test]
    fn unavailable_without_either_signal() {
        let c = parse(&RawRecord::from_text("08:15 09:05 ausgebucht"));
        assert!(!c.available);
    }

    #[test]
    fn only_persons_detected_case_insensitive() {
        let c = parse(&RawRecord::from_text("08:15 09:05 Nur Personen AUSWÄHLEN"));
        assert!(c.only_persons);
        assert!(c.available);
    }

    #[test]
    fn context_fields_are_echoed_not_parsed() {
        let c = parse(&RawRecord::from_text("2027-12-31 DENOR 08:15"));
        assert_eq!(c.date, "2026-01-02");
        assert_eq!(c.departure_harbor, "DEWYK");
        assert_eq!(c.arrival_harbor, "DEDAG");
        assert_eq!(c.booking_url, URL);
    }

    #[test]
    fn raw_text_is_normalized() {
        let c = parse(&RawRecord::from_text("\n  08:15\nWyk\n"));
        assert_eq!(c.raw_text, "08:15 Wyk");
    }

    #[test]
    fn blank_record_yields_empty_connection() {
        let c = parse(&RawRecord::from_text(" \n \n"));
        assert_eq!(c.raw_text, "");
        assert_eq!(c.departure_time, "");
        assert_eq!(c.arrival_time, "");
        assert!(!c.available);
        assert!(!c.only_persons);
        assert_eq!(c.date, "2026-01-02");
    }

    #[test]
    fn blank_record_with_action_control_is_available() {
        let record = RawRecord {
            text: "  \n".into(),
            time_texts: vec![],
            has_action_control: true,
        };
        let c = parse(&record);
        assert!(c.available);
        assert_eq!(c.departure_time, "");
        assert_eq!(c.raw_text, "");
    }

    #[test]
    fn custom_labels_are_honoured() {
        let labels = RecordLabels {
            booking: "BOOK".into(),
            only_persons: "foot passengers only".into(),
        };
        let record = RawRecord::from_text("08:15 09:05 Book now - Foot passengers only");
        let c = parse_record(&record, ctx(), &labels);
        assert!(c.available);
        assert!(c.only_persons);
    }
}

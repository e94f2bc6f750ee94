use std::collections::HashMap;
use std::fmt;

use chrono::{Duration, NaiveDateTime};

use crate::error::{PipelineError, Result};
use crate::utils::constants::{INTERVAL_SEPARATOR, TIMESTAMP_FORMAT};

/// A half-open observation window `[start, end)` in the wire format
/// `MM/DD/YYYY HH:MM:SS - MM/DD/YYYY HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeSpan {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeSpan {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Span of `minutes` starting at `start`.
    pub fn from_start(start: NaiveDateTime, minutes: i64) -> Self {
        Self {
            start,
            end: start + Duration::minutes(minutes),
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let (start_text, end_text) = trimmed
            .split_once(INTERVAL_SEPARATOR)
            .ok_or_else(|| PipelineError::InvalidInterval(trimmed.to_string()))?;

        let start = NaiveDateTime::parse_from_str(start_text.trim(), TIMESTAMP_FORMAT)
            .map_err(|_| PipelineError::InvalidInterval(trimmed.to_string()))?;
        let end = NaiveDateTime::parse_from_str(end_text.trim(), TIMESTAMP_FORMAT)
            .map_err(|_| PipelineError::InvalidInterval(trimmed.to_string()))?;

        Ok(Self { start, end })
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.start.format(TIMESTAMP_FORMAT),
            INTERVAL_SEPARATOR,
            self.end.format(TIMESTAMP_FORMAT)
        )
    }
}

/// One survey observation: the counts seen at a control point for one
/// movement during one interval. Created only when a day file is parsed;
/// later stages rewrite `interval` and `counts` and nothing else.
#[derive(Debug, Clone, PartialEq)]
pub struct CountRecord {
    pub project: String,
    pub location: String,
    pub control_point: String,
    pub geolocation: String,
    pub interval: TimeSpan,
    pub movement: String,
    /// Canonical vehicle class -> count; `None` is a missing cell.
    pub counts: HashMap<String, Option<i64>>,
}

impl CountRecord {
    pub fn count(&self, class: &str) -> Option<i64> {
        self.counts.get(class).copied().flatten()
    }

    pub fn set_count(&mut self, class: &str, value: Option<i64>) {
        self.counts.insert(class.to_string(), value);
    }

    /// Join key shared by the gap-fill and cross-source merges.
    pub fn join_key(&self) -> (String, TimeSpan, String) {
        (
            self.control_point.trim().to_string(),
            self.interval,
            self.movement.trim().to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 29)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_round_trip() {
        let text = "01/29/2025 07:00:00 - 01/29/2025 07:15:00";
        let span = TimeSpan::parse(text).unwrap();
        assert_eq!(span.start, dt(7, 0));
        assert_eq!(span.end, dt(7, 15));
        assert_eq!(span.to_string(), text);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let span = TimeSpan::parse("  01/29/2025 07:00:00 - 01/29/2025 07:05:00  ").unwrap();
        assert_eq!(span.start, dt(7, 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(TimeSpan::parse("not an interval").is_err());
        assert!(TimeSpan::parse("07:00 - 07:15").is_err());
    }

    #[test]
    fn test_from_start() {
        let span = TimeSpan::from_start(dt(7, 0), 5);
        assert_eq!(span.end, dt(7, 5));
    }

    #[test]
    fn test_join_key_trims_identifiers() {
        let mut counts = HashMap::new();
        counts.insert("car".to_string(), Some(3));
        let record = CountRecord {
            project: "p".into(),
            location: "l".into(),
            control_point: " PC1 ".into(),
            geolocation: "g".into(),
            interval: TimeSpan::from_start(dt(7, 0), 15),
            movement: " A2 ".into(),
            counts,
        };
        let (pc, _, movement) = record.join_key();
        assert_eq!(pc, "PC1");
        assert_eq!(movement, "A2");
    }
}

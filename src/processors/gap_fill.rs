use std::collections::HashMap;

use regex::Regex;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::models::{CountRecord, Dataset, TimeSpan};

/// Date label and display day name for one base day file, taken from the
/// location text of its first row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayMetadata {
    /// `DD-MM`
    pub date_label: String,
    pub day_name: String,
}

/// Per-complementary-file fill counters, for observability only.
#[derive(Debug, Clone)]
pub struct ComplementaryStats {
    pub label: String,
    pub rows_matched: usize,
    pub rows_updated: usize,
}

/// Fills missing or zero vehicle cells of a base dataset from complementary
/// datasets, first nonzero match wins. Row count and non-vehicle columns of
/// the base are never touched.
pub struct GapFillMerger;

impl GapFillMerger {
    pub fn new() -> Self {
        Self
    }

    pub fn merge(
        &self,
        base: &mut Dataset,
        complements: &[Dataset],
    ) -> Vec<ComplementaryStats> {
        let mut stats = Vec::with_capacity(complements.len());
        let columns = base.vehicle_columns.clone();

        for complement in complements {
            let index = build_key_index(&complement.records);
            let mut rows_matched = 0;
            let mut rows_updated = 0;

            for row in &mut base.records {
                let Some(&candidate) = index.get(&row.join_key()) else {
                    continue;
                };
                rows_matched += 1;

                let mut updates = 0;
                for column in &columns {
                    let current = row.count(column).unwrap_or(0);
                    if current != 0 {
                        continue;
                    }
                    match candidate.count(column) {
                        Some(value) if value != 0 => {
                            row.set_count(column, Some(value));
                            updates += 1;
                        }
                        _ => {}
                    }
                }
                if updates > 0 {
                    rows_updated += 1;
                }
            }

            info!(
                complement = %complement.label,
                rows_matched,
                rows_updated,
                "gap-fill pass complete"
            );
            stats.push(ComplementaryStats {
                label: complement.label.clone(),
                rows_matched,
                rows_updated,
            });
        }

        stats
    }

    /// Derive the day metadata from the base dataset's first row. The
    /// location carries a `DD.MM` or `DD.MM.YYYY` token, optionally
    /// followed by a day name.
    pub fn extract_day_metadata(&self, base: &Dataset) -> Result<DayMetadata> {
        let location = base
            .records
            .first()
            .map(|r| r.location.as_str())
            .unwrap_or("");

        let pattern = Regex::new(r"(\d{2}\.\d{2}(?:\.\d{4})?)(?:\s+(\p{Alphabetic}+))?")
            .map_err(|e| PipelineError::InvalidFormat(e.to_string()))?;

        let captures =
            pattern
                .captures(location)
                .ok_or_else(|| PipelineError::DateTokenNotFound {
                    location: location.to_string(),
                })?;

        let token = &captures[1];
        let date_label = token[..5].replace('.', "-");
        let day_name = captures
            .get(2)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "dia".to_string());

        Ok(DayMetadata {
            date_label,
            day_name,
        })
    }
}

impl Default for GapFillMerger {
    fn default() -> Self {
        Self::new()
    }
}

/// First occurrence per key wins, matching the fill policy.
fn build_key_index(
    records: &[CountRecord],
) -> HashMap<(String, TimeSpan, String), &CountRecord> {
    let mut index = HashMap::with_capacity(records.len());
    for record in records {
        index.entry(record.join_key()).or_insert(record);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DatasetKind;
    use chrono::{NaiveDate, NaiveDateTime};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap as StdHashMap;

    fn dt(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 29)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn record(pc: &str, hour: u32, car: Option<i64>, bus: Option<i64>) -> CountRecord {
        let mut counts = StdHashMap::new();
        counts.insert("car".to_string(), car);
        counts.insert("bus".to_string(), bus);
        CountRecord {
            project: "P1".into(),
            location: "Av. Central 29.01 Miercoles".into(),
            control_point: pc.into(),
            geolocation: "geo".into(),
            interval: TimeSpan::from_start(dt(hour), 15),
            movement: "A2".into(),
            counts,
        }
    }

    fn dataset(label: &str, records: Vec<CountRecord>) -> Dataset {
        let mut ds = Dataset::new(label, DatasetKind::Primary);
        ds.vehicle_columns = vec!["car".to_string(), "bus".to_string()];
        ds.records = records;
        ds
    }

    #[test]
    fn test_fills_only_missing_and_zero_cells() {
        let mut base = dataset(
            "base",
            vec![record("PC1", 7, Some(5), Some(0)), record("PC1", 8, None, Some(2))],
        );
        let complement = dataset(
            "comp",
            vec![record("PC1", 7, Some(9), Some(4)), record("PC1", 8, Some(3), Some(7))],
        );

        let stats = GapFillMerger::new().merge(&mut base, &[complement]);

        // nonzero base cells are never overwritten
        assert_eq!(base.records[0].count("car"), Some(5));
        assert_eq!(base.records[1].count("bus"), Some(2));
        // zero and missing cells are filled
        assert_eq!(base.records[0].count("bus"), Some(4));
        assert_eq!(base.records[1].count("car"), Some(3));

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].rows_matched, 2);
        assert_eq!(stats[0].rows_updated, 2);
    }

    #[test]
    fn test_first_complement_wins() {
        let mut base = dataset("base", vec![record("PC1", 7, None, None)]);
        let first = dataset("first", vec![record("PC1", 7, Some(1), None)]);
        let second = dataset("second", vec![record("PC1", 7, Some(9), Some(9))]);

        GapFillMerger::new().merge(&mut base, &[first, second]);

        // car came from the first complement; bus only from the second
        assert_eq!(base.records[0].count("car"), Some(1));
        assert_eq!(base.records[0].count("bus"), Some(9));
    }

    #[test]
    fn test_zero_complement_value_does_not_fill() {
        let mut base = dataset("base", vec![record("PC1", 7, Some(0), None)]);
        let complement = dataset("comp", vec![record("PC1", 7, Some(0), Some(0))]);

        let stats = GapFillMerger::new().merge(&mut base, &[complement]);
        assert_eq!(base.records[0].count("car"), Some(0));
        assert_eq!(base.records[0].counts["bus"], None);
        assert_eq!(stats[0].rows_updated, 0);
    }

    #[test]
    fn test_unmatched_rows_are_untouched() {
        let mut base = dataset("base", vec![record("PC1", 7, None, None)]);
        let complement = dataset("comp", vec![record("PC2", 7, Some(4), Some(4))]);

        let stats = GapFillMerger::new().merge(&mut base, &[complement]);
        assert_eq!(base.records[0].counts["car"], None);
        assert_eq!(stats[0].rows_matched, 0);
    }

    #[test]
    fn test_extract_day_metadata() {
        let base = dataset("base", vec![record("PC1", 7, None, None)]);
        let metadata = GapFillMerger::new().extract_day_metadata(&base).unwrap();
        assert_eq!(
            metadata,
            DayMetadata {
                date_label: "29-01".to_string(),
                day_name: "Miercoles".to_string(),
            }
        );
    }

    #[test]
    fn test_extract_day_metadata_with_year_and_no_day_name() {
        let mut base = dataset("base", vec![record("PC1", 7, None, None)]);
        base.records[0].location = "Centro 03.02.2025".to_string();
        let metadata = GapFillMerger::new().extract_day_metadata(&base).unwrap();
        assert_eq!(metadata.date_label, "03-02");
        assert_eq!(metadata.day_name, "dia");
    }

    #[test]
    fn test_missing_date_token_is_fatal_for_file() {
        let mut base = dataset("base", vec![record("PC1", 7, None, None)]);
        base.records[0].location = "no date here".to_string();
        let err = GapFillMerger::new()
            .extract_day_metadata(&base)
            .unwrap_err();
        assert!(matches!(err, PipelineError::DateTokenNotFound { .. }));
    }
}

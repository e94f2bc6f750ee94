use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};

use crate::error::{PipelineError, Result};
use crate::models::{Dataset, StreetMap};
use crate::processors::homologator::quarter_label;
use crate::utils::constants::COL_PERSON;

/// One row of the pedestrian report.
#[derive(Debug, Clone, PartialEq)]
pub struct PedestrianRow {
    pub control_point: String,
    pub intersection: Option<String>,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub movement: String,
    pub quarter: String,
    pub persons: i64,
}

#[derive(Debug, Clone, Default)]
pub struct PedestrianReport {
    pub rows: Vec<PedestrianRow>,
}

/// Single-category variant of the homologator: no column summation, and the
/// first row per identifying key wins unconditionally.
pub struct PedestrianHomologator<'a> {
    streets: &'a StreetMap,
}

impl<'a> PedestrianHomologator<'a> {
    pub fn new(streets: &'a StreetMap) -> Self {
        Self { streets }
    }

    /// Homologate one day file: control points map directly (no code
    /// extraction), rows sorted per file and deduplicated keep-first.
    pub fn homologate_day(&self, dataset: &Dataset) -> Result<Vec<PedestrianRow>> {
        if !dataset.has_vehicle_column(COL_PERSON) {
            return Err(PipelineError::MissingColumn {
                label: dataset.label.clone(),
                column: COL_PERSON.to_string(),
            });
        }

        let mut rows: Vec<PedestrianRow> = dataset
            .records
            .iter()
            .map(|record| {
                let control_point = record.control_point.trim().to_string();
                let intersection = self
                    .streets
                    .display_name(&control_point)
                    .map(String::from);
                let start = record.interval.start;
                PedestrianRow {
                    control_point,
                    intersection,
                    date: start.date(),
                    start: start.time(),
                    end: record.interval.end.time(),
                    movement: record.movement.clone(),
                    quarter: quarter_label(start.time()),
                    persons: record.count(COL_PERSON).unwrap_or(0),
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            a.control_point
                .cmp(&b.control_point)
                .then_with(|| a.movement.cmp(&b.movement))
                .then_with(|| a.date.cmp(&b.date))
                .then_with(|| a.start.cmp(&b.start))
        });

        let mut seen = HashSet::new();
        rows.retain(|row| {
            seen.insert((
                row.control_point.clone(),
                row.date,
                row.start,
                row.end,
                row.movement.clone(),
                row.quarter.clone(),
            ))
        });

        Ok(rows)
    }

    /// Combine per-day row sets in processing order.
    pub fn combine(&self, day_rows: Vec<Vec<PedestrianRow>>) -> Result<PedestrianReport> {
        let rows: Vec<PedestrianRow> = day_rows.into_iter().flatten().collect();
        if rows.is_empty() {
            return Err(PipelineError::MissingData(
                "no nonempty pedestrian dataset to combine".to_string(),
            ));
        }
        Ok(PedestrianReport { rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CountRecord, DatasetKind, TimeSpan};
    use chrono::NaiveDateTime;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 29)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn record(pc: &str, start: NaiveDateTime, persons: i64) -> CountRecord {
        let mut counts = HashMap::new();
        counts.insert(COL_PERSON.to_string(), Some(persons));
        CountRecord {
            project: "P1".into(),
            location: "loc".into(),
            control_point: pc.into(),
            geolocation: "geo".into(),
            interval: TimeSpan::from_start(start, 15),
            movement: "X1".into(),
            counts,
        }
    }

    fn dataset(records: Vec<CountRecord>) -> Dataset {
        let mut ds = Dataset::new("peatones", DatasetKind::Primary);
        ds.vehicle_columns = vec![COL_PERSON.to_string()];
        ds.records = records;
        ds
    }

    #[test]
    fn test_day_is_sorted_and_mapped() {
        let mut streets = StreetMap::new();
        streets.insert("PC2", "Plaza Mayor");

        let ds = dataset(vec![
            record("PC2", dt(8, 0), 7),
            record("PC2", dt(7, 0), 3),
        ]);

        let rows = PedestrianHomologator::new(&streets)
            .homologate_day(&ds)
            .unwrap();
        assert_eq!(rows[0].start, NaiveTime::from_hms_opt(7, 0, 0).unwrap());
        assert_eq!(rows[0].persons, 3);
        assert_eq!(rows[0].intersection.as_deref(), Some("Plaza Mayor"));
        assert_eq!(rows[0].quarter, "7,1");
    }

    #[test]
    fn test_duplicates_keep_first_unconditionally() {
        let streets = StreetMap::new();
        // first row has zero persons; keep-first still wins
        let ds = dataset(vec![record("PC2", dt(7, 0), 0), record("PC2", dt(7, 0), 9)]);

        let rows = PedestrianHomologator::new(&streets)
            .homologate_day(&ds)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].persons, 0);
    }

    #[test]
    fn test_missing_person_column_is_fatal_for_file() {
        let streets = StreetMap::new();
        let mut ds = dataset(vec![]);
        ds.vehicle_columns = vec!["car".to_string()];

        let err = PedestrianHomologator::new(&streets)
            .homologate_day(&ds)
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { .. }));
    }

    #[test]
    fn test_combine_rejects_empty() {
        let streets = StreetMap::new();
        assert!(PedestrianHomologator::new(&streets)
            .combine(vec![vec![]])
            .is_err());
    }
}

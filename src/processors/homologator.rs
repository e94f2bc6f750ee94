use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime, Timelike};
use regex::Regex;

use crate::error::{PipelineError, Result};
use crate::models::{CountRecord, Dataset, StreetMap, VehicleClassMap};

/// One row of the final report, keyed by the destination taxonomy.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub control_point: String,
    pub intersection: Option<String>,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub movement: String,
    pub quarter: String,
    /// One value per output category, in report column order
    pub counts: Vec<i64>,
}

impl ReportRow {
    pub fn total(&self) -> i64 {
        self.counts.iter().sum()
    }

    fn identifying_key(&self) -> (String, NaiveDate, NaiveTime, NaiveTime, String, String) {
        (
            self.control_point.clone(),
            self.date,
            self.start,
            self.end,
            self.movement.clone(),
            self.quarter.clone(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct HomologatedReport {
    /// Output categories in first-seen map order
    pub categories: Vec<String>,
    pub rows: Vec<ReportRow>,
}

/// Remaps and aggregates all completed day datasets into the final report:
/// category synthesis, temporal bucketing, deduplication, final ordering.
pub struct Homologator<'a> {
    vehicle_classes: &'a VehicleClassMap,
    streets: &'a StreetMap,
}

impl<'a> Homologator<'a> {
    pub fn new(vehicle_classes: &'a VehicleClassMap, streets: &'a StreetMap) -> Self {
        Self {
            vehicle_classes,
            streets,
        }
    }

    /// `datasets` must already follow file-ordinal order; that order breaks
    /// ties until the final chronological sort.
    pub fn homologate(&self, datasets: &[Dataset]) -> Result<HomologatedReport> {
        if datasets.iter().all(|d| d.is_empty()) {
            return Err(PipelineError::MissingData(
                "no nonempty day dataset to combine".to_string(),
            ));
        }

        let pc_pattern = Regex::new(r"PC\d+")
            .map_err(|e| PipelineError::InvalidFormat(e.to_string()))?;
        let categories = self.vehicle_classes.output_classes().to_vec();

        let mut rows = Vec::new();
        for dataset in datasets {
            // Which source columns feed each output category, resolved once
            // per dataset
            let contributors: Vec<Vec<&String>> = categories
                .iter()
                .map(|category| {
                    dataset
                        .vehicle_columns
                        .iter()
                        .filter(|column| {
                            self.vehicle_classes.output_for(column) == Some(category.as_str())
                        })
                        .collect()
                })
                .collect();

            for record in &dataset.records {
                rows.push(self.build_row(record, &contributors, &pc_pattern));
            }
        }

        let mut rows = deduplicate(rows);
        rows.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.control_point.cmp(&b.control_point))
                .then_with(|| a.movement.cmp(&b.movement))
                .then_with(|| a.start.cmp(&b.start))
        });

        Ok(HomologatedReport { categories, rows })
    }

    fn build_row(
        &self,
        record: &CountRecord,
        contributors: &[Vec<&String>],
        pc_pattern: &Regex,
    ) -> ReportRow {
        let control_point = extract_pc_code(&record.control_point, pc_pattern);
        let intersection = self
            .streets
            .display_name(&control_point)
            .map(String::from);

        let counts = contributors
            .iter()
            .map(|columns| {
                columns
                    .iter()
                    .map(|column| record.count(column).unwrap_or(0))
                    .sum()
            })
            .collect();

        let start = record.interval.start;
        ReportRow {
            control_point,
            intersection,
            date: start.date(),
            start: start.time(),
            end: record.interval.end.time(),
            movement: record.movement.clone(),
            quarter: quarter_label(start.time()),
            counts,
        }
    }
}

/// `"<hour>,<one-indexed quarter within the hour>"`.
pub fn quarter_label(time: NaiveTime) -> String {
    format!("{},{}", time.hour(), time.minute() / 15 + 1)
}

/// Short control-point code: first `PC<digits>` match; sources without one
/// keep their trimmed text.
fn extract_pc_code(source: &str, pattern: &Regex) -> String {
    pattern
        .find(source)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| source.trim().to_string())
}

/// Two rows sharing an identifying key are the same physical observation.
/// In a duplicate group, a nonzero row beats zero rows (first nonzero
/// wins); otherwise the last row in original order wins.
fn deduplicate(rows: Vec<ReportRow>) -> Vec<ReportRow> {
    let mut groups: HashMap<_, Vec<usize>> = HashMap::new();
    for (index, row) in rows.iter().enumerate() {
        groups.entry(row.identifying_key()).or_default().push(index);
    }

    let mut keep = vec![true; rows.len()];
    for indices in groups.values() {
        if indices.len() < 2 {
            continue;
        }
        let has_zero = indices.iter().any(|&i| rows[i].total() == 0);
        let has_nonzero = indices.iter().any(|&i| rows[i].total() != 0);

        let keeper = if has_zero && has_nonzero {
            indices
                .iter()
                .copied()
                .find(|&i| rows[i].total() != 0)
                .unwrap_or(indices[0])
        } else {
            *indices.last().unwrap_or(&indices[0])
        };

        for &index in indices {
            if index != keeper {
                keep[index] = false;
            }
        }
    }

    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| keep[index].then_some(row))
        .collect()
}

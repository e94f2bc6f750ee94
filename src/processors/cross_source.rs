use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::models::{Dataset, TimeSpan};
use crate::utils::constants::TRACKED_CLASS;
use crate::utils::series::{repair_series, zero_fill};

/// Joins the tracked-family value onto every row of a completed base
/// dataset, then repairs remaining gaps per (control point, movement)
/// group. The base is authoritative for row presence.
pub struct CrossSourceMerger;

impl CrossSourceMerger {
    pub fn new() -> Self {
        Self
    }

    pub fn merge(&self, mut base: Dataset, tracked: Option<&Dataset>) -> Result<Dataset> {
        // Align the two families' ID conventions: a composite code keeps
        // only its leading control-point segment.
        for row in &mut base.records {
            row.control_point = truncate_at_hyphen(&row.control_point);
        }

        let index = tracked.map(build_tracked_index).unwrap_or_default();

        // The joined column is always present downstream, zero when the
        // tracked family has nothing for this day.
        if !base.has_vehicle_column(TRACKED_CLASS) {
            base.vehicle_columns.push(TRACKED_CLASS.to_string());
        }
        for row in &mut base.records {
            let value = index.get(&row.join_key()).copied();
            row.set_count(TRACKED_CLASS, value);
        }

        base.sort_by_group_and_interval();
        self.repair_groups(&mut base);
        drop_duplicate_rows(&mut base);

        Ok(base)
    }

    /// Within each (control point, movement) group: linear interpolation
    /// plus edge fills for every vehicle column except the tracked one,
    /// which is a distinct counting method and is zero-filled instead.
    fn repair_groups(&self, dataset: &mut Dataset) {
        let columns = dataset.vehicle_columns.clone();
        let mut start = 0;

        while start < dataset.records.len() {
            let group_key = (
                dataset.records[start].control_point.clone(),
                dataset.records[start].movement.clone(),
            );
            let mut end = start + 1;
            while end < dataset.records.len()
                && dataset.records[end].control_point == group_key.0
                && dataset.records[end].movement == group_key.1
            {
                end += 1;
            }

            let group = &mut dataset.records[start..end];
            for column in &columns {
                let mut series: Vec<Option<i64>> =
                    group.iter().map(|r| r.count(column)).collect();
                if column == TRACKED_CLASS {
                    zero_fill(&mut series);
                } else {
                    repair_series(&mut series);
                }
                for (record, value) in group.iter_mut().zip(series) {
                    record.set_count(column, value);
                }
            }

            start = end;
        }
    }
}

impl Default for CrossSourceMerger {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate_at_hyphen(code: &str) -> String {
    code.split('-').next().unwrap_or("").trim().to_string()
}

fn build_tracked_index(tracked: &Dataset) -> HashMap<(String, TimeSpan, String), i64> {
    let mut index = HashMap::with_capacity(tracked.records.len());
    for record in &tracked.records {
        let key = (
            truncate_at_hyphen(&record.control_point),
            record.interval,
            record.movement.trim().to_string(),
        );
        index.entry(key).or_insert(record.count(TRACKED_CLASS).unwrap_or(0));
    }
    index
}

/// Rows identical across every column collapse to their first occurrence.
fn drop_duplicate_rows(dataset: &mut Dataset) {
    let columns = dataset.vehicle_columns.clone();
    let mut seen = HashSet::new();
    dataset.records.retain(|record| {
        let fingerprint = (
            record.project.clone(),
            record.location.clone(),
            record.control_point.clone(),
            record.geolocation.clone(),
            record.interval,
            record.movement.clone(),
            columns
                .iter()
                .map(|c| record.counts.get(c).copied().flatten())
                .collect::<Vec<_>>(),
        );
        seen.insert(fingerprint)
    });
}

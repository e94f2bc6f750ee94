use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime, NaiveTime};

use crate::error::{PipelineError, Result};
use crate::models::{
    AnchorMap, CountRecord, Dataset, DatasetKind, HourlyStrategy, RunConfig, SamplingMode,
    TimeSpan,
};
use crate::utils::constants::{
    BUCKET_MINUTES, FIXED_DECAY_WEIGHTS, HOURLY_SCALE_FACTOR, QUARTERS_PER_DAY, QUARTERS_PER_HOUR,
    RAW_SAMPLE_MINUTES, TRACKED_CLASS,
};

/// Re-anchors and resamples one tracked-family day file: raw 5-minute
/// records become a canonical 15-minute grid carrying only the tracked
/// class column.
pub struct IntervalCorrector<'a> {
    anchors: &'a AnchorMap,
    config: &'a RunConfig,
}

impl<'a> IntervalCorrector<'a> {
    pub fn new(anchors: &'a AnchorMap, config: &'a RunConfig) -> Self {
        Self { anchors, config }
    }

    pub fn correct_and_interpolate(&self, dataset: &Dataset) -> Result<Dataset> {
        let tracked_column = dataset
            .vehicle_columns
            .iter()
            .find(|c| c.contains(TRACKED_CLASS))
            .cloned()
            .ok_or_else(|| PipelineError::MissingTrackedColumn {
                label: dataset.label.clone(),
            })?;

        let mut output = Dataset::new(dataset.label.clone(), DatasetKind::Tracked);
        output.vehicle_columns = vec![TRACKED_CLASS.to_string()];

        for mut group in group_by_point_and_movement(&dataset.records) {
            group.sort_by_key(|r| r.interval.start);

            let control_point = group[0].control_point.trim().to_string();
            let observed_date = group[0].interval.start.date();
            let anchor = self
                .anchors
                .resolve(&control_point, observed_date)
                .ok_or_else(|| PipelineError::AnchorNotFound {
                    control_point: control_point.clone(),
                    date: observed_date,
                })?;

            relabel_from_anchor(&mut group, anchor);

            let produced = match self.config.sampling_mode {
                SamplingMode::Hourly => self.expand_hourly(&group, &tracked_column),
                SamplingMode::FifteenMin => self.rescale_fifteen_min(&group, &tracked_column),
            };
            output.records.extend(produced);
        }

        output.sort_by_group_and_interval();
        Ok(output)
    }

    /// Row *i* of a group is the top-of-hour sample for hour *i*, scaled to
    /// an hourly total; synthesize the 96 quarter buckets of the day.
    fn expand_hourly(&self, group: &[CountRecord], tracked_column: &str) -> Vec<CountRecord> {
        let hour_values: Vec<i64> = group
            .iter()
            .map(|r| r.count(tracked_column).unwrap_or(0) * HOURLY_SCALE_FACTOR)
            .collect();

        let base = group[0].interval.start.date().and_time(NaiveTime::MIN);
        let mut produced = Vec::with_capacity(QUARTERS_PER_DAY as usize);

        for quarter in 0..QUARTERS_PER_DAY {
            let hour = (quarter / QUARTERS_PER_HOUR) as usize;
            let minute = (quarter % QUARTERS_PER_HOUR) * BUCKET_MINUTES as u32;
            let current = hour_values.get(hour).copied().unwrap_or(0);

            let value = match self.config.hourly_strategy {
                HourlyStrategy::CrossHourLinear => {
                    // next hour missing: hold the current value
                    let next = hour_values.get(hour + 1).copied().unwrap_or(current);
                    current as f64 + (next - current) as f64 * (minute as f64 / 60.0)
                }
                HourlyStrategy::FixedDecay => {
                    current as f64
                        * FIXED_DECAY_WEIGHTS[(quarter % QUARTERS_PER_HOUR) as usize]
                }
            };
            let value = (value.round() as i64).max(0);

            let start = base + Duration::minutes(quarter as i64 * BUCKET_MINUTES);
            produced.push(bucket_record(&group[0], start, value));
        }

        produced
    }

    /// Scale each sample to a 15-minute value and re-timestamp rows into
    /// contiguous buckets from midnight, row order as bucket order.
    fn rescale_fifteen_min(&self, group: &[CountRecord], tracked_column: &str) -> Vec<CountRecord> {
        let factor = self.config.scale_factor();
        let base = group[0].interval.start.date().and_time(NaiveTime::MIN);

        group
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let value =
                    (row.count(tracked_column).unwrap_or(0) as f64 * factor).round() as i64;
                let start = base + Duration::minutes(index as i64 * BUCKET_MINUTES);
                bucket_record(row, start, value)
            })
            .collect()
    }
}

/// Partition records by (control point, movement), groups in first-seen
/// order.
fn group_by_point_and_movement(records: &[CountRecord]) -> Vec<Vec<CountRecord>> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut groups: HashMap<(String, String), Vec<CountRecord>> = HashMap::new();

    for record in records {
        let key = (
            record.control_point.trim().to_string(),
            record.movement.trim().to_string(),
        );
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(record.clone());
    }

    order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .collect()
}

/// Replace the raw interval labels of a sorted group with consecutive
/// 5-minute spans starting at the anchor. Repairs systematically offset or
/// mislabeled source timestamps.
fn relabel_from_anchor(group: &mut [CountRecord], anchor: NaiveDateTime) {
    let mut start = anchor;
    for record in group.iter_mut() {
        record.interval = TimeSpan::from_start(start, RAW_SAMPLE_MINUTES);
        start = record.interval.end;
    }
}

fn bucket_record(template: &CountRecord, start: NaiveDateTime, value: i64) -> CountRecord {
    let mut counts = HashMap::new();
    counts.insert(TRACKED_CLASS.to_string(), Some(value));
    CountRecord {
        project: template.project.clone(),
        location: template.location.clone(),
        control_point: template.control_point.trim().to_string(),
        geolocation: template.geolocation.clone(),
        interval: TimeSpan::from_start(start, BUCKET_MINUTES),
        movement: template.movement.trim().to_string(),
        counts,
    }
}

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::utils::constants::LATE_ANCHOR_CUTOVER_HOUR;

/// Many-to-one remap of canonicalized input vehicle classes to output
/// report categories. Output categories keep first-seen order, which fixes
/// the column order of the final report.
#[derive(Debug, Clone, Default)]
pub struct VehicleClassMap {
    entries: HashMap<String, String>,
    output_order: Vec<String>,
}

impl VehicleClassMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, input_class: impl Into<String>, output_class: impl Into<String>) {
        let output_class = output_class.into();
        if !self.output_order.contains(&output_class) {
            self.output_order.push(output_class.clone());
        }
        self.entries.insert(input_class.into(), output_class);
    }

    pub fn output_for(&self, canonical_input: &str) -> Option<&str> {
        self.entries.get(canonical_input).map(String::as_str)
    }

    /// Output categories in first-seen order.
    pub fn output_classes(&self) -> &[String] {
        &self.output_order
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Control-point code -> display intersection name.
#[derive(Debug, Clone, Default)]
pub struct StreetMap {
    entries: HashMap<String, String>,
}

impl StreetMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, control_point: impl Into<String>, name: impl Into<String>) {
        self.entries.insert(control_point.into(), name.into());
    }

    pub fn display_name(&self, control_point: &str) -> Option<&str> {
        self.entries.get(control_point).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Authoritative sequence start times, keyed by control point and calendar
/// date. Used only by the interval corrector.
#[derive(Debug, Clone, Default)]
pub struct AnchorMap {
    entries: HashMap<(String, NaiveDate), Vec<NaiveDateTime>>,
}

impl AnchorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, control_point: impl Into<String>, timestamp: NaiveDateTime) {
        self.entries
            .entry((control_point.into(), timestamp.date()))
            .or_default()
            .push(timestamp);
    }

    /// Resolve the anchor for a control point on an observed day. An anchor
    /// dated the previous day qualifies only at or after 22:00 (a late-night
    /// cutover still belonging to the observed day); among those the one
    /// closest to midnight of the target day wins.
    pub fn resolve(&self, control_point: &str, date: NaiveDate) -> Option<NaiveDateTime> {
        let key = (control_point.trim().to_string(), date);
        if let Some(anchors) = self.entries.get(&key) {
            return anchors.first().copied();
        }

        let previous = date.pred_opt()?;
        let key = (control_point.trim().to_string(), previous);
        self.entries
            .get(&key)?
            .iter()
            .filter(|ts| ts.hour() >= LATE_ANCHOR_CUTOVER_HOUR)
            .max()
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The three reference tables loaded once per run from the template
/// document, read-only thereafter.
#[derive(Debug, Clone)]
pub struct TemplateTables {
    pub vehicle_classes: VehicleClassMap,
    pub streets: StreetMap,
    pub anchors: AnchorMap,
}

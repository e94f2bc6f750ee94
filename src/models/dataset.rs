use std::collections::HashSet;
use std::path::PathBuf;

use crate::models::record::CountRecord;
use crate::utils::constants::{COL_INTERVAL, COL_SOURCE, TRACKED_CLASS};

/// Source family of a parsed document, decided once at ingestion from the
/// canonicalized header set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    /// Reference mapping table
    Template,
    /// Multi-class 15-minute counts; the base family of the pipeline
    Primary,
    /// Single tracked-class raw counts on a 5-minute cadence
    Tracked,
    /// Same schema family as Primary, used only to fill gaps
    Complementary,
    Unknown,
}

impl DatasetKind {
    /// Classify a document by its canonical column names. `Complementary`
    /// is assigned by ingestion context, never inferred from headers.
    pub fn classify<'a>(columns: impl IntoIterator<Item = &'a str>) -> Self {
        let columns: HashSet<&str> = columns.into_iter().collect();

        if columns.contains("punto de control") && columns.contains("nombre para cliente") {
            DatasetKind::Template
        } else if columns.contains(COL_SOURCE) && columns.contains(COL_INTERVAL) {
            let tracked = columns.iter().any(|c| c.contains(TRACKED_CLASS));
            if tracked {
                DatasetKind::Tracked
            } else {
                DatasetKind::Primary
            }
        } else {
            DatasetKind::Unknown
        }
    }
}

/// Ordered collection of records sharing one day and source; the unit of
/// work of every stage. Read from one file, written to exactly one output.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Short identity for logging, usually the source file stem
    pub label: String,
    pub kind: DatasetKind,
    /// Canonical vehicle class names in source column order; defines the
    /// column order of the written output
    pub vehicle_columns: Vec<String>,
    pub records: Vec<CountRecord>,
}

impl Dataset {
    pub fn new(label: impl Into<String>, kind: DatasetKind) -> Self {
        Self {
            label: label.into(),
            kind,
            vehicle_columns: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_vehicle_column(&self, class: &str) -> bool {
        self.vehicle_columns.iter().any(|c| c == class)
    }

    /// Stable output ordering shared by the transform stages.
    pub fn sort_by_group_and_interval(&mut self) {
        self.records.sort_by(|a, b| {
            a.control_point
                .cmp(&b.control_point)
                .then_with(|| a.movement.cmp(&b.movement))
                .then_with(|| a.interval.start.cmp(&b.interval.start))
        });
    }
}

/// One day's input file with its processing ordinal. The ordered list of
/// these is the pipeline's unit of iteration; directory layout stays in the
/// CLI layer that builds the list.
#[derive(Debug, Clone)]
pub struct DayFile {
    pub ordinal: u32,
    pub path: PathBuf,
}

impl DayFile {
    pub fn new(ordinal: u32, path: impl Into<PathBuf>) -> Self {
        Self {
            ordinal,
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_primary() {
        let kind = DatasetKind::classify(
            ["proyecto", "fuente de datos", "intervalo", "movimiento", "car", "bus"]
                .iter()
                .copied(),
        );
        assert_eq!(kind, DatasetKind::Primary);
    }

    #[test]
    fn test_classify_tracked() {
        let kind = DatasetKind::classify(
            ["fuente de datos", "intervalo", "movimiento", "tricycle"]
                .iter()
                .copied(),
        );
        assert_eq!(kind, DatasetKind::Tracked);

        // plural spelling still counts
        let kind = DatasetKind::classify(
            ["fuente de datos", "intervalo", "tricycles"].iter().copied(),
        );
        assert_eq!(kind, DatasetKind::Tracked);
    }

    #[test]
    fn test_classify_template() {
        let kind = DatasetKind::classify(
            ["punto de control", "nombre para cliente"].iter().copied(),
        );
        assert_eq!(kind, DatasetKind::Template);
    }

    #[test]
    fn test_classify_unknown() {
        let kind = DatasetKind::classify(["foo", "bar"].iter().copied());
        assert_eq!(kind, DatasetKind::Unknown);
    }
}

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::models::Dataset;

/// Uppercase wire headers of the identifier columns.
const IDENTIFIER_HEADERS: [&str; 6] = [
    "PROYECTO",
    "LOCALIZACION",
    "FUENTE DE DATOS",
    "GEOLOCALIZACION",
    "INTERVALO",
    "MOVIMIENTO",
];

/// Writes one intermediate per-day dataset to a CSV document. Missing count
/// cells are written empty, never as zero.
pub struct DatasetWriter;

impl DatasetWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write(&self, dataset: &Dataset, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(path)?;

        let mut headers: Vec<String> =
            IDENTIFIER_HEADERS.iter().map(|h| h.to_string()).collect();
        headers.extend(dataset.vehicle_columns.iter().map(|c| c.to_uppercase()));
        writer.write_record(&headers)?;

        for record in &dataset.records {
            let mut row = vec![
                record.project.clone(),
                record.location.clone(),
                record.control_point.clone(),
                record.geolocation.clone(),
                record.interval.to_string(),
                record.movement.clone(),
            ];
            for column in &dataset.vehicle_columns {
                row.push(
                    record
                        .count(column)
                        .map(|v| v.to_string())
                        .unwrap_or_default(),
                );
            }
            writer.write_record(&row)?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl Default for DatasetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CountRecord, DatasetKind, TimeSpan};
    use crate::readers::DatasetReader;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    #[test]
    fn test_written_file_reads_back() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 29)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap();

        let mut counts = HashMap::new();
        counts.insert("car".to_string(), Some(4));
        counts.insert("bus".to_string(), None);

        let mut dataset = Dataset::new("day", DatasetKind::Primary);
        dataset.vehicle_columns = vec!["car".to_string(), "bus".to_string()];
        dataset.records.push(CountRecord {
            project: "P1".into(),
            location: "loc 29.01".into(),
            control_point: "PC1".into(),
            geolocation: "geo".into(),
            interval: TimeSpan::from_start(start, 15),
            movement: "A2".into(),
            counts,
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("01_day.csv");
        DatasetWriter::new().write(&dataset, &path).unwrap();

        let reread = DatasetReader::new().read(&path).unwrap();
        assert_eq!(reread.vehicle_columns, dataset.vehicle_columns);
        assert_eq!(reread.records[0].count("car"), Some(4));
        assert_eq!(reread.records[0].counts["bus"], None);
        assert_eq!(reread.records[0].interval, dataset.records[0].interval);
    }
}

use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::error::{PipelineError, Result};
use crate::models::{CountRecord, Dataset, DatasetKind, DayFile, TimeSpan};
use crate::readers::read_document;
use crate::utils::constants::{
    COL_GEOLOCATION, COL_INTERVAL, COL_LOCATION, COL_MOVEMENT, COL_PROJECT, COL_SOURCE,
};
use crate::utils::text::canonicalize;

/// How many leading rows may precede the real header (exports often carry a
/// banner row above it).
const MAX_BANNER_ROWS: usize = 5;

/// Reads one per-day source document into a `Dataset`. Column names are
/// canonicalized; identifier columns become record fields and everything
/// else is a vehicle class column in source order.
pub struct DatasetReader {
    detect_banner: bool,
}

impl DatasetReader {
    pub fn new() -> Self {
        Self {
            detect_banner: true,
        }
    }

    pub fn with_banner_detection(detect_banner: bool) -> Self {
        Self { detect_banner }
    }

    pub fn read(&self, path: &Path) -> Result<Dataset> {
        let text = read_document(path)?;
        let label = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset")
            .to_string();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let rows: Vec<StringRecord> = reader.records().collect::<std::result::Result<_, _>>()?;

        let header_idx = self.find_header_row(&rows, &label)?;
        let headers: Vec<String> = rows[header_idx].iter().map(canonicalize).collect();

        let kind = DatasetKind::classify(headers.iter().map(String::as_str));

        let column_index = |name: &str| headers.iter().position(|h| h == name);

        let source_idx = column_index(COL_SOURCE).ok_or_else(|| PipelineError::MissingColumn {
            label: label.clone(),
            column: COL_SOURCE.to_string(),
        })?;
        let interval_idx =
            column_index(COL_INTERVAL).ok_or_else(|| PipelineError::MissingColumn {
                label: label.clone(),
                column: COL_INTERVAL.to_string(),
            })?;
        let movement_idx =
            column_index(COL_MOVEMENT).ok_or_else(|| PipelineError::MissingColumn {
                label: label.clone(),
                column: COL_MOVEMENT.to_string(),
            })?;
        let project_idx = column_index(COL_PROJECT);
        let location_idx = column_index(COL_LOCATION);
        let geolocation_idx = column_index(COL_GEOLOCATION);

        let identifier_indices = [
            Some(source_idx),
            Some(interval_idx),
            Some(movement_idx),
            project_idx,
            location_idx,
            geolocation_idx,
        ];

        // Remaining columns are vehicle classes, in source order
        let mut vehicle_columns = Vec::new();
        let mut vehicle_indices = Vec::new();
        for (idx, name) in headers.iter().enumerate() {
            if identifier_indices.contains(&Some(idx)) || name.is_empty() {
                continue;
            }
            if vehicle_columns.contains(name) {
                continue;
            }
            vehicle_columns.push(name.clone());
            vehicle_indices.push(idx);
        }

        let mut dataset = Dataset::new(label, kind);
        dataset.vehicle_columns = vehicle_columns;

        for row in rows.iter().skip(header_idx + 1) {
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            let cell = |idx: usize| row.get(idx).unwrap_or("").trim().to_string();

            let interval = TimeSpan::parse(row.get(interval_idx).unwrap_or(""))?;

            let mut counts = std::collections::HashMap::new();
            for (name, &idx) in dataset.vehicle_columns.iter().zip(&vehicle_indices) {
                counts.insert(name.clone(), parse_count(row.get(idx).unwrap_or("")));
            }

            dataset.records.push(CountRecord {
                project: project_idx.map(&cell).unwrap_or_default(),
                location: location_idx.map(&cell).unwrap_or_default(),
                control_point: cell(source_idx),
                geolocation: geolocation_idx.map(&cell).unwrap_or_default(),
                interval,
                movement: cell(movement_idx),
                counts,
            });
        }

        Ok(dataset)
    }

    /// Locate the header row: the first row carrying the source and
    /// interval columns. Without banner detection the first row is it.
    fn find_header_row(&self, rows: &[StringRecord], label: &str) -> Result<usize> {
        if rows.is_empty() {
            return Err(PipelineError::InvalidFormat(format!(
                "'{}' is empty",
                label
            )));
        }
        if !self.detect_banner {
            return Ok(0);
        }

        for (idx, row) in rows.iter().take(MAX_BANNER_ROWS).enumerate() {
            let cells: Vec<String> = row.iter().map(canonicalize).collect();
            let has_source = cells.iter().any(|c| c == COL_SOURCE);
            let has_interval = cells.iter().any(|c| c == COL_INTERVAL);
            if has_source && has_interval {
                return Ok(idx);
            }
        }

        Err(PipelineError::InvalidFormat(format!(
            "'{}' has no recognizable header row",
            label
        )))
    }
}

impl Default for DatasetReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Missing or non-numeric cells are absent values, not errors.
fn parse_count(cell: &str) -> Option<i64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    trimmed.parse::<f64>().ok().map(|v| v.round() as i64)
}

/// Leading integer of a file or folder name, used as the day ordinal.
pub fn day_ordinal(name: &str) -> Option<u32> {
    let digits: String = name.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

/// Build the explicit ordered day list from a source-family directory.
/// Accepts numbered CSV files directly, or numbered subfolders holding the
/// day's CSV file. Entries without a leading number are ignored.
pub fn discover_day_files(dir: &Path) -> Result<Vec<DayFile>> {
    let mut days: Vec<DayFile> = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        let Some(ordinal) = day_ordinal(&name) else {
            continue;
        };

        if path.is_dir() {
            let mut inner: Vec<PathBuf> = std::fs::read_dir(&path)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("csv"))
                .collect();
            inner.sort();
            if let Some(file) = inner.into_iter().next() {
                days.push(DayFile::new(ordinal, file));
            }
        } else if path.extension().and_then(|e| e.to_str()) == Some("csv") {
            days.push(DayFile::new(ordinal, path));
        }
    }

    days.sort_by_key(|d| d.ordinal);
    Ok(days)
}

/// Complementary documents carry no day identity; list order is name order.
pub fn discover_complementary_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("csv"))
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_read_day_file_with_banner() {
        let file = write_temp(
            "Traffic survey export,,,,,\n\
             PROYECTO,LOCALIZACIÓN,FUENTE DE DATOS,GEOLOCALIZACIÓN,INTERVALO,MOVIMIENTO,CAR,BUS\n\
             P1,Av. Central 29.01 Miercoles,PC1-A2,\"-12.1,-77.0\",01/29/2025 07:00:00 - 01/29/2025 07:15:00,A2,4,1\n\
             P1,Av. Central 29.01 Miercoles,PC1-A2,\"-12.1,-77.0\",01/29/2025 07:15:00 - 01/29/2025 07:30:00,A2,,2\n",
        );

        let dataset = DatasetReader::new().read(file.path()).unwrap();
        assert_eq!(dataset.kind, DatasetKind::Primary);
        assert_eq!(dataset.vehicle_columns, vec!["car", "bus"]);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[0].control_point, "PC1-A2");
        assert_eq!(dataset.records[0].count("car"), Some(4));
        // empty cell is a missing value, not zero
        assert_eq!(dataset.records[1].counts["car"], None);
        assert_eq!(dataset.records[1].count("bus"), Some(2));
    }

    #[test]
    fn test_read_english_headers() {
        let file = write_temp(
            "PROJECT,LOCATION,DATA SOURCE,GEOLOCATION,INTERVAL,MOVEMENT,TRICYCLE\n\
             P1,loc,PC2,geo,01/29/2025 07:00:00 - 01/29/2025 07:05:00,B1,3\n",
        );

        let dataset = DatasetReader::new().read(file.path()).unwrap();
        assert_eq!(dataset.kind, DatasetKind::Tracked);
        assert_eq!(dataset.vehicle_columns, vec!["tricycle"]);
        assert_eq!(dataset.records[0].count("tricycle"), Some(3));
    }

    #[test]
    fn test_bad_interval_is_fatal_for_file() {
        let file = write_temp(
            "FUENTE DE DATOS,INTERVALO,MOVIMIENTO,CAR\n\
             PC1,garbage,A2,4\n",
        );
        assert!(DatasetReader::new().read(file.path()).is_err());
    }

    #[test]
    fn test_missing_movement_column_is_fatal() {
        let file = write_temp(
            "FUENTE DE DATOS,INTERVALO,CAR\n\
             PC1,01/29/2025 07:00:00 - 01/29/2025 07:15:00,4\n",
        );
        let err = DatasetReader::new().read(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { .. }));
    }

    #[test]
    fn test_day_ordinal() {
        assert_eq!(day_ordinal("3.miercoles_29-01.csv"), Some(3));
        assert_eq!(day_ordinal("12"), Some(12));
        assert_eq!(day_ordinal("complementario.csv"), None);
    }

    #[test]
    fn test_discover_day_files() -> crate::error::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("2.day.csv"), "x")?;
        std::fs::write(dir.path().join("1.day.csv"), "x")?;
        std::fs::write(dir.path().join("notes.txt"), "x")?;
        std::fs::create_dir(dir.path().join("3"))?;
        std::fs::write(dir.path().join("3").join("day.csv"), "x")?;

        let days = discover_day_files(dir.path())?;
        let ordinals: Vec<u32> = days.iter().map(|d| d.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);

        Ok(())
    }
}

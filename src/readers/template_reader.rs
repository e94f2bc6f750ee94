use std::path::Path;

use chrono::NaiveDateTime;
use csv::StringRecord;

use crate::error::{PipelineError, Result};
use crate::models::{AnchorMap, StreetMap, TemplateTables, VehicleClassMap};
use crate::readers::read_document;
use crate::utils::constants::{ANCHOR_MAP_FILE, STREET_MAP_FILE, VEHICLE_MAP_FILE};
use crate::utils::text::canonicalize;

/// Accepted canonical header spellings per logical column.
const VEHICLE_INPUT_COLS: &[&str] = &["vehiculo de entrada", "vehicle input"];
const VEHICLE_OUTPUT_COLS: &[&str] = &["vehiculo de salida", "vehicle output"];
const POINT_COLS: &[&str] = &["punto de control", "punto_control", "control point"];
const CLIENT_NAME_COLS: &[&str] = &["nombre para cliente", "client name"];
const ANCHOR_TIME_COLS: &[&str] = &["fecha_hora", "fecha hora", "start time"];

const ANCHOR_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S"];

/// Loads the three reference tables of the template document. Any missing
/// table, column, or empty table is fatal to the whole run.
pub struct TemplateReader;

impl TemplateReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read(&self, template_dir: &Path) -> Result<TemplateTables> {
        Ok(TemplateTables {
            vehicle_classes: self.read_vehicle_classes(&template_dir.join(VEHICLE_MAP_FILE))?,
            streets: self.read_streets(&template_dir.join(STREET_MAP_FILE))?,
            anchors: self.read_anchors(&template_dir.join(ANCHOR_MAP_FILE))?,
        })
    }

    fn read_vehicle_classes(&self, path: &Path) -> Result<VehicleClassMap> {
        let (headers, rows) = read_table(path, VEHICLE_MAP_FILE)?;
        let input_idx = required_column(&headers, VEHICLE_INPUT_COLS, VEHICLE_MAP_FILE)?;
        let output_idx = required_column(&headers, VEHICLE_OUTPUT_COLS, VEHICLE_MAP_FILE)?;

        let mut map = VehicleClassMap::new();
        for row in &rows {
            let input = canonicalize(row.get(input_idx).unwrap_or(""));
            let output = row.get(output_idx).unwrap_or("").trim();
            if input.is_empty() || output.is_empty() {
                continue;
            }
            map.insert(input, output);
        }

        if map.is_empty() {
            return Err(PipelineError::EmptyMappingTable {
                table: VEHICLE_MAP_FILE.to_string(),
            });
        }
        Ok(map)
    }

    fn read_streets(&self, path: &Path) -> Result<StreetMap> {
        let (headers, rows) = read_table(path, STREET_MAP_FILE)?;
        let point_idx = required_column(&headers, POINT_COLS, STREET_MAP_FILE)?;
        let name_idx = required_column(&headers, CLIENT_NAME_COLS, STREET_MAP_FILE)?;

        let mut map = StreetMap::new();
        for row in &rows {
            let point = row.get(point_idx).unwrap_or("").trim();
            let name = row.get(name_idx).unwrap_or("").trim();
            if point.is_empty() || name.is_empty() {
                continue;
            }
            map.insert(point, name);
        }

        if map.is_empty() {
            return Err(PipelineError::EmptyMappingTable {
                table: STREET_MAP_FILE.to_string(),
            });
        }
        Ok(map)
    }

    fn read_anchors(&self, path: &Path) -> Result<AnchorMap> {
        let (headers, rows) = read_table(path, ANCHOR_MAP_FILE)?;
        let point_idx = required_column(&headers, POINT_COLS, ANCHOR_MAP_FILE)?;
        let time_idx = required_column(&headers, ANCHOR_TIME_COLS, ANCHOR_MAP_FILE)?;

        let mut map = AnchorMap::new();
        for row in &rows {
            let point = row.get(point_idx).unwrap_or("").trim();
            let time_text = row.get(time_idx).unwrap_or("").trim();
            if point.is_empty() || time_text.is_empty() {
                continue;
            }
            map.insert(point, parse_anchor_time(time_text)?);
        }

        if map.is_empty() {
            return Err(PipelineError::EmptyMappingTable {
                table: ANCHOR_MAP_FILE.to_string(),
            });
        }
        Ok(map)
    }
}

impl Default for TemplateReader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_table(path: &Path, table: &str) -> Result<(Vec<String>, Vec<StringRecord>)> {
    let text = read_document(path).map_err(|_| PipelineError::MissingData(format!(
        "template table '{}' not readable at {}",
        table,
        path.display()
    )))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows: Vec<StringRecord> = reader.records().collect::<std::result::Result<_, _>>()?;
    if rows.is_empty() {
        return Err(PipelineError::EmptyMappingTable {
            table: table.to_string(),
        });
    }

    let headers: Vec<String> = rows.remove(0).iter().map(canonicalize).collect();
    Ok((headers, rows))
}

fn required_column(headers: &[String], accepted: &[&str], table: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| accepted.contains(&h.as_str()))
        .ok_or_else(|| PipelineError::MissingMappingColumn {
            table: table.to_string(),
            column: accepted[0].to_string(),
        })
}

fn parse_anchor_time(text: &str) -> Result<NaiveDateTime> {
    for format in ANCHOR_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(parsed);
        }
    }
    Err(PipelineError::InvalidFormat(format!(
        "unparseable anchor timestamp '{}'",
        text
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn write_template(dir: &Path) {
        std::fs::write(
            dir.join(VEHICLE_MAP_FILE),
            "VEHICULO DE ENTRADA,VEHICULO DE SALIDA\n\
             car,AUTO\n\
             taxi,AUTO\n\
             bus,BUS\n",
        )
        .unwrap();
        std::fs::write(
            dir.join(STREET_MAP_FILE),
            "PUNTO DE CONTROL,NOMBRE PARA CLIENTE\n\
             PC1,Av. Central / Jr. Union\n",
        )
        .unwrap();
        std::fs::write(
            dir.join(ANCHOR_MAP_FILE),
            "PUNTO_CONTROL,FECHA_HORA\n\
             PC1,2025-01-29 07:00:00\n\
             PC2,01/29/2025 06:45:00\n",
        )
        .unwrap();
    }

    #[test]
    fn test_read_template_tables() {
        let dir = tempfile::tempdir().unwrap();
        write_template(dir.path());

        let tables = TemplateReader::new().read(dir.path()).unwrap();
        assert_eq!(tables.vehicle_classes.output_classes(), &["AUTO", "BUS"]);
        assert_eq!(
            tables.streets.display_name("PC1"),
            Some("Av. Central / Jr. Union")
        );

        let anchor = tables
            .anchors
            .resolve("PC1", NaiveDate::from_ymd_opt(2025, 1, 29).unwrap())
            .unwrap();
        assert_eq!(anchor.hour(), 7);

        let anchor = tables
            .anchors
            .resolve("PC2", NaiveDate::from_ymd_opt(2025, 1, 29).unwrap())
            .unwrap();
        assert_eq!(anchor.minute(), 45);
    }

    #[test]
    fn test_missing_column_names_table() {
        let dir = tempfile::tempdir().unwrap();
        write_template(dir.path());
        std::fs::write(dir.path().join(VEHICLE_MAP_FILE), "WRONG,COLUMNS\na,b\n").unwrap();

        let err = TemplateReader::new().read(dir.path()).unwrap_err();
        match err {
            PipelineError::MissingMappingColumn { table, .. } => {
                assert_eq!(table, VEHICLE_MAP_FILE)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_table_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_template(dir.path());
        std::fs::remove_file(dir.path().join(ANCHOR_MAP_FILE)).unwrap();

        assert!(TemplateReader::new().read(dir.path()).is_err());
    }
}

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::processors::{HomologatedReport, PedestrianReport};
use crate::utils::constants::{DATE_FORMAT, TIME_FORMAT};

const KEY_HEADERS: [&str; 7] = [
    "PC",
    "INTERSECCION",
    "FECHA",
    "HORA INICIO",
    "HORA TERMINO",
    "MOVIMIENTO",
    "CUARTO",
];

/// Writes the final homologated reports.
pub struct ReportWriter;

impl ReportWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_vehicle_report(&self, report: &HomologatedReport, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(path)?;

        let mut headers: Vec<String> = KEY_HEADERS.iter().map(|h| h.to_string()).collect();
        headers.extend(report.categories.iter().cloned());
        writer.write_record(&headers)?;

        for row in &report.rows {
            let mut record = vec![
                row.control_point.clone(),
                row.intersection.clone().unwrap_or_default(),
                row.date.format(DATE_FORMAT).to_string(),
                row.start.format(TIME_FORMAT).to_string(),
                row.end.format(TIME_FORMAT).to_string(),
                row.movement.clone(),
                row.quarter.clone(),
            ];
            record.extend(row.counts.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn write_pedestrian_report(&self, report: &PedestrianReport, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(path)?;

        let mut headers: Vec<String> = KEY_HEADERS.iter().map(|h| h.to_string()).collect();
        headers.push("PERSONA".to_string());
        writer.write_record(&headers)?;

        for row in &report.rows {
            writer.write_record(&[
                row.control_point.clone(),
                row.intersection.clone().unwrap_or_default(),
                row.date.format(DATE_FORMAT).to_string(),
                row.start.format(TIME_FORMAT).to_string(),
                row.end.format(TIME_FORMAT).to_string(),
                row.movement.clone(),
                row.quarter.clone(),
                row.persons.to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::{HomologatedReport, ReportRow};
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn test_vehicle_report_layout() {
        let report = HomologatedReport {
            categories: vec!["AUTO".to_string(), "BUS".to_string()],
            rows: vec![ReportRow {
                control_point: "PC1".into(),
                intersection: Some("Av. Central".into()),
                date: NaiveDate::from_ymd_opt(2025, 1, 29).unwrap(),
                start: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
                end: NaiveTime::from_hms_opt(7, 15, 0).unwrap(),
                movement: "A2".into(),
                quarter: "7,1".into(),
                counts: vec![5, 0],
            }],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("final_report.csv");
        ReportWriter::new().write_vehicle_report(&report, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "PC,INTERSECCION,FECHA,HORA INICIO,HORA TERMINO,MOVIMIENTO,CUARTO,AUTO,BUS"
        );
        assert_eq!(
            lines.next().unwrap(),
            "PC1,Av. Central,29-01-2025,07:00:00,07:15:00,A2,\"7,1\",5,0"
        );
    }
}

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{error, info};

use crate::error::{PipelineError, Result};
use crate::models::{Dataset, DatasetKind, DayFile, RunConfig, TemplateTables};
use crate::processors::{
    CrossSourceMerger, GapFillMerger, Homologator, IntervalCorrector, PedestrianHomologator,
};
use crate::readers::{DatasetReader, TemplateReader};
use crate::utils::constants::{
    COMPLETED_STAGE_DIR, GAPFILL_STAGE_DIR, PEDESTRIAN_REPORT_FILE, TRACKED_STAGE_DIR,
    VEHICLE_REPORT_FILE,
};
use crate::utils::progress::ProgressReporter;
use crate::writers::{DatasetWriter, ReportWriter};

/// Everything one vehicle run consumes: the template document, the explicit
/// ordered day lists per source family, the complementary documents, and
/// the output root. Discovery of these lists belongs to the caller.
#[derive(Debug, Clone)]
pub struct PipelinePaths {
    pub template_dir: PathBuf,
    pub primary_days: Vec<DayFile>,
    pub tracked_days: Vec<DayFile>,
    pub complementary_files: Vec<PathBuf>,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StageSummary {
    pub stage: &'static str,
    pub processed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stages: Vec<StageSummary>,
    pub report_rows: usize,
    pub report_path: PathBuf,
}

impl RunSummary {
    pub fn total_skipped(&self) -> usize {
        self.stages.iter().map(|s| s.skipped).sum()
    }
}

/// Sequential four-stage batch pipeline; per-file units inside a stage run
/// on a bounded worker pool. A failing file is logged and skipped; a
/// failing shared precondition aborts the run.
pub struct Pipeline {
    config: RunConfig,
    max_workers: usize,
}

impl Pipeline {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            max_workers: num_cpus::get(),
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub async fn run(
        &self,
        paths: &PipelinePaths,
        progress: Option<&ProgressReporter>,
    ) -> Result<RunSummary> {
        let template = TemplateReader::new().read(&paths.template_dir)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        if let Some(p) = progress {
            p.set_message("Correcting tracked-family day files...");
        }
        let (tracked_sets, tracked_summary) = pool.install(|| {
            self.correct_tracked_stage(
                &paths.tracked_days,
                &template,
                &paths.output_dir.join(TRACKED_STAGE_DIR),
            )
        })?;

        if let Some(p) = progress {
            p.set_message("Gap-filling primary day files...");
        }
        let (gapfilled, gapfill_summary) = pool.install(|| {
            self.gap_fill_stage(
                &paths.primary_days,
                &paths.complementary_files,
                &paths.output_dir.join(GAPFILL_STAGE_DIR),
            )
        })?;

        if gapfilled.is_empty() {
            return Err(PipelineError::MissingData(
                "no primary day file survived the gap-fill stage".to_string(),
            ));
        }

        if let Some(p) = progress {
            p.set_message("Joining source families...");
        }
        let (completed, merge_summary) = pool.install(|| {
            self.cross_merge_stage(
                gapfilled,
                &tracked_sets,
                &paths.output_dir.join(COMPLETED_STAGE_DIR),
            )
        })?;

        if let Some(p) = progress {
            p.set_message("Homologating final report...");
        }
        let datasets: Vec<Dataset> = completed.into_iter().map(|(_, ds)| ds).collect();
        let report =
            Homologator::new(&template.vehicle_classes, &template.streets).homologate(&datasets)?;

        let report_path = paths.output_dir.join(VEHICLE_REPORT_FILE);
        ReportWriter::new().write_vehicle_report(&report, &report_path)?;

        let summary = RunSummary {
            stages: vec![tracked_summary, gapfill_summary, merge_summary],
            report_rows: report.rows.len(),
            report_path,
        };
        info!(
            rows = summary.report_rows,
            skipped = summary.total_skipped(),
            "pipeline complete"
        );
        Ok(summary)
    }

    /// Stage 1: per tracked-family day file, re-anchor and interpolate onto
    /// the 15-minute grid.
    fn correct_tracked_stage(
        &self,
        days: &[DayFile],
        template: &TemplateTables,
        out_dir: &Path,
    ) -> Result<(HashMap<u32, Dataset>, StageSummary)> {
        fs::create_dir_all(out_dir)?;
        let reader = DatasetReader::new();
        let writer = DatasetWriter::new();
        let corrector = IntervalCorrector::new(&template.anchors, &self.config);

        let results: Vec<Option<(u32, Dataset)>> = days
            .par_iter()
            .map(|day| {
                let outcome = reader
                    .read(&day.path)
                    .and_then(|dataset| corrector.correct_and_interpolate(&dataset))
                    .and_then(|dataset| {
                        let out_path =
                            out_dir.join(format!("{:02}_tracked.csv", day.ordinal));
                        writer.write(&dataset, &out_path)?;
                        Ok((day.ordinal, dataset))
                    });
                isolate_file_error(&day.path, outcome)
            })
            .collect();

        let total = days.len();
        let mut sets = HashMap::new();
        for (ordinal, dataset) in results.into_iter().flatten() {
            sets.entry(ordinal).or_insert(dataset);
        }
        let summary = StageSummary {
            stage: "interval-correction",
            processed: sets.len(),
            skipped: total - sets.len(),
        };
        Ok((sets, summary))
    }

    /// Stage 2: per primary day file, fill missing cells from the
    /// complementary documents.
    fn gap_fill_stage(
        &self,
        days: &[DayFile],
        complementary_files: &[PathBuf],
        out_dir: &Path,
    ) -> Result<(Vec<(u32, Dataset)>, StageSummary)> {
        fs::create_dir_all(out_dir)?;
        let reader = DatasetReader::new();
        let writer = DatasetWriter::new();
        let merger = GapFillMerger::new();

        // Complementary documents are shared by every day file; read them
        // once, skipping unreadable ones.
        let complements: Vec<Dataset> = complementary_files
            .iter()
            .filter_map(|path| {
                let outcome = reader.read(path).map(|mut dataset| {
                    dataset.kind = DatasetKind::Complementary;
                    dataset
                });
                isolate_file_error(path, outcome)
            })
            .collect();

        let results: Vec<Option<(u32, Dataset)>> = days
            .par_iter()
            .map(|day| {
                let outcome = reader.read(&day.path).and_then(|mut dataset| {
                    let metadata = merger.extract_day_metadata(&dataset)?;
                    let stats = merger.merge(&mut dataset, &complements);
                    for stat in &stats {
                        info!(
                            day = day.ordinal,
                            complement = %stat.label,
                            matched = stat.rows_matched,
                            updated = stat.rows_updated,
                            "gap-fill counters"
                        );
                    }
                    let out_path = out_dir.join(format!(
                        "{:02}_{}_{}_gapfilled.csv",
                        day.ordinal, metadata.day_name, metadata.date_label
                    ));
                    writer.write(&dataset, &out_path)?;
                    Ok((day.ordinal, dataset))
                });
                isolate_file_error(&day.path, outcome)
            })
            .collect();

        let total = days.len();
        let survivors: Vec<(u32, Dataset)> = results.into_iter().flatten().collect();
        let summary = StageSummary {
            stage: "gap-fill",
            processed: survivors.len(),
            skipped: total - survivors.len(),
        };
        Ok((survivors, summary))
    }

    /// Stage 3: join each day's tracked values onto the gap-filled base and
    /// repair remaining gaps.
    fn cross_merge_stage(
        &self,
        gapfilled: Vec<(u32, Dataset)>,
        tracked_sets: &HashMap<u32, Dataset>,
        out_dir: &Path,
    ) -> Result<(Vec<(u32, Dataset)>, StageSummary)> {
        fs::create_dir_all(out_dir)?;
        let writer = DatasetWriter::new();
        let merger = CrossSourceMerger::new();

        let total = gapfilled.len();
        let results: Vec<Option<(u32, Dataset)>> = gapfilled
            .into_par_iter()
            .map(|(ordinal, base)| {
                let label = base.label.clone();
                let outcome = merger
                    .merge(base, tracked_sets.get(&ordinal))
                    .and_then(|dataset| {
                        let out_path =
                            out_dir.join(format!("{:02}_completed.csv", ordinal));
                        writer.write(&dataset, &out_path)?;
                        Ok((ordinal, dataset))
                    });
                isolate_file_error(Path::new(&label), outcome)
            })
            .collect();

        let mut survivors: Vec<(u32, Dataset)> = results.into_iter().flatten().collect();
        survivors.sort_by_key(|(ordinal, _)| *ordinal);
        let summary = StageSummary {
            stage: "cross-merge",
            processed: survivors.len(),
            skipped: total - survivors.len(),
        };
        Ok((survivors, summary))
    }

    /// Pedestrian variant: template streets plus per-file homologation into
    /// a single report.
    pub async fn run_pedestrians(
        &self,
        template_dir: &Path,
        input_files: &[PathBuf],
        output_dir: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<RunSummary> {
        let template = TemplateReader::new().read(template_dir)?;
        let reader = DatasetReader::new();
        let homologator = PedestrianHomologator::new(&template.streets);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        if let Some(p) = progress {
            p.set_message("Homologating pedestrian day files...");
        }

        let day_rows: Vec<_> = pool.install(|| {
            input_files
                .par_iter()
                .map(|path| {
                    let outcome = reader
                        .read(path)
                        .and_then(|dataset| homologator.homologate_day(&dataset));
                    isolate_file_error(path, outcome)
                })
                .collect::<Vec<_>>()
        });

        let total = input_files.len();
        let survivors: Vec<_> = day_rows.into_iter().flatten().collect();
        let processed = survivors.len();

        let report = homologator.combine(survivors)?;
        let report_path = output_dir.join(PEDESTRIAN_REPORT_FILE);
        ReportWriter::new().write_pedestrian_report(&report, &report_path)?;

        Ok(RunSummary {
            stages: vec![StageSummary {
                stage: "pedestrians",
                processed,
                skipped: total - processed,
            }],
            report_rows: report.rows.len(),
            report_path,
        })
    }
}

/// The per-file error boundary: log with file identity and cause, skip the
/// file, keep the stage going.
fn isolate_file_error<T>(path: &Path, outcome: Result<T>) -> Option<T> {
    match outcome {
        Ok(value) => Some(value),
        Err(err) => {
            let wrapped = PipelineError::for_file(path, err);
            error!(cause = %wrapped, "skipping file");
            None
        }
    }
}

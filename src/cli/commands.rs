use std::path::Path;

use validator::Validate;

use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::models::{DatasetKind, RunConfig};
use crate::processors::{Pipeline, PipelinePaths};
use crate::readers::{
    discover_complementary_files, discover_day_files, DatasetReader, TemplateReader,
};
use crate::utils::progress::ProgressReporter;

pub async fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Process {
            template_dir,
            primary_dir,
            tracked_dir,
            complementary_dir,
            output_dir,
            sampling_mode,
            minutes_per_sample,
            hourly_strategy,
            config,
            max_workers,
        } => {
            let run_config = match config {
                Some(path) => RunConfig::from_file(&path)?,
                None => {
                    let run_config = RunConfig::new(sampling_mode, minutes_per_sample)
                        .with_hourly_strategy(hourly_strategy);
                    run_config.validate()?;
                    run_config
                }
            };

            let primary_days = discover_day_files(&primary_dir)?;
            let tracked_days = match &tracked_dir {
                Some(dir) => discover_day_files(dir)?,
                None => Vec::new(),
            };
            let complementary_files = match &complementary_dir {
                Some(dir) => discover_complementary_files(dir)?,
                None => Vec::new(),
            };

            println!("Processing traffic survey data...");
            println!("Primary day files: {}", primary_days.len());
            println!("Tracked day files: {}", tracked_days.len());
            println!("Complementary files: {}", complementary_files.len());
            println!("Workers: {}", max_workers);

            let paths = PipelinePaths {
                template_dir,
                primary_days,
                tracked_days,
                complementary_files,
                output_dir,
            };

            let progress = ProgressReporter::new_spinner("Processing data...", false);
            let pipeline = Pipeline::new(run_config).with_max_workers(max_workers);
            let summary = pipeline.run(&paths, Some(&progress)).await?;
            progress.finish_with_message(&format!(
                "Wrote {} report rows",
                summary.report_rows
            ));

            for stage in &summary.stages {
                println!(
                    "{}: {} processed, {} skipped",
                    stage.stage, stage.processed, stage.skipped
                );
            }
            println!("Final report: {}", summary.report_path.display());
            if summary.total_skipped() > 0 {
                println!(
                    "⚠️  {} file(s) were skipped; see the log for causes",
                    summary.total_skipped()
                );
            }
        }

        Commands::Pedestrians {
            template_dir,
            input_dir,
            output_dir,
            max_workers,
        } => {
            let input_files = discover_complementary_files(&input_dir)?;
            println!("Pedestrian day files: {}", input_files.len());

            let progress = ProgressReporter::new_spinner("Processing pedestrians...", false);
            let pipeline = Pipeline::new(RunConfig::default()).with_max_workers(max_workers);
            let summary = pipeline
                .run_pedestrians(&template_dir, &input_files, &output_dir, Some(&progress))
                .await?;
            progress.finish_with_message(&format!(
                "Wrote {} report rows",
                summary.report_rows
            ));

            println!("Pedestrian report: {}", summary.report_path.display());
        }

        Commands::Validate {
            template_dir,
            primary_dir,
            tracked_dir,
        } => {
            let template = TemplateReader::new().read(&template_dir)?;
            println!("Template loaded:");
            println!("  vehicle classes: {}", template.vehicle_classes.len());
            println!("  control points:  {}", template.streets.len());
            println!("  anchors:         {}", template.anchors.len());

            for (name, dir) in [("primary", primary_dir), ("tracked", tracked_dir)]
                .into_iter()
                .filter_map(|(name, dir)| dir.map(|d| (name, d)))
            {
                classify_directory(name, &dir)?;
            }

            println!("Validation complete - no output files written");
        }
    }

    Ok(())
}

fn classify_directory(name: &str, dir: &Path) -> Result<()> {
    let reader = DatasetReader::new();
    let days = discover_day_files(dir)?;
    println!("{} directory: {} day file(s)", name, days.len());

    for day in days {
        match reader.read(&day.path) {
            Ok(dataset) => {
                let kind = match dataset.kind {
                    DatasetKind::Primary => "primary",
                    DatasetKind::Tracked => "tracked",
                    DatasetKind::Template => "template",
                    DatasetKind::Complementary => "complementary",
                    DatasetKind::Unknown => "unknown",
                };
                println!(
                    "  day {:>2}: {} rows, {} vehicle columns [{}]",
                    day.ordinal,
                    dataset.len(),
                    dataset.vehicle_columns.len(),
                    kind
                );
            }
            Err(err) => {
                println!("  day {:>2}: unreadable ({})", day.ordinal, err);
            }
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    // Ignore failure when a subscriber is already installed (tests)
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

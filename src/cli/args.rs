use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::{HourlyStrategy, SamplingMode};

#[derive(Parser)]
#[command(name = "traffic-homologator")]
#[command(about = "Multi-source traffic survey count reconciliation and homologation")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full vehicle pipeline and write the final report
    Process {
        #[arg(short, long, help = "Directory holding the three template tables")]
        template_dir: PathBuf,

        #[arg(short, long, help = "Primary source family day files")]
        primary_dir: PathBuf,

        #[arg(long, help = "Tracked source family day files (raw 5-minute counts)")]
        tracked_dir: Option<PathBuf>,

        #[arg(long, help = "Complementary documents used for gap-filling")]
        complementary_dir: Option<PathBuf>,

        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        #[arg(long, value_enum, default_value = "hourly")]
        sampling_mode: SamplingMode,

        #[arg(long, default_value = "5", help = "Minutes per raw sample (fifteen-min mode)")]
        minutes_per_sample: u32,

        #[arg(long, value_enum, default_value = "cross-hour-linear")]
        hourly_strategy: HourlyStrategy,

        #[arg(long, help = "JSON run configuration; replaces the sampling flags")]
        config: Option<PathBuf>,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,
    },

    /// Homologate pedestrian count files into the pedestrian report
    Pedestrians {
        #[arg(short, long, help = "Directory holding the three template tables")]
        template_dir: PathBuf,

        #[arg(short, long, help = "Pedestrian day files")]
        input_dir: PathBuf,

        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,
    },

    /// Load the template and classify day files without writing outputs
    Validate {
        #[arg(short, long, help = "Directory holding the three template tables")]
        template_dir: PathBuf,

        #[arg(short, long, help = "Primary source family day files")]
        primary_dir: Option<PathBuf>,

        #[arg(long, help = "Tracked source family day files")]
        tracked_dir: Option<PathBuf>,
    },
}

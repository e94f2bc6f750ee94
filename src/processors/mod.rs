pub mod cross_source;
pub mod gap_fill;
pub mod homologator;
pub mod interval_corrector;
pub mod pedestrians;
pub mod pipeline;

pub use cross_source::CrossSourceMerger;
pub use gap_fill::{ComplementaryStats, DayMetadata, GapFillMerger};
pub use homologator::{HomologatedReport, Homologator, ReportRow};
pub use interval_corrector::IntervalCorrector;
pub use pedestrians::{PedestrianHomologator, PedestrianReport, PedestrianRow};
pub use pipeline::{Pipeline, PipelinePaths, RunSummary, StageSummary};

pub mod config;
pub mod dataset;
pub mod mappings;
pub mod record;

pub use config::{HourlyStrategy, RunConfig, SamplingMode};
pub use dataset::{Dataset, DatasetKind, DayFile};
pub use mappings::{AnchorMap, StreetMap, TemplateTables, VehicleClassMap};
pub use record::{CountRecord, TimeSpan};

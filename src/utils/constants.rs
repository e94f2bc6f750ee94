/// Canonical identifier column names (post-normalization)
pub const COL_PROJECT: &str = "proyecto";
pub const COL_LOCATION: &str = "localizacion";
pub const COL_SOURCE: &str = "fuente de datos";
pub const COL_GEOLOCATION: &str = "geolocalizacion";
pub const COL_INTERVAL: &str = "intervalo";
pub const COL_MOVEMENT: &str = "movimiento";
pub const COL_PERSON: &str = "persona";

/// The vehicle class counted with a distinct method and carried by the
/// tracked source family
pub const TRACKED_CLASS: &str = "tricycle";

/// Wire formats
pub const INTERVAL_SEPARATOR: &str = " - ";
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";
pub const DATE_FORMAT: &str = "%d-%m-%Y";
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Template table file names
pub const VEHICLE_MAP_FILE: &str = "vehicle_classes.csv";
pub const STREET_MAP_FILE: &str = "control_points.csv";
pub const ANCHOR_MAP_FILE: &str = "anchor_times.csv";

/// Stage output directory names
pub const TRACKED_STAGE_DIR: &str = "tracked";
pub const GAPFILL_STAGE_DIR: &str = "gapfilled";
pub const COMPLETED_STAGE_DIR: &str = "completed";
pub const VEHICLE_REPORT_FILE: &str = "final_report.csv";
pub const PEDESTRIAN_REPORT_FILE: &str = "pedestrian_report.csv";

/// Cadence grid
pub const RAW_SAMPLE_MINUTES: i64 = 5;
pub const BUCKET_MINUTES: i64 = 15;
pub const QUARTERS_PER_HOUR: u32 = 4;
pub const QUARTERS_PER_DAY: u32 = 96;

/// Hourly-mode scaling: one 5-minute sample per hour approximates the hour
pub const HOURLY_SCALE_FACTOR: i64 = 3;

/// Quarter weights for the fixed-decay hourly expansion (minutes 0/15/30/45)
pub const FIXED_DECAY_WEIGHTS: [f64; 4] = [1.0, 0.7, 0.4, 0.2];

/// A previous-day anchor is accepted only at or after this hour
pub const LATE_ANCHOR_CUTOVER_HOUR: u32 = 22;

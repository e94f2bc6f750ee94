use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Config parsing error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Template table '{table}' is missing required column '{column}'")]
    MissingMappingColumn { table: String, column: String },

    #[error("Template table '{table}' has no usable rows")]
    EmptyMappingTable { table: String },

    #[error("No anchor timestamp for control point '{control_point}' on {date}")]
    AnchorNotFound {
        control_point: String,
        date: chrono::NaiveDate,
    },

    #[error("No tracked vehicle class column in '{label}'")]
    MissingTrackedColumn { label: String },

    #[error("Required column '{column}' not found in '{label}'")]
    MissingColumn { label: String, column: String },

    #[error("No date token in location text '{location}'")]
    DateTokenNotFound { location: String },

    #[error("Invalid interval text '{0}'")]
    InvalidInterval(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Failed to process '{path}': {source}")]
    FileProcessing {
        path: PathBuf,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl PipelineError {
    /// Wrap an error with the identity of the day file it occurred in.
    pub fn for_file(path: impl Into<PathBuf>, source: PipelineError) -> Self {
        PipelineError::FileProcessing {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

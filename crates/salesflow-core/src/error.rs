// crates/salesflow-core/src/error.rs

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    #[error("column '{column}' row {row}: cannot convert '{value}' to a number")]
    TypeConversion {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Input file not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("failed to write to {sink}: {source}")]
    SinkWrite {
        sink: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("column '{column}' already exists in the dataset")]
    DuplicateColumn { column: String },

    #[error("at least one measure column is required")]
    EmptyMeasureColumns,

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub(crate) fn sink_write(
        sink: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PipelineError::SinkWrite {
            sink: sink.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

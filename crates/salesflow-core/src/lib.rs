pub mod config;
pub mod error;
pub mod observer;
pub mod pipeline;
pub mod processing;
pub mod schema;
pub mod sink;
pub mod source;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use observer::{
    EventLevel, NoopObserver, PipelineObserver, RecordedEvent, RecordingObserver, TracingObserver,
};
pub use pipeline::{process, run, PipelineOutput, RunSummary};
pub use processing::{DataProcessor, ProcessorConfig};
pub use schema::{MeasureColumn, MeasureColumns};
pub use sink::{CsvSink, DatasetSink, SqliteSink};

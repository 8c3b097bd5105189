//! Sanitize, validate and transform steps applied to a sales dataset.
//!
//! Every step borrows its input frame and returns a new one; nothing is
//! modified in place, so steps can be exercised on their own in tests.

use std::sync::Arc;

use crate::error::Result;
use crate::observer::{self, PipelineObserver};
use crate::schema::DEFAULT_KEY_COLUMN;

mod sanitize;
mod transform;
mod validate;

pub use sanitize::title_case;

#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub key_column: String,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            key_column: DEFAULT_KEY_COLUMN.to_string(),
        }
    }
}

pub struct DataProcessor {
    config: ProcessorConfig,
    observer: Arc<dyn PipelineObserver>,
}

impl Default for DataProcessor {
    fn default() -> Self {
        Self {
            config: ProcessorConfig::default(),
            observer: observer::noop(),
        }
    }
}

impl DataProcessor {
    pub fn new(config: ProcessorConfig, observer: Arc<dyn PipelineObserver>) -> Self {
        Self { config, observer }
    }

    pub fn with_observer(observer: Arc<dyn PipelineObserver>) -> Self {
        Self {
            config: ProcessorConfig::default(),
            observer,
        }
    }

    pub fn key_column(&self) -> &str {
        &self.config.key_column
    }

    /// Reports a finished step, or the failure with `context`, then hands the
    /// result back unchanged.
    fn report<T>(&self, stage: &str, done: &str, context: &str, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.observer.info(stage, done),
            Err(err) => self.observer.error(stage, &format!("{context}: {err}")),
        }
        result
    }
}

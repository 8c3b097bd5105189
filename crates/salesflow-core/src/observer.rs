use std::fmt;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

impl EventLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventLevel::Info => "INFO",
            EventLevel::Warn => "WARN",
            EventLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives stage events from the processor, sinks and pipeline runner.
pub trait PipelineObserver: Send + Sync {
    fn event(&self, level: EventLevel, stage: &str, message: &str);

    fn info(&self, stage: &str, message: &str) {
        self.event(EventLevel::Info, stage, message);
    }

    fn warn(&self, stage: &str, message: &str) {
        self.event(EventLevel::Warn, stage, message);
    }

    fn error(&self, stage: &str, message: &str) {
        self.event(EventLevel::Error, stage, message);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn event(&self, _level: EventLevel, _stage: &str, _message: &str) {}
}

/// Forwards events to the `tracing` subscriber installed by the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn event(&self, level: EventLevel, stage: &str, message: &str) {
        match level {
            EventLevel::Info => tracing::info!(stage, "{message}"),
            EventLevel::Warn => tracing::warn!(stage, "{message}"),
            EventLevel::Error => tracing::error!(stage, "{message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub level: EventLevel,
    pub stage: String,
    pub message: String,
}

/// Keeps every event in memory. Used by tests and by callers that want to
/// inspect what a run reported.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, level: EventLevel, needle: &str) -> bool {
        self.events()
            .iter()
            .any(|event| event.level == level && event.message.contains(needle))
    }
}

impl PipelineObserver for RecordingObserver {
    fn event(&self, level: EventLevel, stage: &str, message: &str) {
        if let Ok(mut events) = self.events.lock() {
            events.push(RecordedEvent {
                level,
                stage: stage.to_string(),
                message: message.to_string(),
            });
        }
    }
}

pub(crate) fn noop() -> Arc<dyn PipelineObserver> {
    Arc::new(NoopObserver)
}

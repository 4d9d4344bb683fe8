use crate::{
    context::TelemetryContext,
    convert::properties_or_none,
    models::{
        sanitize::{truncate, MAX_MESSAGE_LENGTH},
        MessageData, Sanitize, SeverityLevel,
    },
};
use chrono::{DateTime, Utc};

/// A printf-style trace statement that is text-searched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceTelemetry {
    /// When the trace was written.
    pub timestamp: Option<DateTime<Utc>>,
    /// Sequence field used to track absolute order of uploaded events.
    pub sequence: Option<String>,
    /// Context of the item.
    pub context: TelemetryContext,
    /// Trace message.
    pub message: String,
    /// Trace severity.
    pub severity_level: Option<SeverityLevel>,
    /// Sampling percentage in `(0, 100]`. `None` means 100.
    pub sampling_percentage: Option<f64>,
}

impl TraceTelemetry {
    /// Create a trace with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Create a trace with the given message and severity.
    pub fn with_severity(message: impl Into<String>, severity_level: SeverityLevel) -> Self {
        Self {
            message: message.into(),
            severity_level: Some(severity_level),
            ..Default::default()
        }
    }
}

impl Sanitize for TraceTelemetry {
    fn sanitize(&mut self) {
        truncate(&mut self.message, MAX_MESSAGE_LENGTH);
        self.context.sanitize();
    }
}

impl From<&TraceTelemetry> for MessageData {
    fn from(trace: &TraceTelemetry) -> Self {
        MessageData {
            ver: 2,
            message: trace.message.clone(),
            severity_level: trace.severity_level,
            properties: properties_or_none(&trace.context.properties),
        }
    }
}

use crate::{
    context::TelemetryContext,
    convert::properties_or_none,
    models::{
        sanitize::{truncate, MAX_NAME_LENGTH},
        EventData, Sanitize,
    },
};
use chrono::{DateTime, Utc};

/// A named occurrence in the application, like a button click or a completed checkout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTelemetry {
    /// When the event happened. Set to the current time on track if missing.
    pub timestamp: Option<DateTime<Utc>>,
    /// Sequence field used to track absolute order of uploaded events.
    pub sequence: Option<String>,
    /// Context of the item.
    pub context: TelemetryContext,
    /// Event name. Keep it low cardinality.
    pub name: String,
    /// Sampling percentage in `(0, 100]`. `None` means 100.
    pub sampling_percentage: Option<f64>,
}

impl EventTelemetry {
    /// Create an event with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl Sanitize for EventTelemetry {
    fn sanitize(&mut self) {
        truncate(&mut self.name, MAX_NAME_LENGTH);
        self.context.sanitize();
    }
}

impl From<&EventTelemetry> for EventData {
    fn from(event: &EventTelemetry) -> Self {
        EventData {
            ver: 2,
            name: event.name.clone(),
            properties: properties_or_none(&event.context.properties),
        }
    }
}

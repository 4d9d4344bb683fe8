use crate::{
    context::TelemetryContext,
    convert::{duration_to_string, properties_or_none},
    models::{
        sanitize::{
            truncate, truncate_opt, MAX_ID_LENGTH, MAX_NAME_LENGTH, MAX_RESULT_CODE_LENGTH,
            MAX_URL_LENGTH,
        },
        RequestData, Sanitize,
    },
};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// An external request handled by the application.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestTelemetry {
    /// When the request started.
    pub timestamp: Option<DateTime<Utc>>,
    /// Sequence field used to track absolute order of uploaded events.
    pub sequence: Option<String>,
    /// Context of the item.
    pub context: TelemetryContext,
    /// Identifier of the request instance.
    pub id: String,
    /// Request name, e.g. `GET /values/{id}`.
    pub name: Option<String>,
    /// Request URL.
    pub url: Option<String>,
    /// Request duration.
    pub duration: Duration,
    /// Result of the request, e.g. an HTTP status code.
    pub response_code: String,
    /// Whether the request was handled successfully.
    pub success: bool,
    /// Source of the request, e.g. the caller's instrumentation key.
    pub source: Option<String>,
    /// Sampling percentage in `(0, 100]`. `None` means 100.
    pub sampling_percentage: Option<f64>,
}

impl RequestTelemetry {
    /// Create a completed request.
    pub fn new(
        name: impl Into<String>,
        start_time: DateTime<Utc>,
        duration: Duration,
        response_code: impl Into<String>,
        success: bool,
    ) -> Self {
        Self {
            timestamp: Some(start_time),
            name: Some(name.into()),
            duration,
            response_code: response_code.into(),
            success,
            ..Default::default()
        }
    }
}

impl Sanitize for RequestTelemetry {
    fn sanitize(&mut self) {
        truncate(&mut self.id, MAX_ID_LENGTH);
        truncate_opt(&mut self.name, MAX_NAME_LENGTH);
        truncate_opt(&mut self.url, MAX_URL_LENGTH);
        truncate(&mut self.response_code, MAX_RESULT_CODE_LENGTH);
        truncate_opt(&mut self.source, MAX_NAME_LENGTH);
        self.context.sanitize();
    }
}

impl From<&RequestTelemetry> for RequestData {
    fn from(request: &RequestTelemetry) -> Self {
        RequestData {
            ver: 2,
            id: request.id.clone(),
            source: request.source.clone(),
            name: request.name.clone(),
            duration: duration_to_string(request.duration),
            response_code: request.response_code.clone(),
            success: request.success,
            url: request.url.clone(),
            properties: properties_or_none(&request.context.properties),
        }
    }
}

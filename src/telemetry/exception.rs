use crate::{
    context::TelemetryContext,
    convert::properties_or_none,
    models::{
        sanitize::{truncate, truncate_opt, MAX_MESSAGE_LENGTH, MAX_NAME_LENGTH},
        ExceptionData, ExceptionDetails, Sanitize, SeverityLevel,
    },
};
use chrono::{DateTime, Utc};
use std::error::Error as StdError;

const NO_MESSAGE: &str = "<no message>";
const NO_TYPE: &str = "<no type>";

/// A handled or unhandled error that occurred in the application.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExceptionTelemetry {
    /// When the error occurred.
    pub timestamp: Option<DateTime<Utc>>,
    /// Sequence field used to track absolute order of uploaded events.
    pub sequence: Option<String>,
    /// Context of the item.
    pub context: TelemetryContext,
    /// Error chain, outermost first.
    pub exceptions: Vec<ExceptionDetails>,
    /// Severity of the error.
    pub severity_level: Option<SeverityLevel>,
    /// Sampling percentage in `(0, 100]`. `None` means 100.
    pub sampling_percentage: Option<f64>,
}

impl ExceptionTelemetry {
    /// Create from an error and its chain of [`source`](std::error::Error::source)s.
    ///
    /// The type name is only known for the outermost error.
    pub fn new<E: StdError + 'static>(error: &E) -> Self {
        let mut exceptions = vec![details(std::any::type_name::<E>(), error)];
        let mut source = error.source();
        while let Some(inner) = source {
            exceptions.push(details(NO_TYPE, inner));
            source = inner.source();
        }
        Self {
            exceptions,
            ..Default::default()
        }
    }

    /// Create from already collected exception details.
    pub fn from_details(exceptions: Vec<ExceptionDetails>) -> Self {
        Self {
            exceptions,
            ..Default::default()
        }
    }
}

fn details(type_name: &str, error: &dyn StdError) -> ExceptionDetails {
    let message = error.to_string();
    ExceptionDetails {
        type_name: type_name.to_string(),
        message: if message.is_empty() {
            NO_MESSAGE.into()
        } else {
            message
        },
        has_full_stack: false,
        stack: None,
    }
}

impl Sanitize for ExceptionTelemetry {
    fn sanitize(&mut self) {
        for exception in self.exceptions.iter_mut() {
            if exception.type_name.is_empty() {
                exception.type_name = NO_TYPE.into();
            }
            if exception.message.is_empty() {
                exception.message = NO_MESSAGE.into();
            }
            truncate(&mut exception.type_name, MAX_NAME_LENGTH);
            truncate(&mut exception.message, MAX_MESSAGE_LENGTH);
            truncate_opt(&mut exception.stack, MAX_MESSAGE_LENGTH);
        }
        self.context.sanitize();
    }
}

impl From<&ExceptionTelemetry> for ExceptionData {
    fn from(exception: &ExceptionTelemetry) -> Self {
        ExceptionData {
            ver: 2,
            exceptions: exception.exceptions.clone(),
            severity_level: exception.severity_level,
            properties: properties_or_none(&exception.context.properties),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer(#[source] Inner);

    #[derive(Debug, thiserror::Error)]
    #[error("")]
    struct Inner;

    #[test]
    fn walks_source_chain() {
        let telemetry = ExceptionTelemetry::new(&Outer(Inner));
        assert_eq!(2, telemetry.exceptions.len());
        assert!(telemetry.exceptions[0].type_name.ends_with("Outer"));
        assert_eq!("outer", telemetry.exceptions[0].message);
        assert_eq!(NO_TYPE, telemetry.exceptions[1].type_name);
        assert_eq!(NO_MESSAGE, telemetry.exceptions[1].message);
    }

    #[test]
    fn sanitize_fills_missing_fields() {
        let mut telemetry = ExceptionTelemetry::from_details(vec![ExceptionDetails {
            type_name: String::new(),
            message: String::new(),
            has_full_stack: false,
            stack: None,
        }]);
        telemetry.sanitize();
        assert_eq!(NO_TYPE, telemetry.exceptions[0].type_name);
        assert_eq!(NO_MESSAGE, telemetry.exceptions[0].message);
    }
}

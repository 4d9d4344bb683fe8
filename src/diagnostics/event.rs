use crate::models::SeverityLevel;
use opentelemetry::{otel_debug, otel_error, otel_info, otel_warn};
use std::borrow::Cow;

/// Keyword bits attached to diagnostic events.
pub mod keywords {
    /// Events a user can act on.
    pub const USER_ACTIONABLE: i64 = 0x1;
    /// Events describing the SDK's own diagnostics.
    pub const DIAGNOSTICS: i64 = 0x2;
    /// Failures reported at verbose level.
    pub const VERBOSE_FAILURE: i64 = 0x4;
    /// Failures reported at error level.
    pub const ERROR_FAILURE: i64 = 0x8;
}

/// Severity of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventLevel {
    /// Always logged.
    LogAlways = 0,
    /// Critical failure.
    Critical = 1,
    /// Error.
    Error = 2,
    /// Warning.
    Warning = 3,
    /// Informational.
    Informational = 4,
    /// Verbose.
    Verbose = 5,
}

impl From<EventLevel> for SeverityLevel {
    fn from(level: EventLevel) -> Self {
        match level {
            EventLevel::LogAlways | EventLevel::Critical => SeverityLevel::Critical,
            EventLevel::Error => SeverityLevel::Error,
            EventLevel::Warning => SeverityLevel::Warning,
            EventLevel::Informational => SeverityLevel::Information,
            EventLevel::Verbose => SeverityLevel::Verbose,
        }
    }
}

/// Static description of a diagnostic event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMetadata {
    /// Event identifier.
    pub event_id: i32,
    /// Message with positional placeholders, e.g. `"Error at {0}, {1}"`.
    pub message_format: Cow<'static, str>,
    /// Keyword bitmask, see [`keywords`].
    pub keywords: i64,
    /// Severity.
    pub level: EventLevel,
}

/// An occurrence of a diagnostic event with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEvent {
    /// Description of the event.
    pub metadata: EventMetadata,
    /// Arguments substituted into the message format, in order.
    pub payload: Vec<String>,
}

/// Identifier of [`DiagnosticEvent::telemetry_initializer_failed`].
pub const TELEMETRY_INITIALIZER_FAILED: i32 = 1;
/// Identifier of [`DiagnosticEvent::item_dropped_no_instrumentation_key`].
pub const ITEM_DROPPED_NO_INSTRUMENTATION_KEY: i32 = 2;
/// Identifier of [`DiagnosticEvent::throttling_started`].
pub const THROTTLING_STARTED: i32 = 3;
/// Identifier of [`DiagnosticEvent::throttling_reset`].
pub const THROTTLING_RESET: i32 = 4;

impl DiagnosticEvent {
    /// Create an event.
    pub fn new(metadata: EventMetadata, payload: Vec<String>) -> Self {
        Self { metadata, payload }
    }

    /// An initializer returned an error.
    pub fn telemetry_initializer_failed(initializer: &str, message: &str) -> Self {
        Self::known(
            TELEMETRY_INITIALIZER_FAILED,
            "Exception while initializing {0}, exception message - {1}",
            keywords::ERROR_FAILURE | keywords::USER_ACTIONABLE,
            EventLevel::Error,
            vec![initializer.to_string(), message.to_string()],
        )
    }

    /// A telemetry item was not sent because no instrumentation key could be resolved.
    pub fn item_dropped_no_instrumentation_key() -> Self {
        Self::known(
            ITEM_DROPPED_NO_INSTRUMENTATION_KEY,
            "Telemetry item was not sent: instrumentation key is empty.",
            keywords::USER_ACTIONABLE,
            EventLevel::Verbose,
            Vec::new(),
        )
    }

    /// Events with the given id are suppressed until the next reset.
    pub fn throttling_started(event_id: i32) -> Self {
        Self::known(
            THROTTLING_STARTED,
            "Diagnostics event throttling has been started for the event {0}",
            keywords::DIAGNOSTICS,
            EventLevel::Informational,
            vec![event_id.to_string()],
        )
    }

    /// Throttling for the given id ended with a periodic reset.
    pub fn throttling_reset(event_id: i32, count: u32) -> Self {
        Self::known(
            THROTTLING_RESET,
            "Diagnostics event throttling has been reset for the event {0}, event was fired {1} times during last interval",
            keywords::DIAGNOSTICS,
            EventLevel::Informational,
            vec![event_id.to_string(), count.to_string()],
        )
    }

    fn known(
        event_id: i32,
        message_format: &'static str,
        keywords: i64,
        level: EventLevel,
        payload: Vec<String>,
    ) -> Self {
        Self {
            metadata: EventMetadata {
                event_id,
                message_format: Cow::Borrowed(message_format),
                keywords,
                level,
            },
            payload,
        }
    }

    /// Event identifier.
    pub fn event_id(&self) -> i32 {
        self.metadata.event_id
    }

    /// Message with the payload substituted.
    pub fn format_message(&self) -> String {
        format_message(&self.metadata.message_format, &self.payload)
    }

    /// Write the event to the internal log.
    pub(crate) fn log(&self) {
        let event_id = self.metadata.event_id;
        let message = self.format_message();
        match self.metadata.level {
            EventLevel::LogAlways | EventLevel::Critical | EventLevel::Error => {
                otel_error!(
                    name: "DiagnosticEvent",
                    event_id = event_id,
                    message = message.as_str()
                );
            }
            EventLevel::Warning => {
                otel_warn!(
                    name: "DiagnosticEvent",
                    event_id = event_id,
                    message = message.as_str()
                );
            }
            EventLevel::Informational => {
                otel_info!(
                    name: "DiagnosticEvent",
                    event_id = event_id,
                    message = message.as_str()
                );
            }
            EventLevel::Verbose => {
                otel_debug!(
                    name: "DiagnosticEvent",
                    event_id = event_id,
                    message = message.as_str()
                );
            }
        }
    }
}

/// Substitutes `{0}`, `{1}`, ... with the matching argument.
///
/// Placeholders without an argument, and anything that is not a valid placeholder, are kept
/// literally. `{{` and `}}` render as single braces.
pub(crate) fn format_message(format: &str, args: &[String]) -> String {
    let mut result = String::with_capacity(format.len());
    let mut rest = format;
    while let Some(index) = rest.find(['{', '}']) {
        result.push_str(&rest[..index]);
        let tail = &rest[index..];
        if tail.starts_with("{{") || tail.starts_with("}}") {
            result.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('{') {
            if let Some(end) = tail.find('}') {
                let arg = tail[1..end]
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| args.get(i));
                if let Some(arg) = arg {
                    result.push_str(arg);
                    rest = &tail[end + 1..];
                    continue;
                }
            }
        }
        result.push_str(&tail[..1]);
        rest = &tail[1..];
    }
    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test_case("Error at {0}, {1}", &["f", "x"], "Error at f, x" ; "positional")]
    #[test_case("{1} before {0}", &["a", "b"], "b before a" ; "out of order")]
    #[test_case("Error at {0}, {1}", &["f"], "Error at f, {1}" ; "missing argument")]
    #[test_case("Error at {0}", &["f", "x"], "Error at f" ; "extra argument")]
    #[test_case("Error at {foo} {", &["f"], "Error at {foo} {" ; "malformed placeholder")]
    #[test_case("{{0}} is {0}", &["x"], "{0} is x" ; "escaped braces")]
    #[test_case("", &[], "" ; "empty")]
    #[test_case("ünïcödé {0}", &["✓"], "ünïcödé ✓" ; "unicode")]
    fn format(format: &'static str, payload: &[&str], expected: &'static str) {
        assert_eq!(expected, format_message(format, &args(payload)));
    }

    #[test]
    fn initializer_failure_message() {
        let event = DiagnosticEvent::telemetry_initializer_failed("MyInitializer", "boom");
        assert_eq!(TELEMETRY_INITIALIZER_FAILED, event.event_id());
        assert_eq!(
            "Exception while initializing MyInitializer, exception message - boom",
            event.format_message()
        );
    }

    #[test]
    fn throttling_reset_message() {
        assert_eq!(
            "Diagnostics event throttling has been reset for the event 7, event was fired 12 times during last interval",
            DiagnosticEvent::throttling_reset(7, 12).format_message()
        );
    }

    #[test_case(EventLevel::LogAlways ; "log always")]
    #[test_case(EventLevel::Error ; "error")]
    #[test_case(EventLevel::Warning ; "warning")]
    #[test_case(EventLevel::Informational ; "informational")]
    #[test_case(EventLevel::Verbose ; "verbose")]
    fn logs_at_every_level(level: EventLevel) {
        let event = DiagnosticEvent::new(
            EventMetadata {
                event_id: 42,
                message_format: "failed at {0}".into(),
                keywords: keywords::DIAGNOSTICS,
                level,
            },
            vec!["step".to_string()],
        );
        event.log();
        assert_eq!("failed at step", event.format_message());
    }
}

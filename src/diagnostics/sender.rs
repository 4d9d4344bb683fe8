use super::{
    event::DiagnosticEvent,
    event_source::DiagnosticsListener,
    scheduler::ThrottlingScheduler,
    throttling::{Throttle, ThrottlingManager},
};
use crate::{
    context_tag_keys::OPERATION_SYNTHETIC_SOURCE,
    models::Sanitize,
    telemetry::{TelemetryItem, TraceTelemetry},
    TelemetryConfiguration,
};
use chrono::Utc;
use opentelemetry::otel_debug;
use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock, Weak},
};

const INTERNAL_PREFIX: &str = "AI (Internal): ";
const SYNTHETIC_SOURCE: &str = "SDKTelemetry";

/// Sends the SDK's own diagnostic events to Application Insights as trace telemetry.
///
/// Events are throttled per event id. Traces go straight to the configured channel, routed to
/// [`diagnostics_instrumentation_key`](DiagnosticsSender::set_diagnostics_instrumentation_key)
/// if set. Without a channel, or once the configuration is dropped, sending does nothing.
pub struct DiagnosticsSender {
    configuration: Weak<TelemetryConfiguration>,
    throttle: Arc<dyn Throttle>,
    diagnostics_instrumentation_key: RwLock<Option<String>>,
}

impl fmt::Debug for DiagnosticsSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticsSender")
            .field(
                "diagnostics_instrumentation_key",
                &self.diagnostics_instrumentation_key(),
            )
            .finish()
    }
}

impl DiagnosticsSender {
    /// Create a sender that uses the given throttle.
    pub fn new(configuration: &Arc<TelemetryConfiguration>, throttle: Arc<dyn Throttle>) -> Self {
        DiagnosticsSender {
            configuration: Arc::downgrade(configuration),
            throttle,
            diagnostics_instrumentation_key: RwLock::new(None),
        }
    }

    /// Create a sender throttled by a [`ThrottlingManager`] with the configuration's
    /// [`ThrottlingSettings`](crate::diagnostics::ThrottlingSettings).
    pub fn with_default_throttling(configuration: &Arc<TelemetryConfiguration>) -> Self {
        let manager = ThrottlingManager::new(
            Arc::new(ThrottlingScheduler::new()),
            configuration.throttling_settings(),
        );
        Self::new(configuration, Arc::new(manager))
    }

    /// Instrumentation key used for diagnostics instead of the configuration's key.
    pub fn diagnostics_instrumentation_key(&self) -> Option<String> {
        self.diagnostics_instrumentation_key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Route diagnostics to a separate instrumentation key.
    pub fn set_diagnostics_instrumentation_key(&self, key: Option<String>) {
        *self
            .diagnostics_instrumentation_key
            .write()
            .unwrap_or_else(PoisonError::into_inner) = key;
    }

    /// Send `event` unless it is throttled.
    pub fn send(&self, event: &DiagnosticEvent) {
        if self.throttle.should_throttle(event.event_id(), Utc::now()) {
            return;
        }
        let Some(configuration) = self.configuration.upgrade() else {
            return;
        };
        let Some(channel) = configuration.telemetry_channel() else {
            return;
        };

        let mut trace = TraceTelemetry::with_severity(
            format!("{}{}", INTERNAL_PREFIX, event.format_message()),
            event.metadata.level.into(),
        );
        trace
            .context
            .properties
            .insert("EventId".into(), event.event_id().to_string());
        trace
            .context
            .properties
            .insert("Keywords".into(), format!("{:#x}", event.metadata.keywords));
        trace
            .context
            .set_tag(OPERATION_SYNTHETIC_SOURCE, SYNTHETIC_SOURCE);
        let Some(instrumentation_key) = self
            .diagnostics_instrumentation_key()
            .filter(|key| !key.is_empty())
            .or_else(|| configuration.instrumentation_key())
        else {
            otel_debug!(
                name: "DiagnosticsSender.NoInstrumentationKey",
                event_id = event.event_id()
            );
            return;
        };
        trace.context.instrumentation_key = Some(instrumentation_key);
        trace.timestamp = Some(Utc::now());
        trace.sanitize();

        channel.send(TelemetryItem::Trace(trace));
    }
}

impl DiagnosticsListener for DiagnosticsSender {
    fn on_event(&self, event: &DiagnosticEvent) {
        self.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        channel::TelemetryChannel,
        diagnostics::{EventLevel, EventMetadata},
        models::SeverityLevel,
    };
    use chrono::DateTime;
    use std::{borrow::Cow, sync::Mutex};

    #[derive(Debug, Default)]
    struct StubChannel(Mutex<Vec<TelemetryItem>>);

    impl TelemetryChannel for StubChannel {
        fn send(&self, item: TelemetryItem) {
            self.0.lock().unwrap().push(item);
        }
    }

    struct FixedThrottle(bool);

    impl Throttle for FixedThrottle {
        fn should_throttle(&self, _event_id: i32, _timestamp: DateTime<Utc>) -> bool {
            self.0
        }
    }

    fn event(format: &'static str, payload: &[&str]) -> DiagnosticEvent {
        DiagnosticEvent::new(
            EventMetadata {
                event_id: 10,
                message_format: Cow::Borrowed(format),
                keywords: 0x20,
                level: EventLevel::Warning,
            },
            payload.iter().map(|p| p.to_string()).collect(),
        )
    }

    fn configured() -> (Arc<TelemetryConfiguration>, Arc<StubChannel>) {
        let channel = Arc::new(StubChannel::default());
        let configuration = Arc::new(TelemetryConfiguration::new());
        configuration.set_instrumentation_key(Some("config key".into()));
        configuration.set_telemetry_channel(channel.clone());
        (configuration, channel)
    }

    fn sent_trace(channel: &StubChannel) -> TraceTelemetry {
        let items = channel.0.lock().unwrap();
        assert_eq!(1, items.len());
        match &items[0] {
            TelemetryItem::Trace(trace) => trace.clone(),
            other => panic!("expected trace, got {:?}", other),
        }
    }

    #[test]
    fn sends_formatted_trace() {
        let (configuration, channel) = configured();
        let sender = DiagnosticsSender::new(&configuration, Arc::new(FixedThrottle(false)));

        sender.send(&event("Error occured at {0}, {1}", &["My function", "some failure"]));

        let trace = sent_trace(&channel);
        assert_eq!(
            "AI (Internal): Error occured at My function, some failure",
            trace.message
        );
        assert_eq!(Some(SeverityLevel::Warning), trace.severity_level);
        assert_eq!(2, trace.context.properties.len());
        assert_eq!("10", trace.context.properties["EventId"]);
        assert_eq!("0x20", trace.context.properties["Keywords"]);
        assert_eq!(
            Some(SYNTHETIC_SOURCE),
            trace.context.tag(OPERATION_SYNTHETIC_SOURCE)
        );
        assert_eq!(Some("config key"), trace.context.instrumentation_key());
    }

    #[test]
    fn uses_separate_instrumentation_key() {
        let (configuration, channel) = configured();
        let sender = DiagnosticsSender::new(&configuration, Arc::new(FixedThrottle(false)));
        sender.set_diagnostics_instrumentation_key(Some("diagnostics key".into()));

        sender.send(&event("Something failed", &[]));

        let trace = sent_trace(&channel);
        assert_eq!(Some("diagnostics key"), trace.context.instrumentation_key());
    }

    #[test]
    fn empty_payload() {
        let (configuration, channel) = configured();
        let sender = DiagnosticsSender::new(&configuration, Arc::new(FixedThrottle(false)));

        sender.send(&event("Something failed", &[]));

        assert_eq!("AI (Internal): Something failed", sent_trace(&channel).message);
    }

    #[test]
    fn throttled_event_is_not_sent() {
        let (configuration, channel) = configured();
        let sender = DiagnosticsSender::new(&configuration, Arc::new(FixedThrottle(true)));

        sender.send(&event("Something failed", &[]));

        assert!(channel.0.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_channel_is_a_no_op() {
        let configuration = Arc::new(TelemetryConfiguration::new());
        let sender = DiagnosticsSender::new(&configuration, Arc::new(FixedThrottle(false)));
        sender.send(&event("Something failed", &[]));
    }

    #[test]
    fn dropped_configuration_is_a_no_op() {
        let (configuration, channel) = configured();
        let sender = DiagnosticsSender::new(&configuration, Arc::new(FixedThrottle(false)));
        drop(configuration);

        sender.send(&event("Something failed", &[]));

        assert!(channel.0.lock().unwrap().is_empty());
    }

    #[test]
    fn no_instrumentation_key_is_a_no_op() {
        let (configuration, channel) = configured();
        configuration.set_instrumentation_key(None);
        let sender = DiagnosticsSender::new(&configuration, Arc::new(FixedThrottle(false)));
        sender.set_diagnostics_instrumentation_key(Some(String::new()));

        sender.send(&event("Something failed", &[]));

        assert!(channel.0.lock().unwrap().is_empty());
    }

    #[test]
    fn long_messages_are_truncated() {
        let (configuration, channel) = configured();
        let sender = DiagnosticsSender::new(&configuration, Arc::new(FixedThrottle(false)));
        let failure = "x".repeat(40_000);

        sender.send(&event("Failure: {0}", &[failure.as_str()]));

        assert_eq!(32768, sent_trace(&channel).message.chars().count());
    }

    #[test]
    fn default_throttling_suppresses_floods() {
        let (configuration, channel) = configured();
        let sender = DiagnosticsSender::with_default_throttling(&configuration);

        for _ in 0..10 {
            sender.send(&event("Something failed", &[]));
        }

        assert_eq!(5, channel.0.lock().unwrap().len());
    }
}

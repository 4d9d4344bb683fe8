use applicationinsights_core::{
    context_tag_keys::{OPERATION_ID, USER_ID},
    diagnostics::{
        DiagnosticEvent, DiagnosticsListener, ITEM_DROPPED_NO_INSTRUMENTATION_KEY,
        TELEMETRY_INITIALIZER_FAILED,
    },
    telemetry::{EventTelemetry, SessionStateTelemetry, TelemetryItem, TraceTelemetry},
    DebugOutput, Envelope, Error, InitializerError, SequencePropertyInitializer, SessionState,
    TelemetryChannel, TelemetryClient, TelemetryConfiguration,
};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

#[derive(Debug, Default)]
struct RecordingChannel {
    items: Mutex<Vec<TelemetryItem>>,
    developer_mode: AtomicBool,
}

impl RecordingChannel {
    fn items(&self) -> Vec<TelemetryItem> {
        self.items.lock().unwrap().clone()
    }
}

impl TelemetryChannel for RecordingChannel {
    fn send(&self, item: TelemetryItem) {
        self.items.lock().unwrap().push(item);
    }

    fn developer_mode(&self) -> bool {
        self.developer_mode.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct RecordingOutput(Mutex<Vec<String>>);

impl DebugOutput for RecordingOutput {
    fn write_line(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }

    fn is_attached(&self) -> bool {
        true
    }
}

#[derive(Default)]
struct RecordingListener(Mutex<Vec<DiagnosticEvent>>);

impl DiagnosticsListener for RecordingListener {
    fn on_event(&self, event: &DiagnosticEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

fn setup(key: Option<&str>) -> (TelemetryClient, Arc<RecordingChannel>) {
    let configuration = Arc::new(TelemetryConfiguration::new());
    configuration.set_instrumentation_key(key.map(String::from));
    let channel = Arc::new(RecordingChannel::default());
    configuration.set_telemetry_channel(channel.clone());
    (TelemetryClient::new(configuration), channel)
}

fn event_properties(item: &TelemetryItem) -> Vec<(String, String)> {
    item.as_property_bearing()
        .map(|p| {
            p.properties()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn resolves_instrumentation_key_from_configuration() {
    let (client, channel) = setup(Some("K"));

    client.track_event("started").unwrap();

    let items = channel.items();
    assert_eq!(1, items.len());
    assert_eq!(Some("K"), items[0].context().instrumentation_key());
    assert!(items[0].timestamp().is_some());
}

#[test]
fn item_key_takes_precedence_over_client_and_configuration() {
    let (mut client, channel) = setup(Some("configuration"));
    client.context_mut().instrumentation_key = Some("client".into());

    let mut event = EventTelemetry::new("explicit");
    event.context.instrumentation_key = Some("item".into());
    client.track(event).unwrap();
    client.track_event("inherited").unwrap();

    let keys: Vec<_> = channel
        .items()
        .iter()
        .map(|item| item.context().instrumentation_key().map(String::from))
        .collect();
    assert_eq!(vec![Some("item".into()), Some("client".into())], keys);
}

#[test]
fn client_context_fills_only_missing_values() {
    let (mut client, channel) = setup(Some("K"));
    client.context_mut().set_tag(USER_ID, "client-user");
    client.context_mut().set_tag(OPERATION_ID, "client-operation");
    client
        .context_mut()
        .properties
        .insert("Environment".into(), "test".into());

    let mut event = EventTelemetry::new("e");
    event.context.set_tag(USER_ID, "item-user");
    client.track(event).unwrap();

    let item = &channel.items()[0];
    assert_eq!(Some("item-user"), item.context().tag(USER_ID));
    assert_eq!(Some("client-operation"), item.context().tag(OPERATION_ID));
    assert_eq!(
        Some("test"),
        item.context().properties.get("Environment").map(String::as_str)
    );
}

#[test]
fn disabled_telemetry_skips_initializers_and_channel() {
    let (client, channel) = setup(Some("K"));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    client.configuration().add_telemetry_initializer(Arc::new(
        move |_: &mut TelemetryItem| -> Result<(), InitializerError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
    ));
    client.configuration().set_disable_telemetry(true);

    client.track_event("e").unwrap();
    client.track_trace("t").unwrap();

    assert!(!client.is_enabled());
    assert_eq!(0, calls.load(Ordering::SeqCst));
    assert!(channel.items().is_empty());
}

#[test]
fn initializers_run_in_order_and_failures_are_reported() {
    let (client, channel) = setup(Some("K"));
    let listener = Arc::new(RecordingListener::default());
    client.configuration().diagnostics().subscribe(listener.clone());

    let order = Arc::new(Mutex::new(Vec::new()));
    for index in 0..3 {
        let order = order.clone();
        client.configuration().add_telemetry_initializer(Arc::new(
            move |item: &mut TelemetryItem| -> Result<(), InitializerError> {
                order.lock().unwrap().push(index);
                if index == 1 {
                    return Err("initializer exploded".into());
                }
                if let Some(p) = item.as_property_bearing_mut() {
                    p.properties_mut()
                        .insert(format!("init{}", index), "ran".into());
                }
                Ok(())
            },
        ));
    }

    client.track_event("e").unwrap();

    assert_eq!(vec![0, 1, 2], *order.lock().unwrap());
    let events = listener.0.lock().unwrap();
    assert_eq!(1, events.len());
    assert_eq!(TELEMETRY_INITIALIZER_FAILED, events[0].event_id());
    assert!(events[0].format_message().contains("initializer exploded"));

    let items = channel.items();
    assert_eq!(1, items.len());
    let properties = event_properties(&items[0]);
    assert!(properties.contains(&("init0".into(), "ran".into())));
    assert!(properties.contains(&("init2".into(), "ran".into())));
}

#[test]
fn missing_key_drops_item_and_writes_debug_output() {
    let (client, channel) = setup(None);
    let output = Arc::new(RecordingOutput::default());
    client.configuration().set_debug_output(output.clone());
    let listener = Arc::new(RecordingListener::default());
    client.configuration().diagnostics().subscribe(listener.clone());

    client.track_event("nobody listens").unwrap();

    assert!(channel.items().is_empty());
    let lines = output.0.lock().unwrap();
    assert_eq!(1, lines.len());
    assert!(lines[0].starts_with("Application Insights Telemetry (unconfigured): "));
    assert!(lines[0].contains("nobody listens"));
    let events = listener.0.lock().unwrap();
    assert_eq!(1, events.len());
    assert_eq!(ITEM_DROPPED_NO_INSTRUMENTATION_KEY, events[0].event_id());
}

#[test]
fn empty_configuration_key_counts_as_missing() {
    let (client, channel) = setup(Some(""));

    client.track_event("e").unwrap();

    assert!(channel.items().is_empty());
}

#[test]
fn fails_without_channel() {
    let configuration = Arc::new(TelemetryConfiguration::new());
    configuration.set_instrumentation_key(Some("K".into()));
    let client = TelemetryClient::new(configuration);

    let result = client.track_event("e");

    assert!(matches!(result, Err(Error::ChannelNotConfigured)));
}

#[test]
fn developer_mode_marks_items_and_mirrors_them() {
    let (client, channel) = setup(Some("K"));
    channel.developer_mode.store(true, Ordering::SeqCst);
    let output = Arc::new(RecordingOutput::default());
    client.configuration().set_debug_output(output.clone());

    client.track_trace("hello").unwrap();

    let items = channel.items();
    assert_eq!(1, items.len());
    assert!(event_properties(&items[0]).contains(&("DeveloperMode".into(), "true".into())));
    let lines = output.0.lock().unwrap();
    assert_eq!(1, lines.len());
    assert!(lines[0].starts_with("Application Insights Telemetry: "));
}

#[test]
fn explicit_timestamp_is_kept() {
    let (client, channel) = setup(Some("K"));
    let timestamp = chrono::DateTime::parse_from_rfc3339("2020-01-02T03:04:05Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let mut trace = TraceTelemetry::new("t");
    trace.timestamp = Some(timestamp);

    client.track(trace).unwrap();

    assert_eq!(Some(timestamp), channel.items()[0].timestamp());
}

#[test]
fn zero_sampling_percentage_drops_item() {
    let (client, channel) = setup(Some("K"));
    let mut event = EventTelemetry::new("sampled out");
    event.sampling_percentage = Some(0.0);

    client.track(event).unwrap();
    client.track_event("kept").unwrap();

    let items = channel.items();
    assert_eq!(1, items.len());
    match &items[0] {
        TelemetryItem::Event(event) => assert_eq!("kept", event.name),
        other => panic!("unexpected item {:?}", other),
    }
}

#[test]
fn sequence_initializer_numbers_items() {
    let (client, channel) = setup(Some("K"));
    client
        .configuration()
        .add_telemetry_initializer(Arc::new(SequencePropertyInitializer::new()));

    client.track_event("first").unwrap();
    client.track_event("second").unwrap();

    let sequences: Vec<_> = channel
        .items()
        .iter()
        .map(|item| item.sequence().map(String::from))
        .collect();
    let first = sequences[0].clone().unwrap();
    let second = sequences[1].clone().unwrap();
    let (prefix, first_counter) = first.split_once(':').unwrap();
    let (second_prefix, second_counter) = second.split_once(':').unwrap();
    assert_eq!(prefix, second_prefix);
    assert!(first_counter.parse::<u64>().unwrap() < second_counter.parse::<u64>().unwrap());
}

#[test]
fn diagnostics_sender_forwards_events_as_traces() {
    let (client, channel) = setup(Some("K"));
    let _sender = client.configuration().enable_diagnostics_sender();

    client
        .configuration()
        .diagnostics()
        .publish(&DiagnosticEvent::item_dropped_no_instrumentation_key());

    let items = channel.items();
    assert_eq!(1, items.len());
    match &items[0] {
        TelemetryItem::Trace(trace) => {
            assert!(trace.message.starts_with("AI (Internal): "));
            assert_eq!(
                Some("SDKTelemetry"),
                trace
                    .context
                    .tag(applicationinsights_core::context_tag_keys::OPERATION_SYNTHETIC_SOURCE)
            );
        }
        other => panic!("unexpected item {:?}", other),
    }
}

#[test]
fn sampling_percentage_reaches_the_envelope_unchanged() {
    let (client, channel) = setup(Some("K"));
    // Operation ids hash to stable scores: about 1.9 for "kept-operation", 71.2 for "op".
    let mut kept = EventTelemetry::new("kept");
    kept.sampling_percentage = Some(12.5);
    kept.context.set_tag(OPERATION_ID, "kept-operation");
    let mut dropped = EventTelemetry::new("dropped");
    dropped.sampling_percentage = Some(12.5);
    dropped.context.set_tag(OPERATION_ID, "op");

    client.track(kept).unwrap();
    client.track(dropped).unwrap();

    let items = channel.items();
    assert_eq!(1, items.len());
    let sampled = items[0].as_sampled().and_then(|s| s.sampling_percentage());
    assert_eq!(Some(12.5), sampled);
    assert_eq!(Some(12.5), Envelope::from(&items[0]).sample_rate());
}

#[test]
fn developer_mode_skips_items_without_properties() {
    let (client, channel) = setup(Some("K"));
    channel.developer_mode.store(true, Ordering::SeqCst);

    client
        .track(SessionStateTelemetry::new(SessionState::Start))
        .unwrap();

    let items = channel.items();
    assert_eq!(1, items.len());
    assert!(items[0].as_property_bearing().is_none());
    assert!(!items[0].context().properties.contains_key("DeveloperMode"));
    let json = Envelope::from(&items[0]).to_json().unwrap();
    assert!(!json.contains("DeveloperMode"));
}

#[test]
fn diagnostics_without_instrumentation_key_are_not_sent() {
    let (client, channel) = setup(None);
    let output = Arc::new(RecordingOutput::default());
    client.configuration().set_debug_output(output.clone());
    let _sender = client.configuration().enable_diagnostics_sender();

    client.track_event("e").unwrap();

    assert!(channel.items().is_empty());
    assert_eq!(1, output.0.lock().unwrap().len());
}

#[test]
fn diagnostics_traces_are_truncated() {
    let (client, channel) = setup(Some("K"));
    let _sender = client.configuration().enable_diagnostics_sender();
    client.configuration().add_telemetry_initializer(Arc::new(
        |_: &mut TelemetryItem| -> Result<(), InitializerError> {
            Err("x".repeat(40_000).into())
        },
    ));

    client.track_event("e").unwrap();

    let items = channel.items();
    assert_eq!(2, items.len());
    let trace = items
        .iter()
        .find_map(|item| match item {
            TelemetryItem::Trace(trace) => Some(trace),
            _ => None,
        })
        .unwrap();
    assert_eq!(32768, trace.message.chars().count());
}

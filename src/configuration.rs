use crate::{
    channel::{InMemoryChannel, TelemetryChannel},
    connection_string::{ConnectionString, CONNECTION_STRING_ENV},
    debug_output::{DebugOutput, NullDebugOutput},
    diagnostics::{
        DiagnosticsEventSource, DiagnosticsListener, DiagnosticsSender, ThrottlingSettings,
    },
    initializer::TelemetryInitializer,
    Error,
};
use opentelemetry_http::HttpClient;
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError, RwLock,
    },
};

/// Settings shared by all [`TelemetryClient`](crate::TelemetryClient)s created from it.
///
/// Clients hold the configuration in an [`Arc`] and read it on every call, so changes apply to
/// telemetry tracked afterwards.
///
/// ```
/// use applicationinsights_core::{TelemetryClient, TelemetryConfiguration};
/// use std::sync::Arc;
///
/// let configuration = Arc::new(TelemetryConfiguration::new());
/// configuration.set_instrumentation_key(Some("...".into()));
/// let client = TelemetryClient::new(configuration.clone());
/// configuration.set_disable_telemetry(true);
/// assert!(!client.is_enabled());
/// ```
pub struct TelemetryConfiguration {
    disable_telemetry: AtomicBool,
    instrumentation_key: RwLock<Option<String>>,
    telemetry_initializers: RwLock<Vec<Arc<dyn TelemetryInitializer>>>,
    telemetry_channel: RwLock<Option<Arc<dyn TelemetryChannel>>>,
    debug_output: RwLock<Arc<dyn DebugOutput>>,
    throttling_settings: RwLock<ThrottlingSettings>,
    diagnostics: DiagnosticsEventSource,
    diagnostics_sender: Mutex<Option<Arc<DiagnosticsSender>>>,
}

impl fmt::Debug for TelemetryConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryConfiguration")
            .field("disable_telemetry", &self.disable_telemetry())
            .field("instrumentation_key", &self.instrumentation_key())
            .field(
                "telemetry_initializers",
                &self
                    .telemetry_initializers()
                    .iter()
                    .map(|i| i.name().to_string())
                    .collect::<Vec<_>>(),
            )
            .field("telemetry_channel", &self.telemetry_channel())
            .field("debug_output", &self.debug_output())
            .field("throttling_settings", &self.throttling_settings())
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

impl Default for TelemetryConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

fn read<T: Clone>(lock: &RwLock<T>) -> T {
    lock.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn write<T>(lock: &RwLock<T>, value: T) {
    *lock.write().unwrap_or_else(PoisonError::into_inner) = value;
}

impl TelemetryConfiguration {
    /// Create an empty configuration without instrumentation key and channel.
    pub fn new() -> Self {
        TelemetryConfiguration {
            disable_telemetry: AtomicBool::new(false),
            instrumentation_key: RwLock::new(None),
            telemetry_initializers: RwLock::new(Vec::new()),
            telemetry_channel: RwLock::new(None),
            debug_output: RwLock::new(Arc::new(NullDebugOutput)),
            throttling_settings: RwLock::new(ThrottlingSettings::default()),
            diagnostics: DiagnosticsEventSource::new(),
            diagnostics_sender: Mutex::new(None),
        }
    }

    /// Create a configuration from a connection string.
    ///
    /// Sets the instrumentation key and installs an [`InMemoryChannel`] that posts to the
    /// ingestion endpoint using `client`.
    ///
    /// ```
    /// # #[cfg(feature = "reqwest-client")] {
    /// let connection_string = "InstrumentationKey=...;IngestionEndpoint=https://westus2-0.in.applicationinsights.azure.com/";
    /// let configuration = applicationinsights_core::TelemetryConfiguration::from_connection_string(
    ///     connection_string,
    ///     reqwest::Client::new(),
    /// )?;
    /// # }
    /// # Ok::<(), applicationinsights_core::Error>(())
    /// ```
    pub fn from_connection_string<C: HttpClient + 'static>(
        connection_string: &str,
        client: C,
    ) -> Result<Self, Error> {
        let connection_string: ConnectionString = connection_string.parse()?;
        let endpoint = connection_string.track_endpoint()?;
        let configuration = Self::new();
        configuration.set_instrumentation_key(Some(connection_string.instrumentation_key));
        configuration.set_telemetry_channel(Arc::new(InMemoryChannel::new(client, endpoint)));
        Ok(configuration)
    }

    /// Create a configuration from the connection string in the
    /// `APPLICATIONINSIGHTS_CONNECTION_STRING` environment variable.
    pub fn from_env<C: HttpClient + 'static>(client: C) -> Result<Self, Error> {
        let connection_string =
            std::env::var(CONNECTION_STRING_ENV).map_err(Error::MissingConnectionString)?;
        Self::from_connection_string(&connection_string, client)
    }

    /// Whether tracking is disabled for all clients.
    pub fn disable_telemetry(&self) -> bool {
        self.disable_telemetry.load(Ordering::Relaxed)
    }

    /// Disable or enable tracking for all clients.
    pub fn set_disable_telemetry(&self, disable_telemetry: bool) {
        self.disable_telemetry
            .store(disable_telemetry, Ordering::Relaxed);
    }

    /// Default instrumentation key. An empty key counts as missing.
    pub fn instrumentation_key(&self) -> Option<String> {
        read(&self.instrumentation_key).filter(|key| !key.is_empty())
    }

    /// Set the default instrumentation key.
    pub fn set_instrumentation_key(&self, instrumentation_key: Option<String>) {
        write(&self.instrumentation_key, instrumentation_key);
    }

    /// Append an initializer. Initializers run in the order they were added.
    pub fn add_telemetry_initializer(&self, initializer: Arc<dyn TelemetryInitializer>) {
        self.telemetry_initializers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(initializer);
    }

    /// Registered initializers in execution order.
    pub fn telemetry_initializers(&self) -> Vec<Arc<dyn TelemetryInitializer>> {
        read(&self.telemetry_initializers)
    }

    /// Channel telemetry is handed to.
    pub fn telemetry_channel(&self) -> Option<Arc<dyn TelemetryChannel>> {
        read(&self.telemetry_channel)
    }

    /// Set the channel telemetry is handed to.
    pub fn set_telemetry_channel(&self, channel: Arc<dyn TelemetryChannel>) {
        write(&self.telemetry_channel, Some(channel));
    }

    /// Remove the channel. Tracking fails with [`Error::ChannelNotConfigured`] afterwards.
    pub fn remove_telemetry_channel(&self) -> Option<Arc<dyn TelemetryChannel>> {
        self.telemetry_channel
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Local debug sink.
    pub fn debug_output(&self) -> Arc<dyn DebugOutput> {
        read(&self.debug_output)
    }

    /// Set the local debug sink.
    pub fn set_debug_output(&self, debug_output: Arc<dyn DebugOutput>) {
        write(&self.debug_output, debug_output);
    }

    /// Limits for self-diagnostics throttling.
    pub fn throttling_settings(&self) -> ThrottlingSettings {
        read(&self.throttling_settings)
    }

    /// Set the limits used by diagnostics senders created afterwards.
    pub fn set_throttling_settings(&self, settings: ThrottlingSettings) {
        write(&self.throttling_settings, settings);
    }

    /// Source of the SDK's own diagnostic events.
    pub fn diagnostics(&self) -> &DiagnosticsEventSource {
        &self.diagnostics
    }

    /// Forward the SDK's own diagnostic events to Application Insights through this
    /// configuration's channel.
    ///
    /// The sender is created and subscribed once. Later calls return the same sender.
    pub fn enable_diagnostics_sender(self: &Arc<Self>) -> Arc<DiagnosticsSender> {
        let mut enabled = self
            .diagnostics_sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = enabled.as_ref() {
            return sender.clone();
        }
        let sender = Arc::new(DiagnosticsSender::with_default_throttling(self));
        let listener: Arc<dyn DiagnosticsListener> = sender.clone();
        self.diagnostics.subscribe(listener);
        *enabled = Some(sender.clone());
        sender
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connection_string::ParseError, diagnostics::DiagnosticEvent};
    use async_trait::async_trait;
    use bytes::Bytes;
    use http::{Request, Response};
    use opentelemetry_http::HttpError;

    #[derive(Debug)]
    struct NoopClient;

    #[async_trait]
    impl HttpClient for NoopClient {
        async fn send_bytes(&self, _request: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
            Ok(Response::new(Bytes::new()))
        }
    }

    #[test]
    fn from_connection_string() {
        let configuration = TelemetryConfiguration::from_connection_string(
            "InstrumentationKey=instr_key;IngestionEndpoint=https://ingest/",
            NoopClient,
        )
        .unwrap();
        assert_eq!(Some("instr_key".into()), configuration.instrumentation_key());
        assert!(format!("{:?}", configuration.telemetry_channel().unwrap())
            .contains("https://ingest/v2/track"));
    }

    #[test]
    fn from_invalid_connection_string() {
        let result =
            TelemetryConfiguration::from_connection_string("IngestionEndpoint=ingest", NoopClient);
        assert!(matches!(
            result,
            Err(Error::InvalidConnectionString(
                ParseError::MissingInstrumentationKey
            ))
        ));
    }

    #[test]
    fn empty_instrumentation_key_is_missing() {
        let configuration = TelemetryConfiguration::new();
        configuration.set_instrumentation_key(Some(String::new()));
        assert_eq!(None, configuration.instrumentation_key());
    }

    #[test]
    fn diagnostics_sender_is_subscribed() {
        let configuration = Arc::new(TelemetryConfiguration::new());
        let _sender = configuration.enable_diagnostics_sender();
        assert_eq!(1, configuration.diagnostics().listener_count());
        configuration
            .diagnostics()
            .publish(&DiagnosticEvent::item_dropped_no_instrumentation_key());
    }

    #[test]
    fn enabling_diagnostics_sender_twice_reuses_it() {
        let configuration = Arc::new(TelemetryConfiguration::new());
        let first = configuration.enable_diagnostics_sender();
        let second = configuration.enable_diagnostics_sender();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(1, configuration.diagnostics().listener_count());
    }
}

use crate::{
    context::TelemetryContext,
    diagnostics::DiagnosticEvent,
    models::{Envelope, Properties, Sanitize, SeverityLevel},
    sampling::is_sampled_in,
    telemetry::{
        DependencyTelemetry, EventTelemetry, ExceptionTelemetry, MetricTelemetry,
        PageViewTelemetry, RequestTelemetry, TelemetryItem, TraceTelemetry,
    },
    Error, TelemetryConfiguration,
};
use chrono::{DateTime, Utc};
use opentelemetry::{otel_debug, otel_warn};
use std::{error::Error as StdError, sync::Arc, time::Duration};

const DEVELOPER_MODE_PROPERTY: &str = "DeveloperMode";
const UNCONFIGURED_PREFIX: &str = "Application Insights Telemetry (unconfigured): ";
const DEVELOPER_MODE_PREFIX: &str = "Application Insights Telemetry: ";

/// Sends telemetry to Application Insights.
///
/// ```
/// use applicationinsights_core::{TelemetryClient, TelemetryConfiguration};
/// use std::sync::Arc;
///
/// let configuration = Arc::new(TelemetryConfiguration::new());
/// configuration.set_disable_telemetry(true);
/// let client = TelemetryClient::new(configuration);
/// client.track_event("started")?;
/// # Ok::<(), applicationinsights_core::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct TelemetryClient {
    configuration: Arc<TelemetryConfiguration>,
    context: TelemetryContext,
}

impl TelemetryClient {
    /// Create a client reading `configuration` on every call.
    pub fn new(configuration: Arc<TelemetryConfiguration>) -> Self {
        TelemetryClient {
            configuration,
            context: TelemetryContext::default(),
        }
    }

    /// Configuration used by this client.
    pub fn configuration(&self) -> &Arc<TelemetryConfiguration> {
        &self.configuration
    }

    /// Context copied into every tracked item.
    pub fn context(&self) -> &TelemetryContext {
        &self.context
    }

    /// Mutable context copied into every tracked item.
    pub fn context_mut(&mut self) -> &mut TelemetryContext {
        &mut self.context
    }

    /// Whether telemetry is sent at all.
    pub fn is_enabled(&self) -> bool {
        !self.configuration.disable_telemetry()
    }

    /// Prepare `item` for sending without sending it.
    ///
    /// Sets a missing timestamp, copies the client's context where the item has no value and runs
    /// all initializers.
    pub fn initialize(&self, item: &mut TelemetryItem) {
        if item.timestamp().is_none() {
            item.set_timestamp(Utc::now());
        }
        item.context_mut().merge_from(&self.context);

        for initializer in self.configuration.telemetry_initializers() {
            if let Err(err) = initializer.initialize(item) {
                self.configuration
                    .diagnostics()
                    .publish(&DiagnosticEvent::telemetry_initializer_failed(
                        initializer.name(),
                        &err.to_string(),
                    ));
            }
        }
    }

    /// Send `item` to the configured channel.
    ///
    /// Items without a resolvable instrumentation key and items excluded by sampling are dropped.
    /// Fails only if no channel is configured.
    pub fn track(&self, item: impl Into<TelemetryItem>) -> Result<(), Error> {
        if !self.is_enabled() {
            return Ok(());
        }
        let mut item = item.into();
        self.initialize(&mut item);

        let Some(instrumentation_key) = item
            .context()
            .instrumentation_key()
            .map(String::from)
            .or_else(|| self.configuration.instrumentation_key())
        else {
            self.configuration
                .diagnostics()
                .publish(&DiagnosticEvent::item_dropped_no_instrumentation_key());
            self.write_debug_output(UNCONFIGURED_PREFIX, &item);
            return Ok(());
        };
        item.context_mut().instrumentation_key = Some(instrumentation_key);

        if !is_sampled_in(&item) {
            otel_debug!(name: "TelemetryClient.SampledOut", item_type = item.type_name());
            return Ok(());
        }

        let channel = self
            .configuration
            .telemetry_channel()
            .ok_or(Error::ChannelNotConfigured)?;

        item.sanitize();
        if channel.developer_mode() {
            if let Some(properties) = item.as_property_bearing_mut() {
                properties
                    .properties_mut()
                    .insert(DEVELOPER_MODE_PROPERTY.into(), "true".into());
            }
            self.write_debug_output(DEVELOPER_MODE_PREFIX, &item);
        }

        channel.send(item);
        Ok(())
    }

    fn write_debug_output(&self, prefix: &str, item: &TelemetryItem) {
        let debug_output = self.configuration.debug_output();
        if !debug_output.is_attached() {
            return;
        }
        match Envelope::from(item).to_json() {
            Ok(json) => debug_output.write_line(&format!("{}{}", prefix, json)),
            Err(err) => {
                otel_warn!(
                    name: "TelemetryClient.DebugOutputSerializeFailed",
                    error = format!("{}", err)
                );
            }
        }
    }

    /// Deliver everything accepted by the channel so far.
    pub async fn flush(&self) -> Result<(), Error> {
        let channel = self
            .configuration
            .telemetry_channel()
            .ok_or(Error::ChannelNotConfigured)?;
        channel.flush().await
    }

    /// Track a custom event.
    pub fn track_event(&self, name: impl Into<String>) -> Result<(), Error> {
        self.track(EventTelemetry::new(name))
    }

    /// Track a custom event with properties.
    pub fn track_event_with_properties(
        &self,
        name: impl Into<String>,
        properties: Properties,
    ) -> Result<(), Error> {
        let mut event = EventTelemetry::new(name);
        event.context.properties = properties;
        self.track(event)
    }

    /// Track a single metric measurement.
    pub fn track_metric(&self, name: impl Into<String>, value: f64) -> Result<(), Error> {
        self.track(MetricTelemetry::new(name, value))
    }

    /// Track a single metric measurement with properties.
    pub fn track_metric_with_properties(
        &self,
        name: impl Into<String>,
        value: f64,
        properties: Properties,
    ) -> Result<(), Error> {
        let mut metric = MetricTelemetry::new(name, value);
        metric.context.properties = properties;
        self.track(metric)
    }

    /// Track a trace message.
    pub fn track_trace(&self, message: impl Into<String>) -> Result<(), Error> {
        self.track(TraceTelemetry::new(message))
    }

    /// Track a trace message with a severity.
    pub fn track_trace_with_severity(
        &self,
        message: impl Into<String>,
        severity_level: SeverityLevel,
    ) -> Result<(), Error> {
        self.track(TraceTelemetry::with_severity(message, severity_level))
    }

    /// Track an error and its chain of sources.
    pub fn track_exception<E: StdError + 'static>(&self, error: &E) -> Result<(), Error> {
        self.track(ExceptionTelemetry::new(error))
    }

    /// Track a page view.
    pub fn track_page_view(&self, name: impl Into<String>) -> Result<(), Error> {
        self.track(PageViewTelemetry::new(name))
    }

    /// Track a handled request.
    pub fn track_request(
        &self,
        name: impl Into<String>,
        start_time: DateTime<Utc>,
        duration: Duration,
        response_code: impl Into<String>,
        success: bool,
    ) -> Result<(), Error> {
        self.track(RequestTelemetry::new(
            name,
            start_time,
            duration,
            response_code,
            success,
        ))
    }

    /// Track a call to a remote dependency.
    pub fn track_dependency(
        &self,
        name: impl Into<String>,
        command_name: impl Into<String>,
        start_time: DateTime<Utc>,
        duration: Duration,
        success: bool,
    ) -> Result<(), Error> {
        self.track(DependencyTelemetry::new(
            name,
            command_name,
            start_time,
            duration,
            success,
        ))
    }
}

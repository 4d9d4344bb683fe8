//! An [Azure Application Insights] telemetry client.
//!
//! [Azure Application Insights]: https://docs.microsoft.com/en-us/azure/azure-monitor/app/app-insights-overview
//!
//! **Disclaimer**: This is not an official Microsoft product.
//!
//! # Usage
//!
//! Create a [`TelemetryConfiguration`], share it between [`TelemetryClient`]s and track
//! telemetry:
//!
//! ```rust,no_run
//! # #[cfg(feature = "reqwest-client")]
//! # async fn run() -> Result<(), applicationinsights_core::Error> {
//! use applicationinsights_core::{TelemetryClient, TelemetryConfiguration};
//! use std::sync::Arc;
//!
//! let configuration = Arc::new(TelemetryConfiguration::from_env(reqwest::Client::new())?);
//! let client = TelemetryClient::new(configuration);
//!
//! client.track_event("started")?;
//! client.track_metric("queue length", 42.0)?;
//! client.flush().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Tracking pipeline
//!
//! [`TelemetryClient::track`] processes every item in this order:
//!
//! 1. Nothing happens if telemetry is disabled in the configuration.
//! 2. A missing timestamp is set to the current time.
//! 3. The client's [`TelemetryContext`] is copied into the item where the item has no value of
//!    its own.
//! 4. All [`TelemetryInitializer`]s run in registration order. Errors are published as
//!    [`DiagnosticEvent`](diagnostics::DiagnosticEvent)s and do not stop the remaining
//!    initializers.
//! 5. The instrumentation key is taken from the item, or else from the configuration. Without
//!    one, the item is written to the [`DebugOutput`] (if attached) and dropped.
//! 6. Items with a sampling percentage below 100 may be sampled out.
//! 7. Fields are truncated to the limits accepted by Application Insights.
//! 8. In developer mode, a `DeveloperMode` property is added and the item is mirrored to the
//!    debug output.
//! 9. The item is handed to the [`TelemetryChannel`]. This fails with
//!    [`Error::ChannelNotConfigured`] if there is none.
//!
//! # Self-diagnostics
//!
//! Failures inside the SDK are published on
//! [`TelemetryConfiguration::diagnostics`] and logged with the `internal-logs` feature. Call
//! [`TelemetryConfiguration::enable_diagnostics_sender`] to also send them to Application
//! Insights as traces. Repeated events are throttled per event id.
#![doc(html_root_url = "https://docs.rs/applicationinsights-core/0.1.0")]
#![deny(missing_docs, unreachable_pub, missing_debug_implementations)]

pub mod channel;
mod client;
mod configuration;
mod connection_string;
mod context;
mod convert;
mod debug_output;
pub mod diagnostics;
mod error;
mod initializer;
mod models;
mod sampling;
pub mod telemetry;

pub use channel::{InMemoryChannel, TelemetryChannel};
pub use client::TelemetryClient;
pub use configuration::TelemetryConfiguration;
pub use connection_string::{ParseError, CONNECTION_STRING_ENV};
pub use context::TelemetryContext;
pub use debug_output::{DebugOutput, NullDebugOutput, StderrDebugOutput};
pub use error::Error;
pub use initializer::{InitializerError, SequencePropertyInitializer, TelemetryInitializer};
pub use models::{
    context_tag_keys,
    dependency_kind::{DependencyKind, UnknownDependencyKind},
    envelope::Envelope,
    exception_details::ExceptionDetails,
    sanitize::{Properties, Sanitize},
    session_state_data::SessionState,
    severity_level::SeverityLevel,
};

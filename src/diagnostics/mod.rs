//! Self-diagnostics of the SDK.
//!
//! Failures inside the SDK are reported as [`DiagnosticEvent`]s on the configuration's
//! [`DiagnosticsEventSource`]. A subscribed [`DiagnosticsSender`] forwards them to Application
//! Insights as trace telemetry, throttled per event id by a [`ThrottlingManager`] whose counters
//! are reset by a [`ThrottlingScheduler`].

mod event;
mod event_source;
mod scheduler;
mod sender;
mod throttling;
mod timer;

pub use event::{
    keywords, DiagnosticEvent, EventLevel, EventMetadata, ITEM_DROPPED_NO_INSTRUMENTATION_KEY,
    TELEMETRY_INITIALIZER_FAILED, THROTTLING_RESET, THROTTLING_STARTED,
};
pub use event_source::{DiagnosticsEventSource, DiagnosticsListener};
pub use scheduler::{RoutineScheduler, RoutineToken, ThrottlingScheduler};
pub use sender::DiagnosticsSender;
pub use throttling::{Throttle, ThrottlingManager, ThrottlingSettings};
pub use timer::{TaskTimer, TimerStopped};

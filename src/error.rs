use crate::{connection_string::ParseError, diagnostics::TimerStopped};
use opentelemetry_http::HttpError;
use std::env::VarError;

/// Errors surfaced by the telemetry client and its channels.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// No telemetry channel is configured. Telemetry cannot be sent.
    ///
    /// This is the only error returned by [`TelemetryClient::track`](crate::TelemetryClient::track).
    #[error("telemetry channel is not configured")]
    ChannelNotConfigured,

    /// An argument passed to a public operation was invalid.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Name of the offending argument.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The worker thread of a timer could not be spawned.
    #[error("spawning timer thread failed with {0}")]
    TimerSpawn(#[source] std::io::Error),

    /// The worker thread of a timer has stopped.
    #[error(transparent)]
    TimerStopped(#[from] TimerStopped),

    /// A routine was scheduled on a disposed scheduler.
    #[error("scheduler is disposed")]
    SchedulerDisposed,

    /// The connection string could not be parsed.
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(#[from] ParseError),

    /// The `APPLICATIONINSIGHTS_CONNECTION_STRING` environment variable is missing or not
    /// unicode.
    #[error("missing connection string: {0}")]
    MissingConnectionString(#[source] VarError),

    /// Application Insights telemetry data failed to serialize to JSON. Telemetry reporting failed
    /// because of this.
    ///
    /// Note: This is an error in this crate. If you spot this, please open an issue.
    #[error("serializing upload request failed with {0}")]
    UploadSerializeRequest(serde_json::Error),

    /// Application Insights telemetry data failed to compress. Telemetry reporting failed because
    /// of this.
    ///
    /// Note: This is an error in this crate. If you spot this, please open an issue.
    #[error("compressing upload request failed with {0}")]
    UploadCompressRequest(std::io::Error),

    /// Application Insights telemetry response failed to deserialize from JSON.
    ///
    /// Telemetry reporting may have worked. But since we could not look into the response, we
    /// can't be sure.
    ///
    /// Note: This is an error in this crate. If you spot this, please open an issue.
    #[error("deserializing upload response failed with {0}")]
    UploadDeserializeResponse(serde_json::Error),

    /// Could not complete the HTTP request to Application Insights to send telemetry data.
    /// Telemetry reporting failed because of this.
    #[error("sending upload request failed with {0}")]
    UploadConnection(HttpError),

    /// Application Insights returned at least one error for the reported telemetry data.
    #[error("upload failed with {0}")]
    Upload(String),
}

impl Error {
    pub(crate) fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

use crate::{
    context::TelemetryContext,
    models::{Sanitize, SessionState, SessionStateData},
};
use chrono::{DateTime, Utc};

/// A user session starting or ending.
///
/// Session state items neither carry custom properties nor support sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStateTelemetry {
    /// When the state changed.
    pub timestamp: Option<DateTime<Utc>>,
    /// Sequence field used to track absolute order of uploaded events.
    pub sequence: Option<String>,
    /// Context of the item.
    pub context: TelemetryContext,
    /// New session state.
    pub state: SessionState,
}

impl SessionStateTelemetry {
    /// Create a session state transition.
    pub fn new(state: SessionState) -> Self {
        Self {
            timestamp: None,
            sequence: None,
            context: TelemetryContext::default(),
            state,
        }
    }
}

impl Sanitize for SessionStateTelemetry {
    fn sanitize(&mut self) {
        self.context.sanitize();
    }
}

impl From<&SessionStateTelemetry> for SessionStateData {
    fn from(session: &SessionStateTelemetry) -> Self {
        SessionStateData {
            ver: 2,
            state: session.state,
        }
    }
}

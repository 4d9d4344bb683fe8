use serde::Serialize;

/// Whether a user session started or ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    /// Session was started.
    Start,
    /// Session was ended.
    End,
}

/// Instances of SessionState represent session state transitions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionStateData {
    pub(crate) ver: i32,
    pub(crate) state: SessionState,
}

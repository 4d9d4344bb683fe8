use std::fmt::Debug;

/// Local sink for human-readable telemetry output, e.g. an attached debugger's console.
pub trait DebugOutput: Debug + Send + Sync {
    /// Write one line.
    fn write_line(&self, message: &str);

    /// Whether anyone is listening. Nothing is written otherwise.
    fn is_attached(&self) -> bool;
}

/// Debug output that is never attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDebugOutput;

impl DebugOutput for NullDebugOutput {
    fn write_line(&self, _message: &str) {}

    fn is_attached(&self) -> bool {
        false
    }
}

/// Debug output writing to standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrDebugOutput;

impl DebugOutput for StderrDebugOutput {
    fn write_line(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn is_attached(&self) -> bool {
        true
    }
}

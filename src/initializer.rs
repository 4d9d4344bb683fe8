use crate::telemetry::TelemetryItem;
use std::{
    error::Error as StdError,
    sync::atomic::{AtomicU64, Ordering},
};

/// Error returned by a [`TelemetryInitializer`].
pub type InitializerError = Box<dyn StdError + Send + Sync + 'static>;

/// Enriches telemetry items before they are sent.
///
/// Initializers run in registration order. An error is reported as a diagnostic event and does
/// not stop the remaining initializers.
pub trait TelemetryInitializer: Send + Sync {
    /// Enrich `item`.
    fn initialize(&self, item: &mut TelemetryItem) -> Result<(), InitializerError>;

    /// Name used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> TelemetryInitializer for F
where
    F: Fn(&mut TelemetryItem) -> Result<(), InitializerError> + Send + Sync,
{
    fn initialize(&self, item: &mut TelemetryItem) -> Result<(), InitializerError> {
        self(item)
    }
}

/// Sets the sequence of every item to `<prefix>:<counter>`.
///
/// The prefix is random per initializer and the counter increases with every item. Explicitly set
/// sequences are kept.
#[derive(Debug)]
pub struct SequencePropertyInitializer {
    prefix: String,
    counter: AtomicU64,
}

impl Default for SequencePropertyInitializer {
    fn default() -> Self {
        Self::new()
    }
}

impl SequencePropertyInitializer {
    /// Create an initializer with a random prefix.
    pub fn new() -> Self {
        SequencePropertyInitializer {
            prefix: format!("{:016x}", rand::random::<u64>()),
            counter: AtomicU64::new(0),
        }
    }
}

impl TelemetryInitializer for SequencePropertyInitializer {
    fn initialize(&self, item: &mut TelemetryItem) -> Result<(), InitializerError> {
        if item.sequence().is_none() {
            let n = self.counter.fetch_add(1, Ordering::Relaxed);
            item.set_sequence(format!("{}:{}", self.prefix, n));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "SequencePropertyInitializer"
    }
}

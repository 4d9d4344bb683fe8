//! Transport channels.

mod in_memory;
mod uploader;

pub use in_memory::InMemoryChannel;

use crate::{telemetry::TelemetryItem, Error};
use async_trait::async_trait;
use std::fmt::Debug;

/// Accepts fully populated telemetry items and takes over their delivery.
#[async_trait]
pub trait TelemetryChannel: Debug + Send + Sync {
    /// Take ownership of `item` for delivery.
    fn send(&self, item: TelemetryItem);

    /// When `true`, tracked items are marked with a `DeveloperMode` property and mirrored to the
    /// debug output.
    fn developer_mode(&self) -> bool {
        false
    }

    /// Deliver all items accepted so far.
    async fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}

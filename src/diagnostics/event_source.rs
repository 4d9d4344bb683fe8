use super::event::DiagnosticEvent;
use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

/// Receives diagnostic events published to a [`DiagnosticsEventSource`].
pub trait DiagnosticsListener: Send + Sync {
    /// Handle one event. Must not panic.
    fn on_event(&self, event: &DiagnosticEvent);
}

/// Publishes the SDK's own diagnostic events to subscribed listeners.
///
/// Every published event is also written to the internal log.
#[derive(Default)]
pub struct DiagnosticsEventSource {
    listeners: RwLock<Vec<Arc<dyn DiagnosticsListener>>>,
}

impl fmt::Debug for DiagnosticsEventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticsEventSource")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl DiagnosticsEventSource {
    /// Create a source without listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener.
    pub fn subscribe(&self, listener: Arc<dyn DiagnosticsListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Remove a listener added with [`subscribe`](DiagnosticsEventSource::subscribe).
    pub fn unsubscribe(&self, listener: &Arc<dyn DiagnosticsListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Number of subscribed listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Log `event` and hand it to every listener.
    pub fn publish(&self, event: &DiagnosticEvent) {
        event.log();
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener.on_event(event);
        }
    }
}

//! Observability hooks for a running monitor.

use std::path::Path;

use tracing::{debug, trace, warn};

use crate::error::MonitorError;
use crate::event::FileEvent;

/// Receives what the dispatch loop sees but cannot hand back to a caller.
///
/// Every method is fire-and-forget and runs on the dispatch task, so
/// implementations should return quickly.
pub trait MonitorObserver: Send + Sync {
    /// The backend reported an error while watching `base_dir`.
    fn watch_error(&self, base_dir: &Path, error: &MonitorError);

    /// A registered callback is about to run for `event`.
    fn event_delivered(&self, _event: &FileEvent) {}

    /// `event` was dropped, either because its path is unregistered or
    /// because its kind is not delivered.
    fn event_ignored(&self, _event: &FileEvent) {}
}

/// Default observer that forwards to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl MonitorObserver for TracingObserver {
    fn watch_error(&self, base_dir: &Path, error: &MonitorError) {
        warn!("Directory monitor error for {}: {error}", base_dir.display());
    }

    fn event_delivered(&self, event: &FileEvent) {
        debug!("Dispatching {:?} for {}", event.kind, event.path.display());
    }

    fn event_ignored(&self, event: &FileEvent) {
        trace!("Ignoring {:?} for {}", event.kind, event.path.display());
    }
}

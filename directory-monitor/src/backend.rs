//! Sources of raw filesystem events.
//!
//! A [`WatchBackend`] hands out [`WatchHandle`]s. Each handle pushes what it
//! observes into the [`EventSink`] it was created with: change events on one
//! stream, asynchronous errors on another. Dropping the handle closes the
//! underlying OS watch.

use std::path::Path;

use notify::{PollWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::WatchMode;
use crate::error::{MonitorError, Result};
use crate::event::{FileEvent, FileEventKind};

/// Factory for OS watch handles.
pub trait WatchBackend: Send + Sync {
    /// Create a handle that reports into `sink`. The handle watches nothing
    /// until [`WatchHandle::watch`] is called.
    fn create(&self, sink: EventSink) -> Result<Box<dyn WatchHandle>>;
}

/// A live subscription to filesystem notifications.
pub trait WatchHandle: Send {
    /// Start observing the direct children of `dir`.
    fn watch(&mut self, dir: &Path) -> Result<()>;
}

/// Sending half of the event and error streams of one watch handle.
#[derive(Debug, Clone)]
pub struct EventSink {
    events: mpsc::UnboundedSender<FileEvent>,
    errors: mpsc::UnboundedSender<notify::Error>,
}

/// Receiving half of the streams, owned by the dispatch loop.
#[derive(Debug)]
pub(crate) struct EventStreams {
    pub(crate) events: mpsc::UnboundedReceiver<FileEvent>,
    pub(crate) errors: mpsc::UnboundedReceiver<notify::Error>,
}

impl EventSink {
    pub(crate) fn channel() -> (Self, EventStreams) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();

        (
            Self {
                events: events_tx,
                errors: errors_tx,
            },
            EventStreams {
                events: events_rx,
                errors: errors_rx,
            },
        )
    }

    /// Queue a change event. Returns `false` once the monitor has stopped
    /// listening.
    pub fn send_event(&self, event: FileEvent) -> bool {
        self.events.send(event).is_ok()
    }

    /// Queue a watch error. Returns `false` once the monitor has stopped
    /// listening.
    pub fn send_error(&self, error: notify::Error) -> bool {
        self.errors.send(error).is_ok()
    }

    /// Split a notify result into one event per affected path, or an error.
    pub fn forward(&self, result: notify::Result<notify::Event>) {
        match result {
            Ok(event) => {
                let kind = FileEventKind::from(event.kind);
                for path in event.paths {
                    if !self.send_event(FileEvent::new(kind, path)) {
                        return;
                    }
                }
            }
            Err(e) => {
                self.send_error(e);
            }
        }
    }
}

/// Backend built on the `notify` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyBackend {
    mode: WatchMode,
}

impl NotifyBackend {
    /// Create a backend using the given watch mode.
    pub fn new(mode: WatchMode) -> Self {
        Self { mode }
    }
}

impl WatchBackend for NotifyBackend {
    fn create(&self, sink: EventSink) -> Result<Box<dyn WatchHandle>> {
        let handler = move |result: notify::Result<notify::Event>| sink.forward(result);

        let handle: Box<dyn WatchHandle> = match self.mode.poll_interval() {
            None => {
                let watcher =
                    notify::recommended_watcher(handler).map_err(MonitorError::WatchCreate)?;
                Box::new(NotifyHandle(watcher))
            }
            Some(interval) => {
                let config = notify::Config::default().with_poll_interval(interval);
                let watcher =
                    PollWatcher::new(handler, config).map_err(MonitorError::WatchCreate)?;
                Box::new(NotifyHandle(watcher))
            }
        };

        Ok(handle)
    }
}

struct NotifyHandle<W>(W);

impl<W: Watcher + Send> WatchHandle for NotifyHandle<W> {
    fn watch(&mut self, dir: &Path) -> Result<()> {
        self.0
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|source| MonitorError::WatchDirectory {
                path: dir.to_path_buf(),
                source,
            })
    }
}

//! Directory monitor implementation.

use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{EventSink, EventStreams, NotifyBackend, WatchBackend, WatchHandle};
use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::event::FileEvent;
use crate::observer::{MonitorObserver, TracingObserver};

/// Function invoked with the absolute path of a changed file.
pub type Callback = Arc<dyn Fn(&Path) + Send + Sync>;

/// Watches one directory and runs per-file callbacks when those files are
/// written, removed, or have their metadata changed.
///
/// Clones share the same registry and watch. Callbacks run on the dispatch
/// task with no monitor lock held, so they may register further paths, but
/// a slow callback delays every event queued behind it.
#[derive(Clone)]
pub struct DirectoryMonitor {
    inner: Arc<Inner>,
}

struct Inner {
    base_dir: PathBuf,
    backend: Arc<dyn WatchBackend>,
    observer: Arc<dyn MonitorObserver>,
    state: Mutex<MonitorState>,
}

#[derive(Default)]
struct MonitorState {
    callbacks: HashMap<PathBuf, Callback>,
    session: Option<WatchSession>,
}

/// Everything owned between a start and the matching stop.
struct WatchSession {
    handle: Box<dyn WatchHandle>,
    cancel: CancellationToken,
    /// Absent when the handle could not watch the base directory.
    task: Option<JoinHandle<()>>,
}

impl DirectoryMonitor {
    /// Create a monitor for `base_dir` using native notifications.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::builder(base_dir).build()
    }

    /// Start building a monitor with a custom backend or observer.
    pub fn builder(base_dir: impl Into<PathBuf>) -> MonitorBuilder {
        MonitorBuilder {
            base_dir: base_dir.into(),
            backend: Arc::new(NotifyBackend::default()),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Create a monitor from a validated config.
    pub fn from_config(config: MonitorConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self::builder(config.base_dir)
            .backend(NotifyBackend::new(config.watch_mode))
            .build())
    }

    /// The watched directory.
    pub fn base_dir(&self) -> &Path {
        &self.inner.base_dir
    }

    /// Register `callback` for each of `names`, relative to the base directory.
    ///
    /// Registration is all-or-nothing: if any resulting path is already
    /// registered, or appears twice in `names`, nothing is inserted and
    /// [`MonitorError::DuplicateRegistration`] names the first offender.
    /// Names must stay inside the base directory: absolute names and `..`
    /// components fail with [`MonitorError::InvalidName`].
    pub fn register<F, I, S>(&self, callback: F, names: I) -> Result<()>
    where
        F: Fn(&Path) + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        let callback: Callback = Arc::new(callback);
        let paths = names
            .into_iter()
            .map(|name| self.resolve(name.as_ref()))
            .collect::<Result<Vec<PathBuf>>>()?;

        let mut state = self.inner.lock();

        let mut seen = HashSet::with_capacity(paths.len());
        for path in &paths {
            if state.callbacks.contains_key(path) || !seen.insert(path) {
                return Err(MonitorError::DuplicateRegistration(path.clone()));
            }
        }

        for path in paths {
            debug!("Registered callback for {}", path.display());
            state.callbacks.insert(path, Arc::clone(&callback));
        }

        Ok(())
    }

    /// Snapshot of every registered path, sorted.
    pub fn registered_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.inner.lock().callbacks.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Whether a watch handle is installed.
    ///
    /// This stays `true` after a [`start`](Self::start) that failed to watch
    /// the base directory, until [`stop`](Self::stop) releases the handle.
    pub fn is_watching(&self) -> bool {
        self.inner.lock().session.is_some()
    }

    /// Open a watch on the base directory and spawn the dispatch loop.
    ///
    /// A previous watch, if any, is closed and its dispatch loop has exited
    /// before this returns. If the new handle cannot watch the base
    /// directory it stays installed; call [`stop`](Self::stop) to release it.
    pub async fn start(&self) -> Result<()> {
        let (sink, streams) = EventSink::channel();
        let handle = self.inner.backend.create(sink)?;

        let (previous_task, result) = {
            let mut state = self.inner.lock();

            let previous_task = state.session.take().and_then(|previous| {
                debug!("Replacing existing watch on {}", self.base_dir().display());
                previous.cancel.cancel();
                previous.task
            });

            let cancel = CancellationToken::new();
            let session = state.session.insert(WatchSession {
                handle,
                cancel: cancel.clone(),
                task: None,
            });

            let result = session.handle.watch(&self.inner.base_dir).map(|()| {
                let weak = Arc::downgrade(&self.inner);
                session.task = Some(tokio::spawn(dispatch_loop(weak, streams, cancel)));
            });

            (previous_task, result)
        };

        if let Some(task) = previous_task {
            join_dispatch(task).await;
        }

        result?;
        info!("Directory monitor started: {}", self.base_dir().display());
        Ok(())
    }

    /// Stop the dispatch loop and release the watch handle.
    ///
    /// Safe to call when never started or already stopped.
    pub async fn stop(&self) {
        let Some(session) = self.inner.lock().session.take() else {
            return;
        };

        let WatchSession {
            handle,
            cancel,
            task,
        } = session;

        cancel.cancel();
        if let Some(task) = task {
            join_dispatch(task).await;
        }
        drop(handle);

        info!("Directory monitor stopped: {}", self.base_dir().display());
    }

    fn resolve(&self, name: &Path) -> Result<PathBuf> {
        let escapes = name.components().any(|component| {
            matches!(
                component,
                Component::Prefix(_) | Component::RootDir | Component::ParentDir
            )
        });
        if escapes || name.components().next().is_none() {
            return Err(MonitorError::InvalidName(name.to_path_buf()));
        }

        Ok(self.inner.base_dir.join(name).components().collect())
    }
}

impl std::fmt::Debug for DirectoryMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("DirectoryMonitor")
            .field("base_dir", &self.inner.base_dir)
            .field("registered", &state.callbacks.len())
            .field("watching", &state.session.is_some())
            .finish()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        // Every critical section leaves the state consistent, so a panic
        // elsewhere does not invalidate it.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, event: FileEvent) {
        let callback = self.lock().callbacks.get(&event.path).cloned();

        match callback {
            Some(callback) if event.is_deliverable() => {
                self.observer.event_delivered(&event);
                // A panicking callback must not take the dispatch loop down.
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback(&event.path)));
                if let Err(payload) = outcome {
                    let error = MonitorError::CallbackPanicked {
                        path: event.path.clone(),
                        message: panic_message(payload.as_ref()),
                    };
                    self.observer.watch_error(&self.base_dir, &error);
                }
            }
            _ => self.observer.event_ignored(&event),
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = state.session.take() {
            session.cancel.cancel();
        }
    }
}

/// Builder for a [`DirectoryMonitor`].
pub struct MonitorBuilder {
    base_dir: PathBuf,
    backend: Arc<dyn WatchBackend>,
    observer: Arc<dyn MonitorObserver>,
}

impl MonitorBuilder {
    /// Use `backend` to create watch handles.
    pub fn backend(mut self, backend: impl WatchBackend + 'static) -> Self {
        self.backend = Arc::new(backend);
        self
    }

    /// Report watch errors and dispatch decisions to `observer`.
    pub fn observer(mut self, observer: impl MonitorObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Build the monitor. Nothing is watched until it is started.
    pub fn build(self) -> DirectoryMonitor {
        DirectoryMonitor {
            inner: Arc::new(Inner {
                base_dir: self.base_dir,
                backend: self.backend,
                observer: self.observer,
                state: Mutex::new(MonitorState::default()),
            }),
        }
    }
}

async fn dispatch_loop(monitor: Weak<Inner>, mut streams: EventStreams, cancel: CancellationToken) {
    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            event = streams.events.recv() => {
                let (Some(event), Some(inner)) = (event, monitor.upgrade()) else {
                    break;
                };
                inner.dispatch(event);
            }

            Some(error) = streams.errors.recv() => {
                let Some(inner) = monitor.upgrade() else {
                    break;
                };
                inner
                    .observer
                    .watch_error(&inner.base_dir, &MonitorError::Watch(error));
            }
        }
    }

    debug!("Dispatch loop exited");
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

async fn join_dispatch(task: JoinHandle<()>) {
    if let Err(e) = task.await {
        warn!("Dispatch loop ended abnormally: {e}");
    }
}

//! # Directory Monitor
//!
//! Per-file change callbacks for a single directory. Callers register
//! interest in files by name, start the monitor, and get a callback with the
//! file's absolute path whenever it is written, removed, or has its
//! permissions changed.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      DirectoryMonitor                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  WatchBackend ──► EventSink ──► dispatch loop ──► Callback    │
//! │       │              │               │                       │
//! │       ▼              ▼               ▼                       │
//! │  WatchHandle      errors ──────► MonitorObserver             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! # async fn run() -> dirmon::Result<()> {
//! use dirmon::DirectoryMonitor;
//!
//! let monitor = DirectoryMonitor::new("/etc/myapp");
//! monitor.register(|path| println!("changed: {}", path.display()), ["app.toml"])?;
//! monitor.start().await?;
//! // ...
//! monitor.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod event;
pub mod monitor;
pub mod observer;

pub use backend::{EventSink, NotifyBackend, WatchBackend, WatchHandle};
pub use config::{MonitorConfig, WatchMode};
pub use error::{MonitorError, Result};
pub use event::{FileEvent, FileEventKind};
pub use monitor::{Callback, DirectoryMonitor, MonitorBuilder};
pub use observer::{MonitorObserver, TracingObserver};

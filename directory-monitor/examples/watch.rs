//! Watch files in a directory and print every change until Ctrl-C.
//!
//! Usage: cargo run -p dirmon --example watch -- <dir> <file>...
//!
//! Set `DIRMON_POLL_MS` to poll instead of using native notifications, and
//! `RUST_LOG=dirmon=debug` to see dispatch decisions.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use dirmon::{DirectoryMonitor, MonitorConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logs
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let Some(dir) = args.next() else {
        bail!("usage: watch <dir> <file>...");
    };
    let names: Vec<String> = args.collect();
    if names.is_empty() {
        bail!("no files to watch in {dir}");
    }

    let mut config = MonitorConfig::new(&dir);
    if let Ok(poll_ms) = std::env::var("DIRMON_POLL_MS") {
        let poll_ms: u64 = poll_ms.parse().context("DIRMON_POLL_MS must be an integer")?;
        config = config.poll_every(Duration::from_millis(poll_ms));
    }

    let monitor = DirectoryMonitor::from_config(config)?;
    monitor.register(
        |path: &Path| println!("changed: {}", path.display()),
        &names,
    )?;

    if let Err(e) = monitor.start().await {
        // The handle may already be installed; release it before bailing.
        monitor.stop().await;
        return Err(e).with_context(|| format!("failed to watch {dir}"));
    }

    println!("Watching {} file(s) in {dir}, Ctrl-C to stop", names.len());
    tokio::signal::ctrl_c().await?;

    monitor.stop().await;
    Ok(())
}

//! `tracing` subscriber setup.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Where log lines go.
pub enum LogSink<'a> {
    Stderr,
    File(&'a Path),
    /// The TUI owns the terminal; without a log file nothing is written.
    Off,
}

/// Install the global subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init(sink: LogSink<'_>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let res = match sink {
        LogSink::Off => return Ok(()),
        LogSink::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogSink::File(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .try_init()
        }
    };
    res.map_err(|e| anyhow::anyhow!("install tracing subscriber: {e}"))
}

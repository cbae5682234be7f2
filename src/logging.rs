use std::io::Write;
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Destination for operator-facing progress lines.
pub trait LogSink: Send + Sync {
    fn append(&self, line: &str);
}

pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn append(&self, line: &str) {
        println!("{line}");
    }
}

/// Append-only text log. The file is reopened per line so a crash never
/// loses buffered output.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }
        Ok(Self { path })
    }
}

impl LogSink for FileSink {
    fn append(&self, line: &str) {
        let result = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{line}"));
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), "failed to write log line: {e}");
        }
    }
}

pub struct TeeSink {
    sinks: Vec<Box<dyn LogSink>>,
}

impl TeeSink {
    pub fn new(sinks: Vec<Box<dyn LogSink>>) -> Self {
        Self { sinks }
    }
}

impl LogSink for TeeSink {
    fn append(&self, line: &str) {
        for sink in &self.sinks {
            sink.append(line);
        }
    }
}

/// Keeps every line in memory; clones share the same buffer.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

#[cfg(test)]
impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

#[cfg(test)]
impl LogSink for MemorySink {
    fn append(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

/// Console echo plus the append-only log file.
pub fn default_sink(log_file: &Path) -> Result<Box<dyn LogSink>> {
    let file = FileSink::new(log_file)?;
    Ok(Box::new(TeeSink::new(vec![Box::new(ConsoleSink), Box::new(file)])))
}

/// Request-level diagnostics go to stderr through `tracing`; `RUST_LOG`
/// raises the level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

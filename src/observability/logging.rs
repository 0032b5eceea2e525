//! Structured logging and the per-request access log.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber
//! - Define the access-log sink the request logger writes to
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - Access records go either to `tracing` (target `chat_gateway::access`)
//!   or, line by line, to a file

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{ObservabilityConfig, RequestLogConfig, SinkKind};

/// Initialize the global tracing subscriber.
pub fn init(config: &ObservabilityConfig) {
    let fallback = format!("chat_gateway={},tower_http=info", config.log_level);
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// One access-log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    pub timestamp: String,
    pub user: String,
    pub path: String,
}

impl AccessRecord {
    /// `<timestamp> - User: <name> - Path: <path>`
    pub fn line(&self) -> String {
        format!("{} - User: {} - Path: {}", self.timestamp, self.user, self.path)
    }
}

/// Destination for access records.
pub trait LogSink: Send + Sync {
    fn record(&self, record: &AccessRecord);
}

/// Emits each record as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&self, record: &AccessRecord) {
        tracing::info!(
            target: "chat_gateway::access",
            timestamp = %record.timestamp,
            user = %record.user,
            path = %record.path,
            "{}",
            record.line()
        );
    }
}

/// Appends one line per record to a file.
#[derive(Debug)]
pub struct FileSink {
    writer: Mutex<BufWriter<File>>,
}

impl FileSink {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl LogSink for FileSink {
    fn record(&self, record: &AccessRecord) {
        let mut writer = match self.writer.lock() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(writer, "{}", record.line()).and_then(|_| writer.flush()) {
            tracing::warn!(error = %e, "Failed to write access log");
        }
    }
}

/// Build the sink selected by configuration.
pub fn sink_from_config(config: &RequestLogConfig) -> std::io::Result<Arc<dyn LogSink>> {
    match config.sink {
        SinkKind::Tracing => Ok(Arc::new(TracingSink)),
        SinkKind::File => Ok(Arc::new(FileSink::open(Path::new(&config.path))?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str) -> AccessRecord {
        AccessRecord {
            timestamp: "2024-05-01 10:00:00.000000".into(),
            user: "Anonymous".into(),
            path: path.into(),
        }
    }

    #[test]
    fn test_line_format() {
        assert_eq!(
            record("/api/conversations/").line(),
            "2024-05-01 10:00:00.000000 - User: Anonymous - Path: /api/conversations/"
        );
    }

    #[test]
    fn test_file_sink_appends_lines() {
        let path = std::env::temp_dir().join(format!("gateway-access-{}.log", uuid::Uuid::new_v4()));

        let sink = FileSink::open(&path).unwrap();
        sink.record(&record("/a"));
        sink.record(&record("/b"));
        drop(sink);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("Path: /a"));
        assert!(lines[1].ends_with("Path: /b"));

        std::fs::remove_file(&path).unwrap_or_default();
    }
}

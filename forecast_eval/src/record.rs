//! Append-only event recording
//!
//! Evaluation entry points take a recorder explicitly. Implementations
//! serialize writes internally so one recorder can be shared between
//! threads.

use crate::error::{EvalError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One recorded event, as written to an event log line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub event_type: String,
    /// ISO-8601 UTC with a trailing `Z`
    pub timestamp: String,
    pub sample_id: String,
    pub payload: serde_json::Value,
}

impl RecordedEvent {
    pub fn now(event_type: &str, payload: serde_json::Value, sample_id: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
            timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            sample_id: sample_id.to_string(),
            payload,
        }
    }
}

/// Event sink capability
pub trait Recorder: Send + Sync {
    /// Append one event
    fn record_event(
        &self,
        event_type: &str,
        payload: serde_json::Value,
        sample_id: &str,
    ) -> Result<()>;

    /// Flush and release resources. Called once, after the last event.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Recorder that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecorder;

impl Recorder for NullRecorder {
    fn record_event(
        &self,
        _event_type: &str,
        _payload: serde_json::Value,
        _sample_id: &str,
    ) -> Result<()> {
        Ok(())
    }
}

/// Recorder that keeps events in memory
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    events: Mutex<Vec<RecordedEvent>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Recorder for MemoryRecorder {
    fn record_event(
        &self,
        event_type: &str,
        payload: serde_json::Value,
        sample_id: &str,
    ) -> Result<()> {
        let event = RecordedEvent::now(event_type, payload, sample_id);
        self.events
            .lock()
            .map_err(|_| EvalError::Recorder("event buffer lock poisoned".to_string()))?
            .push(event);
        Ok(())
    }
}

/// Recorder writing one JSON object per line
#[derive(Debug)]
pub struct JsonlRecorder {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl JsonlRecorder {
    /// Open `path` for appending, creating parent directories as needed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer: Mutex::new(Some(BufWriter::new(file))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Recorder for JsonlRecorder {
    fn record_event(
        &self,
        event_type: &str,
        payload: serde_json::Value,
        sample_id: &str,
    ) -> Result<()> {
        let line = serde_json::to_string(&RecordedEvent::now(event_type, payload, sample_id))?;

        let mut guard = self
            .writer
            .lock()
            .map_err(|_| EvalError::Recorder("event log lock poisoned".to_string()))?;
        let writer = guard.as_mut().ok_or_else(|| {
            EvalError::Recorder(format!("{} is already closed", self.path.display()))
        })?;
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut guard = self
            .writer
            .lock()
            .map_err(|_| EvalError::Recorder("event log lock poisoned".to_string()))?;
        if let Some(mut writer) = guard.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

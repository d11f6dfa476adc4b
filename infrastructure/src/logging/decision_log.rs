//! JSONL audit log of finalized decisions.
//!
//! Each [`ConsensusDecision`] is serialized as a single JSON line with a
//! `type` field and `timestamp`, appended to the file via a buffered
//! writer.

use ensemble_domain::ConsensusDecision;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL decision log that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`; sessions running in
/// parallel may record concurrently. Flushes on `Drop`.
pub struct DecisionLog {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl DecisionLog {
    /// Create a new log writing to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be created: audit logging is
    /// best-effort and never blocks solving.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create decision log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match File::create(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not create decision log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one finalized decision.
    pub fn record(&self, decision: &ConsensusDecision) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let Ok(payload) = serde_json::to_value(decision) else {
            return;
        };

        let record = if let serde_json::Value::Object(mut map) = payload {
            map.insert(
                "type".to_string(),
                serde_json::Value::String("decision".to_string()),
            );
            map.insert(
                "logged_at".to_string(),
                serde_json::Value::String(timestamp),
            );
            serde_json::Value::Object(map)
        } else {
            return;
        };

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // Flush per record for crash safety; JSONL is append-only
            let _ = writer.flush();
        }
    }
}

impl Drop for DecisionLog {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

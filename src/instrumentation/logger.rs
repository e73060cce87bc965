use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::session::Feedback;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLog {
    pub id: String,
    pub timestamp: String,
    pub session_id: Option<String>,
    pub question: String,
    pub search_query: String,
    pub videos_requested: u32,
    pub videos_returned: u32,
    pub web_context_available: bool,
    pub explanation_cached: bool,
    pub explanation_failed: bool,
    pub video_latency_ms: u64,
    pub web_latency_ms: u64,
    pub llm_latency_ms: u64,
    pub total_latency_ms: u64,
    pub gist: String,
    pub key_points: String,
}

impl RunLog {
    pub fn summary(&self) -> String {
        format!(
            "Videos: {}/{} | Web context: {} | Explanation: {} | Total latency: {:.1}s",
            self.videos_returned,
            self.videos_requested,
            if self.web_context_available { "yes" } else { "unavailable" },
            if self.explanation_failed {
                "failed"
            } else if self.explanation_cached {
                "cached"
            } else {
                "generated"
            },
            self.total_latency_ms as f64 / 1000.0,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackLog {
    pub id: String,
    pub timestamp: String,
    pub session_id: String,
    pub question: String,
    pub feedback: Feedback,
}

/// Append-only JSONL audit trail. Nothing reads it back.
#[derive(Debug, Clone)]
pub struct RunLogger {
    dir: PathBuf,
}

impl RunLogger {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).context("Failed to create logs directory")?;
        Ok(Self { dir })
    }

    pub fn write(&self, run_log: &RunLog) -> Result<()> {
        self.append("runs.jsonl", run_log)
    }

    pub fn write_feedback(&self, feedback: &FeedbackLog) -> Result<()> {
        self.append("feedback.jsonl", feedback)
    }

    fn append<T: Serialize>(&self, file_name: &str, record: &T) -> Result<()> {
        let path = self.dir.join(file_name);
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open log file")?;

        let json = serde_json::to_string(record).context("Failed to serialize log record")?;
        writeln!(file, "{}", json).context("Failed to write log")?;

        Ok(())
    }
}

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::TIMER_INTERVAL_MS;
use super::error::RecordError;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "code")]
pub enum SessionOutcome {
    Running,
    Completed,
    Failed(i32),
}

/// Bookkeeping for one start-to-stop session.
///
/// Kept by the recorder after the session ends and exported as JSON by
/// hosts that log recordings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub frames: u64,
    pub bytes: u64,
    pub saved_path: Option<PathBuf>,
    pub outcome: SessionOutcome,
}

impl SessionSummary {
    pub fn begin() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            frames: 0,
            bytes: 0,
            saved_path: None,
            outcome: SessionOutcome::Running,
        }
    }

    /// Recorded time derived from the frame count.
    pub fn recorded_ms(&self) -> u64 {
        self.frames * TIMER_INTERVAL_MS
    }

    pub fn recorded_secs(&self) -> f64 {
        self.recorded_ms() as f64 / 1000.0
    }

    pub fn is_running(&self) -> bool {
        self.outcome == SessionOutcome::Running
    }

    pub fn complete(&mut self) {
        self.outcome = SessionOutcome::Completed;
    }

    pub fn fail(&mut self, err: RecordError) {
        self.outcome = SessionOutcome::Failed(err.code());
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

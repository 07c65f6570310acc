use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final state reported by the CI API for a run or job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
    Neutral,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
    Stale,
    StartupFailure,
    #[serde(other)]
    Other,
}

impl Conclusion {
    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    pub fn is_cancelled(self) -> bool {
        self == Self::Cancelled
    }
}

/// One completed, non-cancelled job inside a workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRun {
    pub workflow_name: String,
    pub job_name: String,
    pub conclusion: Conclusion,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A failure message attached to a job, carrying its own copy of the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorAnnotation {
    pub job_run: JobRun,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedPair {
    pub key: String,
    pub value: u32,
}

impl RankedPair {
    pub fn new(key: impl Into<String>, value: u32) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    /// Workflow name with spaces replaced by hyphens, usable as an HTML id.
    pub id: String,
    pub name: String,
    pub messages: Vec<RankedPair>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthReport {
    pub provider: String,
    pub repository: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub collected_at: DateTime<Utc>,
    pub total_job_runs: usize,
    pub total_annotations: usize,
    pub global_success_rate: u32,
    pub workflow_success_rates: Vec<RankedPair>,
    pub job_success_rates: Vec<RankedPair>,
    pub workflows: Vec<WorkflowSummary>,
}

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::insights::Conclusion;

/// GitHub Actions workflow run, as listed by `/actions/runs`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubWorkflowRun {
    /// Unique identifier for the workflow run
    pub id: u64,
    /// Conclusion of the run, absent while it is still running
    #[serde(default)]
    pub conclusion: Option<Conclusion>,
    /// API URL of the check suite backing this run
    pub check_suite_url: String,
    /// API URL of the workflow definition
    pub workflow_url: String,
}

/// One page of workflow runs plus the number of the page after it, if any.
#[derive(Debug, Clone, Default)]
pub struct WorkflowRunPage {
    pub runs: Vec<GitHubWorkflowRun>,
    pub next_page: Option<u32>,
}

/// Workflow definition metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubWorkflow {
    pub id: u64,
    pub name: String,
}

/// A check run, GitHub's record of one job inside a check suite.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCheckRun {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub conclusion: Option<Conclusion>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Annotation attached to a check run.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubAnnotation {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub start_line: Option<u32>,
    #[serde(default)]
    pub end_line: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct WorkflowRunsResponse {
    pub workflow_runs: Vec<GitHubWorkflowRun>,
}

#[derive(Deserialize)]
pub(super) struct CheckRunsResponse {
    pub check_runs: Vec<GitHubCheckRun>,
}

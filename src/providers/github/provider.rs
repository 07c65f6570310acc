use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Months, Utc};
use log::{debug, info, warn};

use crate::auth::Token;
use crate::error::{CiHealthError, Result};
use crate::insights::{ErrorAnnotation, HealthReport, JobRun};
use crate::output::PhaseProgress;
use crate::ranking;

use super::annotations::AnnotationFilter;
use super::client::{CiApi, GitHubClient};
use super::links::trailing_id;
use super::types::{GitHubCheckRun, GitHubWorkflowRun};
use super::workflow_names::WorkflowNameCache;

/// Knobs for one windowed fetch.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Workflows whose jobs get their annotations fetched
    pub interesting_workflows: HashSet<String>,
    /// Minimum spacing between annotation requests
    pub annotation_interval: Duration,
    /// Length of the trailing window in calendar months
    pub window_months: u32,
    /// Page size for listing calls
    pub per_page: u8,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            interesting_workflows: HashSet::new(),
            annotation_interval: Duration::from_millis(750),
            window_months: 1,
            per_page: 100,
        }
    }
}

/// Everything collected from the trailing window.
#[derive(Debug, Default)]
pub struct FetchedWindow {
    pub jobs: Vec<JobRun>,
    pub annotations: Vec<ErrorAnnotation>,
}

/// What a check suite's jobs say about the trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowSignal {
    /// At least one job started at or after the window start
    InWindow,
    /// Every job started before the window start
    OutOfWindow,
    /// No usable jobs, so nothing can be concluded
    Inconclusive,
}

/// Whether the page loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageOutcome {
    Continue,
    WindowExhausted,
}

#[derive(Debug)]
struct CheckSuiteExpansion {
    jobs: Vec<JobRun>,
    annotations: Vec<ErrorAnnotation>,
    window: WindowSignal,
}

/// State owned by a single fetch: the name cache and the annotation gate
/// live exactly as long as one report build.
struct FetchSession<'a, C> {
    client: &'a C,
    window_start: DateTime<Utc>,
    interesting: &'a HashSet<String>,
    names: WorkflowNameCache,
    annotations: AnnotationFilter,
}

impl<'a, C: CiApi> FetchSession<'a, C> {
    fn new(client: &'a C, window_start: DateTime<Utc>, settings: &'a FetchSettings) -> Self {
        Self {
            client,
            window_start,
            interesting: &settings.interesting_workflows,
            names: WorkflowNameCache::new(),
            annotations: AnnotationFilter::new(settings.annotation_interval),
        }
    }

    async fn run(mut self) -> Result<FetchedWindow> {
        let mut fetched = FetchedWindow::default();
        let mut page = 1;

        loop {
            let listing = self.client.list_workflow_runs(page).await?;
            info!("Fetched page {page} with {} workflow runs", listing.runs.len());

            let outcome = self.process_page(listing.runs, &mut fetched).await?;
            if outcome == PageOutcome::WindowExhausted {
                info!("Page {page} lies entirely before {}, stopping", self.window_start);
                break;
            }

            match listing.next_page {
                Some(next) => page = next,
                None => break,
            }
        }

        debug!("Resolved {} distinct workflows", self.names.len());
        Ok(fetched)
    }

    async fn process_page(
        &mut self,
        runs: Vec<GitHubWorkflowRun>,
        fetched: &mut FetchedWindow,
    ) -> Result<PageOutcome> {
        let mut still_in_window = false;
        let mut out_of_window_runs = 0;

        for run in runs {
            if run.conclusion.is_some_and(|c| c.is_cancelled()) {
                debug!("Skipping cancelled run {}", run.id);
                continue;
            }

            let Some(check_suite_id) = trailing_id(&run.check_suite_url) else {
                warn!(
                    "Skipping run {}: unparseable check suite URL {}",
                    run.id, run.check_suite_url
                );
                continue;
            };
            let Some(workflow_id) = trailing_id(&run.workflow_url) else {
                warn!(
                    "Skipping run {}: unparseable workflow URL {}",
                    run.id, run.workflow_url
                );
                continue;
            };

            let workflow_name = self.names.resolve(self.client, workflow_id).await?;
            let expansion = self
                .expand_check_suite(check_suite_id, &workflow_name)
                .await?;

            match expansion.window {
                WindowSignal::InWindow => {
                    still_in_window = true;
                    fetched.jobs.extend(expansion.jobs);
                    fetched.annotations.extend(expansion.annotations);
                }
                WindowSignal::Inconclusive => still_in_window = true,
                WindowSignal::OutOfWindow => out_of_window_runs += 1,
            }
        }

        if !still_in_window && out_of_window_runs > 0 {
            Ok(PageOutcome::WindowExhausted)
        } else {
            Ok(PageOutcome::Continue)
        }
    }

    /// Turns a check suite into job runs, plus annotations for allow-listed
    /// workflows.
    async fn expand_check_suite(
        &mut self,
        check_suite_id: u64,
        workflow_name: &str,
    ) -> Result<CheckSuiteExpansion> {
        let check_runs = self.client.list_check_runs(check_suite_id).await?;

        let jobs: Vec<(u64, JobRun)> = check_runs
            .into_iter()
            .filter_map(|check_run| to_job_run(check_run, workflow_name))
            .collect();

        if jobs.is_empty() {
            debug!("Check suite {check_suite_id} has no usable jobs");
            return Ok(CheckSuiteExpansion {
                jobs: Vec::new(),
                annotations: Vec::new(),
                window: WindowSignal::Inconclusive,
            });
        }

        let in_window = jobs
            .iter()
            .any(|(_, job)| job.started_at >= self.window_start);
        if !in_window {
            return Ok(CheckSuiteExpansion {
                jobs: Vec::new(),
                annotations: Vec::new(),
                window: WindowSignal::OutOfWindow,
            });
        }

        let mut annotations = Vec::new();
        if self.interesting.contains(workflow_name) {
            for (check_run_id, job) in &jobs {
                annotations.extend(
                    self.annotations
                        .filter_annotations(self.client, *check_run_id, job)
                        .await?,
                );
            }
        }

        Ok(CheckSuiteExpansion {
            jobs: jobs.into_iter().map(|(_, job)| job).collect(),
            annotations,
            window: WindowSignal::InWindow,
        })
    }
}

fn to_job_run(check_run: GitHubCheckRun, workflow_name: &str) -> Option<(u64, JobRun)> {
    let Some(conclusion) = check_run.conclusion else {
        debug!("Skipping check run {} without conclusion", check_run.id);
        return None;
    };
    if conclusion.is_cancelled() {
        return None;
    }
    let Some(started_at) = check_run.started_at else {
        debug!("Skipping check run {} without start time", check_run.id);
        return None;
    };

    Some((
        check_run.id,
        JobRun {
            workflow_name: workflow_name.to_string(),
            job_name: check_run.name,
            conclusion,
            started_at,
            completed_at: check_run.completed_at,
        },
    ))
}

/// Splits `owner/repo` into its two parts.
pub fn split_repo_path(repo_path: &str) -> Result<(String, String)> {
    match repo_path.split('/').collect::<Vec<_>>().as_slice() {
        [owner, repo] if !owner.is_empty() && !repo.is_empty() => {
            Ok(((*owner).to_string(), (*repo).to_string()))
        }
        _ => Err(CiHealthError::Config(format!(
            "Repository path must be in format 'owner/repo', got '{repo_path}'"
        ))),
    }
}

/// Provider for CI health reports from GitHub Actions.
pub struct GitHubProvider<C = GitHubClient> {
    client: C,
    owner: String,
    repo: String,
    settings: FetchSettings,
}

impl GitHubProvider<GitHubClient> {
    /// Create a provider talking to the GitHub REST API.
    ///
    /// # Arguments
    ///
    /// * `base_url` - GitHub API base URL
    /// * `repo_path` - Repository path in format "owner/repo"
    /// * `token` - GitHub personal access token
    /// * `settings` - Window, pacing and allow-list settings
    pub fn new(
        base_url: &str,
        repo_path: &str,
        token: Token,
        settings: FetchSettings,
    ) -> Result<Self> {
        let (owner, repo) = split_repo_path(repo_path)?;
        let client = GitHubClient::new(base_url, &owner, &repo, token)?
            .with_per_page(settings.per_page);

        Ok(Self {
            client,
            owner,
            repo,
            settings,
        })
    }
}

impl<C: CiApi> GitHubProvider<C> {
    #[cfg(test)]
    pub fn with_client(client: C, repo_path: &str, settings: FetchSettings) -> Result<Self> {
        let (owner, repo) = split_repo_path(repo_path)?;
        Ok(Self {
            client,
            owner,
            repo,
            settings,
        })
    }

    #[cfg(test)]
    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_months(Months::new(self.settings.window_months))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Pages through workflow runs newest-first and collects the jobs and
    /// annotations of every run inside the window.
    ///
    /// Paging stops early once a whole page sits before `window_start`.
    ///
    /// # Errors
    ///
    /// Any API failure aborts the fetch; no partial result is returned.
    pub async fn fetch_window(&self, window_start: DateTime<Utc>) -> Result<FetchedWindow> {
        FetchSession::new(&self.client, window_start, &self.settings)
            .run()
            .await
    }

    /// Fetches the trailing window and ranks it into a report.
    pub async fn collect_report(&self) -> Result<HealthReport> {
        let now = Utc::now();
        let window_start = self.window_start(now);

        info!(
            "Collecting CI health for {}/{} since {window_start}",
            self.owner, self.repo
        );

        let progress = PhaseProgress::start_phase_1();
        let fetched = self.fetch_window(window_start).await?;

        if fetched.jobs.is_empty() {
            warn!("No job runs found in the last {} month(s)", self.settings.window_months);
        }

        let progress = progress.finish_phase_1_start_phase_2(fetched.jobs.len());
        let report = self.build_report(&fetched, window_start, now);
        progress.finish_phase_2();

        Ok(report)
    }

    pub fn build_report(
        &self,
        fetched: &FetchedWindow,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> HealthReport {
        let (global_success_rate, workflow_success_rates) =
            ranking::workflow_success_rates(&fetched.jobs);

        HealthReport {
            provider: "GitHub Actions".to_string(),
            repository: format!("{}/{}", self.owner, self.repo),
            window_start,
            window_end: now,
            collected_at: now,
            total_job_runs: fetched.jobs.len(),
            total_annotations: fetched.annotations.len(),
            global_success_rate,
            workflow_success_rates,
            job_success_rates: ranking::job_success_rates(&fetched.jobs),
            workflows: ranking::workflow_summaries(&fetched.annotations),
        }
    }
}

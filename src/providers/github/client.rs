use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, LINK};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Token;
use crate::error::{CiHealthError, Result};

use super::links::next_page;
use super::types::{
    CheckRunsResponse, GitHubAnnotation, GitHubCheckRun, GitHubWorkflow, WorkflowRunPage,
    WorkflowRunsResponse,
};

/// Upper bound GitHub accepts for `per_page`.
pub const MAX_PAGE_SIZE: u8 = 100;

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

/// The four CI API operations the report pipeline consumes.
///
/// Implementations must report transport and auth failures distinctly
/// from missing resources.
#[allow(async_fn_in_trait)]
pub trait CiApi {
    /// Lists one page of workflow runs, newest first.
    async fn list_workflow_runs(&self, page: u32) -> Result<WorkflowRunPage>;

    async fn get_workflow(&self, workflow_id: u64) -> Result<GitHubWorkflow>;

    /// Lists every completed check run of a check suite, whatever its conclusion.
    async fn list_check_runs(&self, check_suite_id: u64) -> Result<Vec<GitHubCheckRun>>;

    /// Lists the annotations of a check run. A single bulk page is fetched.
    async fn list_annotations(&self, check_run_id: u64) -> Result<Vec<GitHubAnnotation>>;
}

/// GitHub REST API client scoped to one repository.
pub struct GitHubClient {
    client: Client,
    repo_url: Url,
    token: Token,
    per_page: u8,
}

impl GitHubClient {
    /// Create a new GitHub API client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - GitHub API base URL (e.g., "https://api.github.com")
    /// * `owner` - Repository owner/organization
    /// * `repo` - Repository name
    /// * `token` - GitHub personal access token
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built or
    /// the base URL is invalid.
    pub fn new(base_url: &str, owner: &str, repo: &str, token: Token) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );

        let client = Client::builder()
            .user_agent(concat!("cihealth/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| CiHealthError::Config(format!("Failed to create HTTP client: {e}")))?;

        let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
            .map_err(|e| CiHealthError::Config(format!("Invalid base URL: {e}")))?;

        let repo_url = base
            .join(&format!("repos/{owner}/{repo}/"))
            .map_err(|e| CiHealthError::Config(format!("Invalid repository URL: {e}")))?;

        Ok(Self {
            client,
            repo_url,
            token,
            per_page: MAX_PAGE_SIZE,
        })
    }

    /// Overrides the page size used for listing calls (clamped to 1..=100).
    pub fn with_per_page(mut self, per_page: u8) -> Self {
        self.per_page = per_page.clamp(1, MAX_PAGE_SIZE);
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.repo_url
            .join(path)
            .map_err(|e| CiHealthError::Config(format!("Invalid endpoint {path}: {e}")))
    }

    async fn get(&self, url: Url, query: &[(&str, String)]) -> Result<Response> {
        debug!("GET {url}");

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(self.token.as_str())
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let quota_exhausted = status == StatusCode::TOO_MANY_REQUESTS
            || (status == StatusCode::FORBIDDEN && is_quota_exhausted(&response));

        match status {
            _ if quota_exhausted => Err(CiHealthError::RateLimited {
                status: status.as_u16(),
                message: error_body(response).await,
            }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CiHealthError::Unauthorized {
                status: status.as_u16(),
            }),
            StatusCode::NOT_FOUND => Err(CiHealthError::NotFound(url.path().to_string())),
            _ => Err(CiHealthError::Api {
                status: status.as_u16(),
                message: error_body(response).await,
            }),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<(T, Option<u32>)> {
        let response = self.get(url, query).await?;

        let next = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(next_page);

        let body = response.bytes().await?;
        Ok((serde_json::from_slice(&body)?, next))
    }
}

/// GitHub answers 403 both for bad credentials and for a spent quota; only
/// the latter reports zero remaining requests.
fn is_quota_exhausted(response: &Response) -> bool {
    response
        .headers()
        .get(RATE_LIMIT_REMAINING)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|remaining| remaining.trim() == "0")
}

async fn error_body(response: Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string())
}

impl CiApi for GitHubClient {
    async fn list_workflow_runs(&self, page: u32) -> Result<WorkflowRunPage> {
        let url = self.endpoint("actions/runs")?;
        let query = [
            ("per_page", self.per_page.to_string()),
            ("page", page.to_string()),
        ];

        let (response, next_page): (WorkflowRunsResponse, _) = self.get_json(url, &query).await?;

        Ok(WorkflowRunPage {
            runs: response.workflow_runs,
            next_page,
        })
    }

    async fn get_workflow(&self, workflow_id: u64) -> Result<GitHubWorkflow> {
        let url = self.endpoint(&format!("actions/workflows/{workflow_id}"))?;
        let (workflow, _) = self.get_json(url, &[]).await?;
        Ok(workflow)
    }

    async fn list_check_runs(&self, check_suite_id: u64) -> Result<Vec<GitHubCheckRun>> {
        let url = self.endpoint(&format!("check-suites/{check_suite_id}/check-runs"))?;
        let mut check_runs = Vec::new();
        let mut page = 1;

        loop {
            let query = [
                ("status", "completed".to_string()),
                ("filter", "all".to_string()),
                ("per_page", self.per_page.to_string()),
                ("page", page.to_string()),
            ];

            let (response, next): (CheckRunsResponse, _) =
                self.get_json(url.clone(), &query).await?;
            check_runs.extend(response.check_runs);

            match next {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(check_runs)
    }

    async fn list_annotations(&self, check_run_id: u64) -> Result<Vec<GitHubAnnotation>> {
        let url = self.endpoint(&format!("check-runs/{check_run_id}/annotations"))?;
        let query = [("per_page", MAX_PAGE_SIZE.to_string())];
        let (annotations, _) = self.get_json(url, &query).await?;
        Ok(annotations)
    }
}

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{CiHealthError, Result};
use crate::providers::FetchSettings;

/// Configuration file structure for cihealth.
///
/// Lets users keep the repository, allow-list and pacing settings in a file
/// instead of repeating them on every run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubConfig {
    /// GitHub personal access token
    pub token: Option<String>,

    /// GitHub API base URL
    #[serde(default = "default_github_base_url")]
    pub base_url: String,

    /// GitHub repository path (e.g., 'owner/repo')
    pub repo_path: Option<String>,

    /// Workflows whose failing jobs get their annotations fetched
    #[serde(default = "default_interesting_workflows")]
    pub interesting_workflows: Vec<String>,

    /// Trailing window length in months
    #[serde(default = "default_window_months")]
    pub window_months: u32,

    /// Minimum spacing between annotation requests, in milliseconds
    #[serde(default = "default_annotation_interval_ms")]
    pub annotation_interval_ms: u64,

    /// Page size for listing calls
    #[serde(default = "default_per_page")]
    pub per_page: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Html,
    Json,
    Summary,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_github_base_url(),
            repo_path: None,
            interesting_workflows: default_interesting_workflows(),
            window_months: default_window_months(),
            annotation_interval_ms: default_annotation_interval_ms(),
            per_page: default_per_page(),
        }
    }
}

impl GitHubConfig {
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            interesting_workflows: self
                .interesting_workflows
                .iter()
                .cloned()
                .collect::<HashSet<_>>(),
            annotation_interval: Duration::from_millis(self.annotation_interval_ms),
            window_months: self.window_months,
            per_page: self.per_page,
        }
    }
}

fn default_github_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_interesting_workflows() -> Vec<String> {
    vec![
        "KinD integration".to_string(),
        "Cloud integration".to_string(),
    ]
}

fn default_window_months() -> u32 {
    1
}

// GitHub allows 5000 requests an hour, i.e. one every 720ms.
fn default_annotation_interval_ms() -> u64 {
    750
}

fn default_per_page() -> u8 {
    100
}

const CANDIDATES: [&str; 4] = ["cihealth.toml", "cihealth.json", "cihealth.yaml", "cihealth.yml"];

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./cihealth.toml, ./cihealth.json, ./cihealth.yaml, ./cihealth.yml
    /// 3. `<config dir>/cihealth/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let user_config = dirs::config_dir().map(|dir| dir.join("cihealth").join("config.toml"));

        let found = CANDIDATES
            .iter()
            .map(PathBuf::from)
            .chain(user_config)
            .find(|candidate| candidate.exists());

        match found {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CiHealthError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        let parsed: std::result::Result<Self, String> = match extension {
            "toml" => toml::from_str(&contents).map_err(|e| e.to_string()),
            "json" => serde_json::from_str(&contents).map_err(|e| e.to_string()),
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| e.to_string()),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .map_err(|e| e.to_string()),
        };

        parsed.map_err(|e| {
            CiHealthError::Config(format!("Failed to parse config file {}: {e}", path.display()))
        })
    }
}

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};

use crate::auth::Token;
use crate::config::{Config, GitHubConfig, OutputFormat};
use crate::error::CiHealthError;
use crate::output;
use crate::providers::GitHubProvider;

#[derive(Parser)]
#[command(name = "cihealth")]
#[command(author, version, about = "CI Health Report", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./cihealth.toml and friends)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Report on a GitHub Actions repository
    Github {
        #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// API base URL
        #[arg(short, long)]
        url: Option<String>,

        /// Repository as owner/repo
        #[arg(short, long)]
        repo: Option<String>,

        /// Workflow whose annotations are fetched (repeatable)
        #[arg(short, long = "interesting")]
        interesting: Vec<String>,

        /// Trailing window length in months
        #[arg(short, long)]
        window_months: Option<u32>,
    },
}

/// Fills `config` with whatever was given on the command line.
fn apply_overrides(
    mut config: GitHubConfig,
    token: Option<&str>,
    url: Option<&str>,
    repo: Option<&str>,
    interesting: &[String],
    window_months: Option<u32>,
) -> GitHubConfig {
    if let Some(token) = token {
        config.token = Some(token.to_string());
    }
    if let Some(url) = url {
        config.base_url = url.to_string();
    }
    if let Some(repo) = repo {
        config.repo_path = Some(repo.to_string());
    }
    if !interesting.is_empty() {
        config.interesting_workflows = interesting.to_vec();
    }
    if let Some(months) = window_months {
        config.window_months = months;
    }
    config
}

/// Token and repository are both required before anything touches the network.
fn require_credentials(config: &GitHubConfig) -> crate::error::Result<(Token, String)> {
    let token = config
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(Token::from)
        .ok_or_else(|| {
            CiHealthError::Config("GITHUB_TOKEN env var or --token is required".to_string())
        })?;

    let repo = config.repo_path.clone().ok_or_else(|| {
        CiHealthError::Config("a repository is required (--repo owner/repo)".to_string())
    })?;

    Ok((token, repo))
}

impl Cli {
    async fn execute_github(&self, file_config: Config, github: GitHubConfig) -> Result<()> {
        let (token, repo) = require_credentials(&github)?;

        info!("Collecting CI health for repository: {repo}");

        let provider =
            GitHubProvider::new(&github.base_url, &repo, token, github.fetch_settings())?;
        let report = provider.collect_report().await.inspect_err(|e| {
            if e.is_transport() {
                warn!("CI API request failed, no report was produced");
            }
        })?;

        let format = self.format.unwrap_or(file_config.output.format);
        let pretty = self.pretty || file_config.output.pretty;

        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        output::export_report(&report, format, pretty, &mut handle)?;
        handle.flush()?;

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        match &self.command {
            Commands::Github {
                token,
                url,
                repo,
                interesting,
                window_months,
            } => {
                let github = apply_overrides(
                    config.github.clone(),
                    token.as_deref(),
                    url.as_deref(),
                    repo.as_deref(),
                    interesting,
                    *window_months,
                );
                self.execute_github(config, github).await
            }
        }
    }
}

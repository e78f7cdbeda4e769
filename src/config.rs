use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::ConfigError;
use crate::generate::DEFAULT_TEMPERATURE;
use crate::llm::gemini::DEFAULT_MODEL;
use crate::publish::DEFAULT_BASE_BRANCH;

pub const DEFAULT_THRESHOLD: f64 = 40.0;

#[derive(Parser, Debug)]
#[command(
    name = "autotestgen",
    version,
    about = "Generate unit tests for changed Go files below a coverage threshold and open a PR with them."
)]
pub struct Cli {
    #[arg(long, default_value = "", help = "PR number that was merged (comments go here)")]
    pub pr_number: String,

    #[arg(long, default_value = "", help = "Newline-separated list of changed files")]
    pub changed_files: String,

    #[arg(long, help = "Repository owner")]
    pub repo_owner: Option<String>,

    #[arg(long, help = "Repository name")]
    pub repo_name: Option<String>,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, help = "GitHub token")]
    pub github_token: Option<String>,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, help = "Gemini API key")]
    pub gemini_api_key: Option<String>,

    #[arg(long, default_value_t = DEFAULT_THRESHOLD, help = "Coverage threshold percentage")]
    pub coverage_threshold: f64,

    #[arg(long, default_value = ".", help = "Repository checkout the changed paths are relative to")]
    pub repo_root: PathBuf,

    #[arg(long, default_value = DEFAULT_BASE_BRANCH, help = "Branch the test PRs target")]
    pub base_branch: String,

    #[arg(long, default_value = DEFAULT_MODEL, help = "Gemini model name")]
    pub model: String,

    #[arg(long, default_value_t = DEFAULT_TEMPERATURE, help = "Sampling temperature")]
    pub temperature: f32,

    #[arg(long, default_value_t = 900, help = "Overall deadline for the run, in seconds")]
    pub timeout_secs: u64,

    #[arg(long, help = "GitHub API base URL (GitHub Enterprise)")]
    pub github_api_url: Option<String>,

    #[arg(long, help = "Gemini API base URL")]
    pub gemini_api_url: Option<String>,
}

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub pr_number: String,
    pub changed_files: Vec<String>,
    pub repo_owner: String,
    pub repo_name: String,
    pub github_token: String,
    pub gemini_api_key: String,
    pub coverage_threshold: f64,
    pub repo_root: PathBuf,
    pub base_branch: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
    pub github_api_url: Option<String>,
    pub gemini_api_url: Option<String>,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let repo_owner = required(cli.repo_owner, "repo-owner")?;
        let repo_name = required(cli.repo_name, "repo-name")?;
        let github_token = required(cli.github_token, "github-token")?;
        let gemini_api_key = required(cli.gemini_api_key, "gemini-api-key")?;

        if !(0.0..=100.0).contains(&cli.coverage_threshold) {
            return Err(ConfigError::Threshold(cli.coverage_threshold));
        }
        if !(0.0..=2.0).contains(&cli.temperature) {
            return Err(ConfigError::Temperature(cli.temperature));
        }

        Ok(Self {
            pr_number: cli.pr_number.trim().to_string(),
            changed_files: parse_changed_files(&cli.changed_files),
            repo_owner,
            repo_name,
            github_token,
            gemini_api_key,
            coverage_threshold: cli.coverage_threshold,
            repo_root: cli.repo_root,
            base_branch: cli.base_branch,
            model: cli.model,
            temperature: cli.temperature,
            timeout: Duration::from_secs(cli.timeout_secs),
            github_api_url: cli.github_api_url,
            gemini_api_url: cli.gemini_api_url,
        })
    }
}

fn required(value: Option<String>, flag: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(flag))
}

/// Splits the newline-separated list, dropping blanks.
pub fn parse_changed_files(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

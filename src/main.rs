mod config;
mod coverage;
mod deadline;
mod error;
mod extract;
mod generate;
mod llm;
mod pipeline;
mod publish;

use std::error::Error;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    config::{Cli, Config},
    coverage::{GoTestRunner, Prober},
    deadline::Deadline,
    error::ConfigError,
    extract::{Extractor, GoParser},
    generate::{PassThrough, TestGenerator},
    llm::GeminiClient,
    pipeline::{FileOutcome, Pipeline, RunSummary},
    publish::{GithubClient, Publisher},
};

fn init_tracing() {
    let default_level = "info";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_cli(cli)?;

    if config.changed_files.is_empty() {
        info!("No changed files to process");
        return Ok(());
    }

    let pipeline = build_pipeline(&config)?;
    let deadline = Deadline::after(config.timeout);

    let summary = pipeline.run(&config.changed_files, &deadline);
    print_summary(&summary);

    info!("Test generation process completed");
    Ok(())
}

fn build_pipeline(config: &Config) -> Result<Pipeline, ConfigError> {
    let gemini = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.model.clone(),
        config.gemini_api_url.clone(),
    )
    .map_err(ConfigError::Client)?;

    let github = GithubClient::new(
        &config.github_token,
        config.repo_owner.clone(),
        config.repo_name.clone(),
        config.github_api_url.clone(),
    )
    .map_err(ConfigError::Client)?;

    Ok(Pipeline {
        prober: Prober::new(Box::new(GoTestRunner::new()), &config.repo_root),
        extractor: Extractor::new(Box::new(GoParser), &config.repo_root),
        generator: TestGenerator::new(
            Box::new(gemini),
            Box::new(PassThrough),
            &config.repo_root,
            config.temperature,
        ),
        publisher: Publisher::new(Box::new(github), config.base_branch.clone()),
        pr_number: config.pr_number.clone(),
        threshold: config.coverage_threshold,
    })
}

fn print_summary(summary: &RunSummary) {
    println!(
        "processed: {} files ({} published, {} skipped, {} failed)",
        summary.outcomes.len(),
        summary.published(),
        summary.skipped(),
        summary.failed()
    );

    for (file, outcome) in &summary.outcomes {
        match outcome {
            FileOutcome::Skipped { coverage } => {
                println!("  {file}: coverage {coverage:.2}%, skipped");
            }
            FileOutcome::NoCandidates { coverage } => {
                println!("  {file}: coverage {coverage:.2}%, nothing to test");
            }
            FileOutcome::Published {
                coverage,
                branch,
                test_file,
                pull,
            } => {
                println!(
                    "  {file}: coverage {coverage:.2}%, wrote {test_file} on {branch} (#{} {})",
                    pull.number, pull.url
                );
            }
            FileOutcome::Failed { stage, error } => {
                println!("  {file}: failed at {stage}: {error}");
            }
        }
    }
}

//! pipeline.rs
//!
//! Per-file driver: probe → extract → generate → publish → comment.
//! Files are processed one at a time and independently.

use std::fmt;
use std::path::Path;

use tracing::{error, info, warn};

use crate::coverage::{test_file_for, Prober};
use crate::deadline::Deadline;
use crate::error::PipelineError;
use crate::extract::Extractor;
use crate::generate::TestGenerator;
use crate::publish::{PublishRequest, Publisher, PullRequestRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Coverage,
    Extract,
    Generate,
    Publish,
}

impl Stage {
    /// Phrase used in the failure comment: "Failed to <phrase> `file`".
    fn phrase(self) -> &'static str {
        match self {
            Stage::Coverage => "analyze coverage for",
            Stage::Extract => "extract functions from",
            Stage::Generate => "generate tests for",
            Stage::Publish => "create PR for tests of",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Coverage => "coverage",
            Stage::Extract => "extract",
            Stage::Generate => "generate",
            Stage::Publish => "publish",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
pub enum FileOutcome {
    /// Coverage already at or above the threshold.
    Skipped { coverage: f64 },
    NoCandidates { coverage: f64 },
    Published {
        coverage: f64,
        branch: String,
        test_file: String,
        pull: PullRequestRef,
    },
    Failed { stage: Stage, error: PipelineError },
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<(String, FileOutcome)>,
}

impl RunSummary {
    pub fn published(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Published { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped { .. } | FileOutcome::NoCandidates { .. }))
    }

    fn count(&self, f: impl Fn(&FileOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| f(o)).count()
    }
}

pub struct Pipeline {
    pub prober: Prober,
    pub extractor: Extractor,
    pub generator: TestGenerator,
    pub publisher: Publisher,
    pub pr_number: String,
    pub threshold: f64,
}

impl Pipeline {
    pub fn run(&self, files: &[String], deadline: &Deadline) -> RunSummary {
        let mut summary = RunSummary::default();

        for file in files {
            info!(file = %file, "processing file");
            let outcome = self.process(file, deadline);
            self.report(file, &outcome, deadline);
            summary.outcomes.push((file.clone(), outcome));
        }

        summary
    }

    fn process(&self, file: &str, deadline: &Deadline) -> FileOutcome {
        let verdict = match self.prober.probe(file, self.threshold, deadline) {
            Ok(v) => v,
            Err(error) => return failed(Stage::Coverage, error),
        };

        if !verdict.needs_tests {
            info!(file, coverage = verdict.coverage, "sufficient coverage, skipping");
            return FileOutcome::Skipped {
                coverage: verdict.coverage,
            };
        }
        info!(file, coverage = verdict.coverage, "file needs tests");

        let functions = match self.extractor.extract(file) {
            Ok(f) => f,
            Err(error) => return failed(Stage::Extract, error),
        };

        if functions.is_empty() {
            info!(file, "no functions need testing");
            return FileOutcome::NoCandidates {
                coverage: verdict.coverage,
            };
        }

        let artifact = match self.generator.generate(file, &functions, deadline) {
            Ok(a) => a,
            Err(error) => return failed(Stage::Generate, past_deadline(error, deadline)),
        };

        let test_file = test_file_for(file);
        let branch = branch_name(file);
        let request = PublishRequest {
            original_file: file,
            test_file: &test_file,
            content: &artifact.content,
            branch: &branch,
            coverage: verdict.coverage,
            threshold: self.threshold,
        };

        match self.publisher.publish(&request, deadline) {
            Ok(pull) => FileOutcome::Published {
                coverage: verdict.coverage,
                branch,
                test_file,
                pull,
            },
            Err(error) => failed(Stage::Publish, past_deadline(error, deadline)),
        }
    }

    fn report(&self, file: &str, outcome: &FileOutcome, deadline: &Deadline) {
        let message = match outcome {
            FileOutcome::Published {
                coverage, branch, ..
            } => {
                info!(file, branch = %branch, "created test PR");
                format!(
                    "✅ Generated unit tests for `{file}` (coverage was {coverage:.2}%). New PR created with branch `{branch}`"
                )
            }
            FileOutcome::Failed { stage, error } => {
                error!(file, %stage, %error, "pipeline failed");
                format!("❌ Failed to {} `{file}`: {error}", stage.phrase())
            }
            FileOutcome::Skipped { .. } | FileOutcome::NoCandidates { .. } => return,
        };

        if let Err(e) = self.publisher.comment(&self.pr_number, &message, deadline) {
            warn!(file, error = %e, "failed to comment on PR");
        }
    }
}

fn failed(stage: Stage, error: PipelineError) -> FileOutcome {
    FileOutcome::Failed { stage, error }
}

/// External calls that fail once the deadline has passed are reported as tool failures.
fn past_deadline(error: PipelineError, deadline: &Deadline) -> PipelineError {
    let external = matches!(
        error,
        PipelineError::Generation(_) | PipelineError::Remote { .. }
    );
    if external && deadline.expired() {
        return PipelineError::ToolFailure(format!("deadline exceeded ({error})"));
    }
    error
}

/// `pkg/sub_dir/x.go` -> `auto-tests-pkg-sub-dir`; root-level files -> `auto-tests-root`.
pub fn branch_name(file: &str) -> String {
    let dir = Path::new(file)
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();

    if dir.is_empty() || dir == "." {
        return "auto-tests-root".into();
    }

    let slug = dir.replace(['/', '\\', '_'], "-").to_lowercase();
    format!("auto-tests-{slug}")
}

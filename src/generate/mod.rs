//! generate/mod.rs
//!
//! Test content generation: prompt, model call, cleanup, validation.

pub mod cleanup;
pub mod package;
pub mod prompt;
pub mod validate;

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::deadline::Deadline;
use crate::error::PipelineError;
use crate::extract::FunctionDescriptor;
use crate::llm::TextGenerator;

pub use validate::{PassThrough, Validator};

/// Low temperature: consistent code over creative code.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub content: String,
}

pub struct TestGenerator {
    model: Box<dyn TextGenerator>,
    validator: Box<dyn Validator>,
    repo_root: PathBuf,
    temperature: f32,
}

impl TestGenerator {
    pub fn new(
        model: Box<dyn TextGenerator>,
        validator: Box<dyn Validator>,
        repo_root: impl Into<PathBuf>,
        temperature: f32,
    ) -> Self {
        Self {
            model,
            validator,
            repo_root: repo_root.into(),
            temperature,
        }
    }

    pub fn generate(
        &self,
        file: &str,
        functions: &[FunctionDescriptor],
        deadline: &Deadline,
    ) -> Result<GeneratedArtifact, PipelineError> {
        let path = self.repo_root.join(file);
        let original = fs::read_to_string(&path).map_err(|source| PipelineError::Read {
            path: path.clone(),
            source,
        })?;

        let package = package::extract_package_info(&original);
        let prompt = prompt::build_prompt(file, &original, &package, functions);

        info!(file, functions = functions.len(), "requesting generated tests");
        let candidates = self
            .model
            .generate(&prompt, self.temperature, deadline)
            .map_err(PipelineError::Generation)?;

        let raw: String = candidates
            .into_iter()
            .next()
            .ok_or(PipelineError::EmptyResult)?
            .concat();

        if raw.trim().is_empty() {
            return Err(PipelineError::EmptyResult);
        }

        let content = cleanup::cleanup(&raw, &package.name);
        debug!(file, bytes = content.len(), "cleaned generated tests");

        self.validator
            .validate(&path, &content)
            .map_err(PipelineError::Validation)?;

        Ok(GeneratedArtifact { content })
    }
}

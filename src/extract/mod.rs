//! extract/mod.rs
//!
//! Selects the functions of a changed file that are worth generating tests for.

pub mod parser;

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::PipelineError;

pub use parser::{Declaration, GoParser, SourceParser};

/// Names the test toolchain treats as scaffolding; never generation targets.
pub const RESERVED_PREFIXES: [&str; 4] = ["Test", "Benchmark", "Example", "Fuzz"];

/// Bodies shorter than this are treated as getters/setters.
pub const MIN_BODY_STATEMENTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescriptor {
    pub name: String,
    /// Verbatim source, doc comment included, newline-terminated.
    pub source: String,
    pub start_line: usize,
    pub end_line: usize,
}

pub struct Extractor {
    parser: Box<dyn SourceParser>,
    repo_root: PathBuf,
}

impl Extractor {
    pub fn new(parser: Box<dyn SourceParser>, repo_root: impl Into<PathBuf>) -> Self {
        Self {
            parser,
            repo_root: repo_root.into(),
        }
    }

    pub fn extract(&self, file: &str) -> Result<Vec<FunctionDescriptor>, PipelineError> {
        let path = self.repo_root.join(file);
        let source = fs::read_to_string(&path).map_err(|source| PipelineError::Read {
            path: path.clone(),
            source,
        })?;

        let decls = self
            .parser
            .declarations(&source)
            .map_err(|message| PipelineError::Parse { path, message })?;

        let selected = select(&decls, &source);
        for f in &selected {
            debug!(file, name = %f.name, start = f.start_line, end = f.end_line, "selected");
        }
        debug!(
            file,
            declarations = decls.len(),
            selected = selected.len(),
            "extracted functions"
        );
        Ok(selected)
    }
}

/// Keeps qualifying declarations, in source order.
pub fn select(decls: &[Declaration], source: &str) -> Vec<FunctionDescriptor> {
    let lines: Vec<&str> = source.split('\n').collect();

    decls
        .iter()
        .filter(|d| should_include(d))
        .map(|d| {
            let start_line = d.doc_start_line.unwrap_or(d.start_line);
            let mut text = String::new();
            for line in lines
                .iter()
                .skip(start_line.saturating_sub(1))
                .take((d.end_line + 1).saturating_sub(start_line))
            {
                text.push_str(line);
                text.push('\n');
            }

            FunctionDescriptor {
                name: d.name.clone(),
                source: text,
                start_line,
                end_line: d.end_line,
            }
        })
        .collect()
}

pub fn should_include(decl: &Declaration) -> bool {
    if RESERVED_PREFIXES.iter().any(|p| decl.name.starts_with(p)) {
        return false;
    }

    decl.exported || decl.body_statements >= MIN_BODY_STATEMENTS
}

//! error.rs
//!
//! Error taxonomy for a single file's pipeline run, plus startup config errors.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which remote call failed while publishing or commenting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStage {
    RefGet,
    RefDelete,
    RefCreate,
    ContentGet,
    ContentCreate,
    ContentUpdate,
    PrCreate,
    CommentCreate,
}

impl fmt::Display for RemoteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RemoteStage::RefGet => "get ref",
            RemoteStage::RefDelete => "delete ref",
            RemoteStage::RefCreate => "create ref",
            RemoteStage::ContentGet => "get file contents",
            RemoteStage::ContentCreate => "create file",
            RemoteStage::ContentUpdate => "update file",
            RemoteStage::PrCreate => "create pull request",
            RemoteStage::CommentCreate => "create comment",
        };
        f.write_str(s)
    }
}

/// Failure reported by a source-hosting collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("not found")]
    NotFound,

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("tool failure: {0}")]
    ToolFailure(String),

    #[error("failed to generate content: {0}")]
    Generation(String),

    #[error("no content generated")]
    EmptyResult,

    #[error("generated code doesn't validate: {0}")]
    Validation(String),

    #[error("failed to {stage}: {source}")]
    Remote {
        stage: RemoteStage,
        #[source]
        source: HostError,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl PipelineError {
    pub fn remote(stage: RemoteStage, source: HostError) -> Self {
        PipelineError::Remote { stage, source }
    }
}

/// Fatal startup errors; nothing has been processed when one of these surfaces.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required flag --{0}")]
    Missing(&'static str),

    #[error("coverage threshold must be within 0..=100, got {0}")]
    Threshold(f64),

    #[error("temperature must be within 0.0..=2.0, got {0}")]
    Temperature(f32),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

use crate::deadline::Deadline;
use crate::error::HostError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefInfo {
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentInfo {
    /// Blob SHA; required as a precondition when updating.
    pub sha: String,
}

/// A file write on a branch. `content` is plain text; encoding is the host's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWrite {
    pub path: String,
    pub branch: String,
    pub message: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPull {
    pub title: String,
    pub head: String,
    pub base: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub number: u64,
    pub url: String,
}

/// Source-hosting collaborator, scoped to one owner/repository.
pub trait SourceHost {
    fn get_ref(&self, branch: &str, deadline: &Deadline) -> Result<RefInfo, HostError>;
    fn create_ref(&self, branch: &str, sha: &str, deadline: &Deadline) -> Result<(), HostError>;
    fn delete_ref(&self, branch: &str, deadline: &Deadline) -> Result<(), HostError>;

    fn get_content(
        &self,
        path: &str,
        branch: &str,
        deadline: &Deadline,
    ) -> Result<ContentInfo, HostError>;
    fn create_file(&self, file: &FileWrite, deadline: &Deadline) -> Result<(), HostError>;
    fn update_file(
        &self,
        file: &FileWrite,
        sha: &str,
        deadline: &Deadline,
    ) -> Result<(), HostError>;

    fn create_pull(&self, pull: &NewPull, deadline: &Deadline) -> Result<PullRequestRef, HostError>;
    fn create_comment(&self, number: u64, body: &str, deadline: &Deadline)
        -> Result<(), HostError>;
}

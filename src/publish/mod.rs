//! publish/mod.rs
//!
//! Pushes a generated test file to a fresh branch and opens a pull request.

pub mod body;
pub mod github;
pub mod host;

use tracing::{debug, info};

use crate::deadline::Deadline;
use crate::error::{HostError, PipelineError, RemoteStage};

pub use github::GithubClient;
pub use host::{FileWrite, NewPull, PullRequestRef, SourceHost};

pub const DEFAULT_BASE_BRANCH: &str = "main";

#[derive(Debug, Clone)]
pub struct PublishRequest<'a> {
    pub original_file: &'a str,
    pub test_file: &'a str,
    pub content: &'a str,
    pub branch: &'a str,
    pub coverage: f64,
    pub threshold: f64,
}

pub struct Publisher {
    host: Box<dyn SourceHost>,
    base_branch: String,
}

impl Publisher {
    pub fn new(host: Box<dyn SourceHost>, base_branch: impl Into<String>) -> Self {
        Self {
            host,
            base_branch: base_branch.into(),
        }
    }

    pub fn publish(
        &self,
        req: &PublishRequest<'_>,
        deadline: &Deadline,
    ) -> Result<PullRequestRef, PipelineError> {
        let base = self
            .host
            .get_ref(&self.base_branch, deadline)
            .map_err(|e| PipelineError::remote(RemoteStage::RefGet, e))?;

        self.reset_branch(req.branch, deadline)?;

        self.host
            .create_ref(req.branch, &base.sha, deadline)
            .map_err(|e| PipelineError::remote(RemoteStage::RefCreate, e))?;
        debug!(branch = req.branch, sha = %base.sha, "branch created");

        self.upsert_file(req.test_file, req.content, req.branch, deadline)?;

        let pull = NewPull {
            title: body::pr_title(req.original_file),
            head: req.branch.to_string(),
            base: self.base_branch.clone(),
            body: body::pr_body(req.original_file, req.coverage, req.threshold),
        };

        let pr = self
            .host
            .create_pull(&pull, deadline)
            .map_err(|e| PipelineError::remote(RemoteStage::PrCreate, e))?;

        info!(number = pr.number, url = %pr.url, "pull request opened");
        Ok(pr)
    }

    /// Posts `message` on the review request identified by `pr_number`.
    /// A blank identifier means there is nothing to comment on.
    pub fn comment(
        &self,
        pr_number: &str,
        message: &str,
        deadline: &Deadline,
    ) -> Result<(), PipelineError> {
        let pr_number = pr_number.trim();
        if pr_number.is_empty() {
            return Ok(());
        }

        let number: u64 = pr_number
            .parse()
            .map_err(|e| PipelineError::InvalidInput(format!("invalid PR number {pr_number:?}: {e}")))?;

        self.host
            .create_comment(number, message, deadline)
            .map_err(|e| PipelineError::remote(RemoteStage::CommentCreate, e))
    }

    // A branch left over from an earlier run is always replaced, never reused.
    fn reset_branch(&self, branch: &str, deadline: &Deadline) -> Result<(), PipelineError> {
        match self.host.get_ref(branch, deadline) {
            Ok(_) => {
                info!(branch, "deleting stale branch");
                self.host
                    .delete_ref(branch, deadline)
                    .map_err(|e| PipelineError::remote(RemoteStage::RefDelete, e))
            }
            Err(HostError::NotFound) => Ok(()),
            Err(e) => Err(PipelineError::remote(RemoteStage::RefGet, e)),
        }
    }

    fn upsert_file(
        &self,
        path: &str,
        content: &str,
        branch: &str,
        deadline: &Deadline,
    ) -> Result<(), PipelineError> {
        let existing = match self.host.get_content(path, branch, deadline) {
            Ok(info) => Some(info),
            Err(HostError::NotFound) => None,
            Err(e) => return Err(PipelineError::remote(RemoteStage::ContentGet, e)),
        };

        match existing {
            None => {
                let write = FileWrite {
                    path: path.to_string(),
                    branch: branch.to_string(),
                    message: format!("Add auto-generated tests for {path}"),
                    content: content.to_string(),
                };
                self.host
                    .create_file(&write, deadline)
                    .map_err(|e| PipelineError::remote(RemoteStage::ContentCreate, e))
            }
            Some(info) => {
                let write = FileWrite {
                    path: path.to_string(),
                    branch: branch.to_string(),
                    message: format!("Update auto-generated tests for {path}"),
                    content: content.to_string(),
                };
                self.host
                    .update_file(&write, &info.sha, deadline)
                    .map_err(|e| PipelineError::remote(RemoteStage::ContentUpdate, e))
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Call, StubHost};
    use super::*;
    use std::time::Duration;

    fn deadline() -> Deadline {
        Deadline::after(Duration::from_secs(30))
    }

    fn request() -> PublishRequest<'static> {
        PublishRequest {
            original_file: "pkg/calc.go",
            test_file: "pkg/calc_test.go",
            content: "package calc\n",
            branch: "auto-tests-pkg",
            coverage: 12.0,
            threshold: 40.0,
        }
    }

    #[test]
    fn fresh_branch_and_new_file() {
        let host = StubHost::with_main();
        let publisher = Publisher::new(Box::new(host.clone()), "main");

        let pr = publisher.publish(&request(), &deadline()).unwrap();

        assert_eq!(pr.number, 77);
        let calls = host.calls();
        assert_eq!(calls[0], Call::GetRef("main".into()));
        assert_eq!(calls[1], Call::GetRef("auto-tests-pkg".into()));
        assert_eq!(
            calls[2],
            Call::CreateRef("auto-tests-pkg".into(), "base-sha".into())
        );
        assert_eq!(
            calls[3],
            Call::GetContent("pkg/calc_test.go".into(), "auto-tests-pkg".into())
        );
        match &calls[4] {
            Call::CreateFile(w) => {
                assert_eq!(w.message, "Add auto-generated tests for pkg/calc_test.go");
                assert_eq!(w.content, "package calc\n");
            }
            other => panic!("expected create, got {other:?}"),
        }
        match &calls[5] {
            Call::CreatePull(p) => {
                assert_eq!(p.head, "auto-tests-pkg");
                assert_eq!(p.base, "main");
                assert!(p.title.contains("pkg/calc.go"));
                assert!(p.body.contains("40.00%"));
            }
            other => panic!("expected pull, got {other:?}"),
        }
        assert!(!calls.iter().any(|c| matches!(c, Call::DeleteRef(_) | Call::UpdateFile(..))));
    }

    #[test]
    fn stale_branch_is_deleted_then_recreated() {
        let host = StubHost::with_main();
        host.state
            .borrow_mut()
            .branches
            .insert("auto-tests-pkg".into(), "old-sha".into());
        let publisher = Publisher::new(Box::new(host.clone()), "main");

        publisher.publish(&request(), &deadline()).unwrap();

        let calls = host.calls();
        let delete = calls
            .iter()
            .position(|c| *c == Call::DeleteRef("auto-tests-pkg".into()))
            .expect("stale branch deleted");
        let create = calls
            .iter()
            .position(|c| *c == Call::CreateRef("auto-tests-pkg".into(), "base-sha".into()))
            .expect("branch recreated");
        assert!(delete < create);
    }

    #[test]
    fn existing_file_is_updated_with_its_sha() {
        let host = StubHost::with_main();
        host.state.borrow_mut().files.insert(
            ("auto-tests-pkg".into(), "pkg/calc_test.go".into()),
            "blob-sha".into(),
        );
        let publisher = Publisher::new(Box::new(host.clone()), "main");

        publisher.publish(&request(), &deadline()).unwrap();

        let update = host
            .calls()
            .into_iter()
            .find_map(|c| match c {
                Call::UpdateFile(w, sha) => Some((w, sha)),
                _ => None,
            })
            .expect("update call");
        assert_eq!(update.1, "blob-sha");
        assert_eq!(update.0.message, "Update auto-generated tests for pkg/calc_test.go");
        assert!(!host.calls().iter().any(|c| matches!(c, Call::CreateFile(_))));
    }

    #[test]
    fn missing_base_branch_is_ref_get_error() {
        let host = StubHost::default();
        let publisher = Publisher::new(Box::new(host.clone()), "main");

        let err = publisher.publish(&request(), &deadline()).unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Remote {
                stage: RemoteStage::RefGet,
                source: HostError::NotFound
            }
        ));
        assert_eq!(host.calls().len(), 1);
    }

    #[test]
    fn branch_lookup_failure_is_ref_get_error() {
        let host = StubHost::with_main();
        host.fail_ref("auto-tests-pkg");
        let publisher = Publisher::new(Box::new(host.clone()), "main");

        let err = publisher.publish(&request(), &deadline()).unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Remote {
                stage: RemoteStage::RefGet,
                source: HostError::Api { status: 502, .. }
            }
        ));
        assert!(!host
            .calls()
            .iter()
            .any(|c| matches!(c, Call::DeleteRef(_) | Call::CreateRef(..))));
    }

    #[test]
    fn delete_failure_is_fatal() {
        let host = StubHost::with_main();
        host.state
            .borrow_mut()
            .branches
            .insert("auto-tests-pkg".into(), "old".into());
        host.fail_on("delete_ref");
        let publisher = Publisher::new(Box::new(host.clone()), "main");

        let err = publisher.publish(&request(), &deadline()).unwrap_err();

        assert!(matches!(err, PipelineError::Remote { stage: RemoteStage::RefDelete, .. }));
        assert!(!host.calls().iter().any(|c| matches!(c, Call::CreateRef(..))));
    }

    #[test]
    fn each_write_stage_maps_to_its_own_error() {
        for (op, stage) in [
            ("create_ref", RemoteStage::RefCreate),
            ("get_content", RemoteStage::ContentGet),
            ("create_file", RemoteStage::ContentCreate),
            ("update_file", RemoteStage::ContentUpdate),
            ("create_pull", RemoteStage::PrCreate),
        ] {
            let host = StubHost::with_main();
            if op == "update_file" {
                host.state.borrow_mut().files.insert(
                    ("auto-tests-pkg".into(), "pkg/calc_test.go".into()),
                    "blob-sha".into(),
                );
            }
            host.fail_on(op);
            let publisher = Publisher::new(Box::new(host), "main");

            let err = publisher.publish(&request(), &deadline()).unwrap_err();

            match err {
                PipelineError::Remote { stage: got, .. } => assert_eq!(got, stage, "{op}"),
                other => panic!("{op}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn comment_on_blank_pr_number_is_a_no_op() {
        let host = StubHost::with_main();
        let publisher = Publisher::new(Box::new(host.clone()), "main");

        publisher.comment("", "hello", &deadline()).unwrap();
        publisher.comment("   ", "hello", &deadline()).unwrap();

        assert!(host.calls().is_empty());
    }

    #[test]
    fn comment_with_unparsable_pr_number_is_invalid_input() {
        let host = StubHost::with_main();
        let publisher = Publisher::new(Box::new(host.clone()), "main");

        let err = publisher.comment("#12", "hello", &deadline()).unwrap_err();

        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert!(host.calls().is_empty());
    }

    #[test]
    fn comment_posts_to_the_issue() {
        let host = StubHost::with_main();
        let publisher = Publisher::new(Box::new(host.clone()), "main");

        publisher.comment("12", "hello", &deadline()).unwrap();

        assert_eq!(host.calls(), vec![Call::CreateComment(12, "hello".into())]);
    }

    #[test]
    fn comment_api_failure_is_comment_create_error() {
        let host = StubHost::with_main();
        host.fail_on("create_comment");
        let publisher = Publisher::new(Box::new(host), "main");

        let err = publisher.comment("12", "hello", &deadline()).unwrap_err();

        assert!(matches!(err, PipelineError::Remote { stage: RemoteStage::CommentCreate, .. }));
    }
}

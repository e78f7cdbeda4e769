// src/publish/github.rs

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::deadline::Deadline;
use crate::error::HostError;
use crate::publish::host::{ContentInfo, FileWrite, NewPull, PullRequestRef, RefInfo, SourceHost};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct RepoContent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GithubPull {
    number: u64,
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubErrorBody {
    message: Option<String>,
}

pub struct GithubClient {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
}

impl GithubClient {
    pub fn new(
        token: &str,
        owner: impl Into<String>,
        repo: impl Into<String>,
        api_url: Option<String>,
    ) -> Result<Self, String> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("autotestgen"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        let value = format!("Bearer {}", token);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&value).map_err(|e| e.to_string())?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| e.to_string())?;

        Ok(Self {
            client,
            api_url: api_url
                .unwrap_or_else(|| DEFAULT_API_URL.into())
                .trim_end_matches('/')
                .to_string(),
            owner: owner.into(),
            repo: repo.into(),
        })
    }

    fn url(&self, tail: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.api_url, self.owner, self.repo, tail)
    }

    fn send(&self, req: RequestBuilder, deadline: &Deadline) -> Result<Response, HostError> {
        let timeout = deadline
            .remaining()
            .ok_or_else(|| HostError::Transport("deadline exceeded".into()))?;

        let resp = req
            .timeout(timeout)
            .send()
            .map_err(|e| HostError::Transport(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(HostError::NotFound);
        }
        if !status.is_success() {
            let raw = resp.text().unwrap_or_default();
            return Err(HostError::Api {
                status: status.as_u16(),
                message: error_message(&raw),
            });
        }
        Ok(resp)
    }
}

impl SourceHost for GithubClient {
    fn get_ref(&self, branch: &str, deadline: &Deadline) -> Result<RefInfo, HostError> {
        let url = self.url(&format!("git/ref/heads/{branch}"));
        debug!(%url, "get ref");
        let r: GitRef = self
            .send(self.client.get(&url), deadline)?
            .json()
            .map_err(|e| HostError::Transport(e.to_string()))?;
        Ok(RefInfo { sha: r.object.sha })
    }

    fn create_ref(&self, branch: &str, sha: &str, deadline: &Deadline) -> Result<(), HostError> {
        let url = self.url("git/refs");
        debug!(%url, branch, sha, "create ref");
        self.send(
            self.client.post(&url).json(&json!({
                "ref": format!("refs/heads/{branch}"),
                "sha": sha,
            })),
            deadline,
        )?;
        Ok(())
    }

    fn delete_ref(&self, branch: &str, deadline: &Deadline) -> Result<(), HostError> {
        let url = self.url(&format!("git/refs/heads/{branch}"));
        debug!(%url, "delete ref");
        self.send(self.client.delete(&url), deadline)?;
        Ok(())
    }

    fn get_content(
        &self,
        path: &str,
        branch: &str,
        deadline: &Deadline,
    ) -> Result<ContentInfo, HostError> {
        let url = self.url(&format!("contents/{path}"));
        debug!(%url, branch, "get contents");
        let c: RepoContent = self
            .send(self.client.get(&url).query(&[("ref", branch)]), deadline)?
            .json()
            .map_err(|e| HostError::Transport(e.to_string()))?;
        Ok(ContentInfo { sha: c.sha })
    }

    fn create_file(&self, file: &FileWrite, deadline: &Deadline) -> Result<(), HostError> {
        let url = self.url(&format!("contents/{}", file.path));
        debug!(%url, branch = %file.branch, "create file");
        self.send(self.client.put(&url).json(&file_body(file, None)), deadline)?;
        Ok(())
    }

    fn update_file(
        &self,
        file: &FileWrite,
        sha: &str,
        deadline: &Deadline,
    ) -> Result<(), HostError> {
        let url = self.url(&format!("contents/{}", file.path));
        debug!(%url, branch = %file.branch, sha, "update file");
        self.send(self.client.put(&url).json(&file_body(file, Some(sha))), deadline)?;
        Ok(())
    }

    fn create_pull(&self, pull: &NewPull, deadline: &Deadline) -> Result<PullRequestRef, HostError> {
        let url = self.url("pulls");
        debug!(%url, head = %pull.head, base = %pull.base, "create pull request");
        let pr: GithubPull = self
            .send(
                self.client.post(&url).json(&json!({
                    "title": pull.title,
                    "head": pull.head,
                    "base": pull.base,
                    "body": pull.body,
                })),
                deadline,
            )?
            .json()
            .map_err(|e| HostError::Transport(e.to_string()))?;

        Ok(PullRequestRef {
            number: pr.number,
            url: pr.html_url.unwrap_or_default(),
        })
    }

    fn create_comment(
        &self,
        number: u64,
        body: &str,
        deadline: &Deadline,
    ) -> Result<(), HostError> {
        let url = self.url(&format!("issues/{number}/comments"));
        debug!(%url, "create comment");
        self.send(
            self.client.post(&url).json(&json!({ "body": body })),
            deadline,
        )?;
        Ok(())
    }
}

fn file_body(file: &FileWrite, sha: Option<&str>) -> Value {
    let mut body = json!({
        "message": file.message,
        "content": STANDARD.encode(file.content.as_bytes()),
        "branch": file.branch,
    });
    if let Some(sha) = sha {
        body["sha"] = sha.into();
    }
    body
}

fn error_message(raw: &str) -> String {
    serde_json::from_str::<GithubErrorBody>(raw)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| raw.trim().to_string())
}

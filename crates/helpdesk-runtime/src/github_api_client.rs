use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use base64::Engine;
use helpdesk_shows::ShowRecord;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::collaborators::{
    IssueFilter, IssuePatch, IssueTracker, ReadmeFile, ReadmeRepository, ReadmeTarget, RepoRef,
    RepositoryDispatcher,
};
use crate::github_issue::GithubIssue;
use crate::http_helpers::{build_http_client, percent_encode, truncate_for_error, USER_AGENT};

pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Clone, Deserialize)]
struct GithubCommentCreateResponse {
    html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GithubIssueUpdateResponse {
    html_url: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GithubContentResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Clone)]
/// REST client scoped to the show repository.
pub struct GithubApiClient {
    http: reqwest::Client,
    api_base: String,
    repo: RepoRef,
}

impl GithubApiClient {
    pub fn new(api_base: String, token: String, repo: RepoRef, request_timeout_ms: u64) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let auth_header = format!("Bearer {}", token.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth_header)
                .context("invalid github authorization header")?,
        );

        Ok(Self {
            http: build_http_client(headers, request_timeout_ms, "github")?,
            api_base: api_base.trim_end_matches('/').to_string(),
            repo,
        })
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    fn repo_url(&self, repo: &RepoRef) -> String {
        format!("{}/repos/{}/{}", self.api_base, repo.owner, repo.name)
    }

    async fn send_checked<F>(&self, operation: &str, request_builder: F) -> Result<reqwest::Response>
    where
        F: FnOnce() -> reqwest::RequestBuilder,
    {
        let response = request_builder()
            .send()
            .await
            .with_context(|| format!("github api {operation} request failed"))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        bail!(
            "github api {operation} failed with status {}: {}",
            status.as_u16(),
            truncate_for_error(&body, 800)
        );
    }

    async fn request_json<T, F>(&self, operation: &str, request_builder: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> reqwest::RequestBuilder,
    {
        self.send_checked(operation, request_builder)
            .await?
            .json::<T>()
            .await
            .with_context(|| format!("failed to decode github {operation}"))
    }
}

#[async_trait]
impl IssueTracker for GithubApiClient {
    async fn list_shows(&self, filter: &IssueFilter) -> Result<Vec<ShowRecord>> {
        let per_page = filter.per_page.clamp(1, 100);
        let per_page_value = per_page.to_string();
        let mut page = 1_u32;
        let mut rows = Vec::new();
        loop {
            let page_value = page.to_string();
            let chunk: Vec<GithubIssue> = self
                .request_json("list show issues", || {
                    self.http
                        .get(format!("{}/issues", self.repo_url(&self.repo)))
                        .query(&[
                            ("labels", filter.label.as_str()),
                            ("state", filter.state.as_str()),
                            ("per_page", per_page_value.as_str()),
                            ("page", page_value.as_str()),
                        ])
                })
                .await?;
            let chunk_len = chunk.len();
            rows.extend(
                chunk
                    .into_iter()
                    .filter(|issue| issue.pull_request.is_none())
                    .map(GithubIssue::into_show_record),
            );
            if chunk_len < per_page as usize {
                break;
            }
            page = page.saturating_add(1);
        }
        Ok(rows)
    }

    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<String> {
        let payload = json!({ "body": body });
        let response: GithubCommentCreateResponse = self
            .request_json("create issue comment", || {
                self.http
                    .post(format!(
                        "{}/issues/{issue_number}/comments",
                        self.repo_url(&self.repo)
                    ))
                    .json(&payload)
            })
            .await?;
        response
            .html_url
            .ok_or_else(|| anyhow!("github api create issue comment response has no html_url"))
    }

    async fn patch_issue(&self, issue_number: u64, patch: &IssuePatch) -> Result<String> {
        let response: GithubIssueUpdateResponse = self
            .request_json("update issue", || {
                self.http
                    .patch(format!("{}/issues/{issue_number}", self.repo_url(&self.repo)))
                    .json(patch)
            })
            .await?;
        Ok(response.html_url)
    }
}

#[async_trait]
impl ReadmeRepository for GithubApiClient {
    async fn fetch_readme(&self, target: &ReadmeTarget) -> Result<ReadmeFile> {
        let response: GithubContentResponse = self
            .request_json("get readme", || {
                self.http
                    .get(format!(
                        "{}/contents/{}",
                        self.repo_url(&target.repo),
                        encode_content_path(&target.path)
                    ))
                    .query(&[("ref", target.branch.as_str())])
            })
            .await?;
        if let Some(encoding) = response.encoding.as_deref() {
            if encoding != "base64" {
                bail!(
                    "github api get readme returned unsupported encoding '{encoding}' for {}",
                    target.repo.as_slug()
                );
            }
        }
        let compact = response
            .content
            .chars()
            .filter(|character| !character.is_ascii_whitespace())
            .collect::<String>();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact)
            .context("failed to decode readme content")?;
        let content = String::from_utf8(bytes).context("readme content is not utf-8")?;
        Ok(ReadmeFile {
            sha: response.sha,
            content,
        })
    }

    async fn update_readme(
        &self,
        target: &ReadmeTarget,
        previous: &ReadmeFile,
        content: &str,
        message: &str,
    ) -> Result<()> {
        let payload = json!({
            "message": message,
            "content": base64::engine::general_purpose::STANDARD.encode(content.as_bytes()),
            "sha": previous.sha,
            "branch": target.branch,
        });
        let _: Value = self
            .request_json("update readme", || {
                self.http
                    .put(format!(
                        "{}/contents/{}",
                        self.repo_url(&target.repo),
                        encode_content_path(&target.path)
                    ))
                    .json(&payload)
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RepositoryDispatcher for GithubApiClient {
    async fn dispatch(&self, event_type: &str, client_payload: Value) -> Result<()> {
        let payload = json!({
            "event_type": event_type,
            "client_payload": client_payload,
        });
        self.send_checked("create repository dispatch", || {
            self.http
                .post(format!("{}/dispatches", self.repo_url(&self.repo)))
                .json(&payload)
        })
        .await?;
        Ok(())
    }
}

fn encode_content_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(percent_encode)
        .collect::<Vec<_>>()
        .join("/")
}

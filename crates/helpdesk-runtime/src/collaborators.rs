//! Remote capabilities the lifecycle actions depend on.
//!
//! Production implementations live in [`crate::github_api_client`] and
//! [`crate::twitter_api_client`]; tests substitute in-memory doubles.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use helpdesk_shows::{ShowRecord, ShowState};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
/// `owner/repo` pair addressing a GitHub repository.
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let (owner, name) = trimmed
            .split_once('/')
            .ok_or_else(|| anyhow!("invalid repository '{raw}', expected owner/repo"))?;
        let owner = owner.trim();
        let name = name.trim();
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            bail!("invalid repository '{raw}', expected owner/repo");
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn as_slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueStateFilter {
    Open,
    All,
}

impl IssueStateFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::All => "all",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueFilter {
    pub label: String,
    pub state: IssueStateFilter,
    pub per_page: u32,
}

impl IssueFilter {
    pub fn shows(label: &str, state: IssueStateFilter) -> Self {
        Self {
            label: label.to_string(),
            state,
            per_page: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssuePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ShowState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

impl IssuePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && self.state.is_none() && self.labels.is_none()
    }
}

#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn list_shows(&self, filter: &IssueFilter) -> Result<Vec<ShowRecord>>;

    /// Posts a comment and returns its URL.
    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<String>;

    /// Applies `patch` and returns the issue URL.
    async fn patch_issue(&self, issue_number: u64, patch: &IssuePatch) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A post queued with the social-media provider.
pub struct ScheduledPostRecord {
    pub id: String,
    pub text: String,
    pub scheduled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub url: Option<String>,
}

impl ProfileUpdate {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            url: Some(url.into()),
        }
    }
}

#[async_trait]
pub trait SocialMedia: Send + Sync {
    /// Publishes `text` immediately and returns the post id.
    async fn post_status(&self, text: &str) -> Result<String>;

    async fn list_scheduled_posts(&self) -> Result<Vec<ScheduledPostRecord>>;

    async fn create_scheduled_post(&self, scheduled_at: DateTime<Utc>, text: &str)
        -> Result<String>;

    async fn update_scheduled_post(
        &self,
        id: &str,
        scheduled_at: Option<DateTime<Utc>>,
        text: Option<&str>,
    ) -> Result<()>;

    async fn delete_scheduled_post(&self, id: &str) -> Result<()>;

    async fn update_profile(&self, profile: &ProfileUpdate) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadmeTarget {
    pub repo: RepoRef,
    pub branch: String,
    pub path: String,
}

impl ReadmeTarget {
    pub fn main_readme(repo: RepoRef) -> Self {
        Self {
            repo,
            branch: "main".to_string(),
            path: "README.md".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadmeFile {
    pub sha: String,
    pub content: String,
}

#[async_trait]
pub trait ReadmeRepository: Send + Sync {
    async fn fetch_readme(&self, target: &ReadmeTarget) -> Result<ReadmeFile>;

    async fn update_readme(
        &self,
        target: &ReadmeTarget,
        previous: &ReadmeFile,
        content: &str,
        message: &str,
    ) -> Result<()>;
}

#[async_trait]
pub trait RepositoryDispatcher: Send + Sync {
    async fn dispatch(&self, event_type: &str, client_payload: Value) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::{IssuePatch, RepoRef};

    #[test]
    fn unit_repo_ref_parse_accepts_owner_and_name() {
        let repo = RepoRef::parse(" gr2m/helpdesk ").expect("repo");
        assert_eq!(repo.owner, "gr2m");
        assert_eq!(repo.name, "helpdesk");
        assert_eq!(repo.as_slug(), "gr2m/helpdesk");
    }

    #[test]
    fn regression_repo_ref_parse_rejects_malformed_slugs() {
        for raw in ["helpdesk", "/helpdesk", "gr2m/", "gr2m/helpdesk/extra"] {
            assert!(RepoRef::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn unit_issue_patch_serializes_only_present_fields() {
        let patch = IssuePatch {
            body: Some("updated".to_string()),
            ..IssuePatch::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).expect("serialize"),
            serde_json::json!({ "body": "updated" })
        );
        assert!(IssuePatch::default().is_empty());
    }
}

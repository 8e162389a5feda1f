use std::path::Path;

use anyhow::{Context, Result};
use helpdesk_shows::{ShowRecord, ShowState};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubIssueLabel {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Issue payload as returned by the REST API and embedded in webhook events.
pub struct GithubIssue {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: ShowState,
    pub html_url: String,
    #[serde(default)]
    pub labels: Vec<GithubIssueLabel>,
    #[serde(default)]
    pub pull_request: Option<Value>,
}

impl GithubIssue {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|candidate| candidate.name == label)
    }

    pub fn into_show_record(self) -> ShowRecord {
        ShowRecord {
            number: self.number,
            title: self.title,
            body: self.body.unwrap_or_default(),
            state: self.state,
            html_url: self.html_url,
            labels: self.labels.into_iter().map(|label| label.name).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubRepository {
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// `issues` webhook payload, as written to `GITHUB_EVENT_PATH` by Actions.
pub struct GithubIssueEvent {
    pub action: String,
    pub issue: GithubIssue,
    #[serde(default)]
    pub repository: Option<GithubRepository>,
}

pub fn load_issue_event(path: &Path) -> Result<GithubIssueEvent> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read issue event {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse issue event {}", path.display()))
}

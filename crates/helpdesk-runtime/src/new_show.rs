use helpdesk_shows::{render_show_issue, NewShowForm};
use tracing::info;

use crate::collaborators::{IssuePatch, IssueTracker};
use crate::config::HelpdeskConfig;
use crate::error::ShowLifecycleError;
use crate::github_issue::GithubIssueEvent;

pub fn parse_new_show_form(raw: &str) -> Result<NewShowForm, ShowLifecycleError> {
    serde_json::from_str(raw)
        .map_err(|error| ShowLifecycleError::InvalidEvent(format!("new show form: {error}")))
}

/// Rewrites a freshly opened show issue into the canonical title, body, and label.
pub async fn apply_new_show(
    config: &HelpdeskConfig,
    issues: &dyn IssueTracker,
    event: &GithubIssueEvent,
    form: &NewShowForm,
) -> Result<String, ShowLifecycleError> {
    if let Some(repository) = event.repository.as_ref() {
        if repository.full_name != config.show_repo.as_slug() {
            return Err(ShowLifecycleError::InvalidEvent(format!(
                "event repository {} is not {}",
                repository.full_name,
                config.show_repo.as_slug()
            )));
        }
    }
    let rendered = render_show_issue(form, &config.parser)?;
    let patch = IssuePatch {
        title: Some(rendered.title.clone()),
        body: Some(rendered.body),
        labels: Some(vec![config.show_label.clone()]),
        ..IssuePatch::default()
    };
    let issue_url = issues.patch_issue(event.issue.number, &patch).await?;
    info!(show = event.issue.number, title = %rendered.title, issue_url = %issue_url, "new show issue formatted");
    Ok(issue_url)
}

//! Announce, start, done, and project actions for the show lifecycle.
//!
//! Each action re-reads the open shows, selects the one inside its window,
//! performs its side effects one at a time, and records completion by
//! rewriting checklist markers in the show issue. Nothing is rolled back when
//! a later step fails.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use helpdesk_shows::checklist::{
    TODO_ANNOUNCEMENT_ISSUE_COMMENT, TODO_ANNOUNCEMENT_TWEET, TODO_PROFILE_RESET,
    TODO_PROFILE_SHOW_MODE, TODO_START_ISSUE_COMMENT, TODO_START_TWEET,
};
use helpdesk_shows::{
    find_show_in_window, mark_checklist_items_done, project_scheduler_triggers,
    ChecklistCompletion, LifecycleStage, ScheduleProjection, ShowRecord, ShowState,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::collaborators::{IssueFilter, IssuePatch, IssueStateFilter, IssueTracker, SocialMedia};
use crate::config::HelpdeskConfig;
use crate::error::ShowLifecycleError;
use crate::github_issue::GithubIssueEvent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleReport {
    pub stage: &'static str,
    pub show_number: u64,
    pub show_url: String,
    pub comment_url: String,
    pub post_url: Option<String>,
    pub completed_markers: Vec<String>,
    pub closed: bool,
}

impl LifecycleReport {
    pub fn summary_line(&self) -> String {
        format!(
            "helpdesk lifecycle: stage={} show={} comment_url={} post_url={} completed_markers={} closed={}",
            self.stage,
            self.show_number,
            self.comment_url,
            self.post_url.as_deref().unwrap_or("none"),
            if self.completed_markers.is_empty() {
                "none".to_string()
            } else {
                self.completed_markers.join(",")
            },
            self.closed
        )
    }
}

#[derive(Clone)]
pub struct ShowLifecycleRuntime {
    pub(crate) config: HelpdeskConfig,
    pub(crate) issues: Arc<dyn IssueTracker>,
    pub(crate) social: Arc<dyn SocialMedia>,
}

impl ShowLifecycleRuntime {
    pub fn new(
        config: HelpdeskConfig,
        issues: Arc<dyn IssueTracker>,
        social: Arc<dyn SocialMedia>,
    ) -> Self {
        Self {
            config,
            issues,
            social,
        }
    }

    pub fn config(&self) -> &HelpdeskConfig {
        &self.config
    }

    pub(crate) async fn open_shows(&self) -> Result<Vec<ShowRecord>, ShowLifecycleError> {
        let filter = IssueFilter::shows(&self.config.show_label, IssueStateFilter::Open);
        let shows = self.issues.list_shows(&filter).await?;
        debug!(count = shows.len(), "loaded open shows");
        Ok(shows)
    }

    async fn select_show(
        &self,
        stage: LifecycleStage,
        now: DateTime<Utc>,
    ) -> Result<ShowRecord, ShowLifecycleError> {
        let shows = self.open_shows().await?;
        let selected = find_show_in_window(
            &shows,
            &self.config.parser,
            &self.config.windows,
            stage,
            now,
        )?;
        match selected {
            Some((show, parsed)) => {
                info!(
                    stage = stage.as_str(),
                    show = show.number,
                    show_at = %parsed.resolved_instant,
                    "selected show"
                );
                Ok(show.clone())
            }
            None => Err(ShowLifecycleError::NoMatchingShow {
                stage: stage.as_str(),
            }),
        }
    }

    /// Comments on the show, posts the announcement, and records both URLs.
    pub async fn announce(&self, now: DateTime<Utc>) -> Result<LifecycleReport, ShowLifecycleError> {
        let show = self.select_show(LifecycleStage::Announcement, now).await?;
        let templates = &self.config.templates;

        let comment_url = self
            .issues
            .create_comment(show.number, &templates.announcement_comment())
            .await?;
        info!(show = show.number, comment_url = %comment_url, "announcement comment created");

        let title = show.parsed_title().title;
        let post_id = self
            .social
            .post_status(&templates.announcement_post(&title, &show.html_url))
            .await?;
        let post_url = templates.post_url(&post_id);
        info!(show = show.number, post_url = %post_url, "announcement post published");

        let completed = self
            .complete_markers(
                &show,
                &[
                    ChecklistCompletion::new(TODO_ANNOUNCEMENT_TWEET, post_url.clone()),
                    ChecklistCompletion::new(TODO_ANNOUNCEMENT_ISSUE_COMMENT, comment_url.clone()),
                ],
                false,
            )
            .await?;

        Ok(LifecycleReport {
            stage: LifecycleStage::Announcement.as_str(),
            show_number: show.number,
            show_url: show.html_url,
            comment_url,
            post_url: Some(post_url),
            completed_markers: completed,
            closed: false,
        })
    }

    /// Comments, posts the live update, switches the profile to live mode.
    pub async fn start(&self, now: DateTime<Utc>) -> Result<LifecycleReport, ShowLifecycleError> {
        let show = self.select_show(LifecycleStage::Start, now).await?;
        let templates = &self.config.templates;

        let comment_url = self
            .issues
            .create_comment(show.number, &templates.live_comment())
            .await?;
        info!(show = show.number, comment_url = %comment_url, "live comment created");

        let title = show.parsed_title().title;
        let post_id = self
            .social
            .post_status(&templates.live_post(&title, &show.html_url))
            .await?;
        let post_url = templates.post_url(&post_id);
        info!(show = show.number, post_url = %post_url, "live post published");

        self.social.update_profile(&self.config.live_profile).await?;
        info!(show = show.number, "profile switched to live mode");

        let completed = self
            .complete_markers(
                &show,
                &[
                    ChecklistCompletion::new(TODO_START_TWEET, post_url.clone()),
                    ChecklistCompletion::new(TODO_START_ISSUE_COMMENT, comment_url.clone()),
                    ChecklistCompletion::new(TODO_PROFILE_SHOW_MODE, templates.profile_url()),
                ],
                false,
            )
            .await?;

        Ok(LifecycleReport {
            stage: LifecycleStage::Start.as_str(),
            show_number: show.number,
            show_url: show.html_url,
            comment_url,
            post_url: Some(post_url),
            completed_markers: completed,
            closed: false,
        })
    }

    /// Wraps up the show inside the done window.
    pub async fn done(&self, now: DateTime<Utc>) -> Result<LifecycleReport, ShowLifecycleError> {
        let show = self.select_show(LifecycleStage::Done, now).await?;
        self.finish_show(show).await
    }

    /// Wraps up the show named by an inbound `issues.closed` event.
    pub async fn done_for_event(
        &self,
        event: GithubIssueEvent,
    ) -> Result<LifecycleReport, ShowLifecycleError> {
        if event.action != "closed" {
            return Err(ShowLifecycleError::InvalidEvent(format!(
                "expected an issues.closed event, got action '{}'",
                event.action
            )));
        }
        if let Some(repository) = event.repository.as_ref() {
            if repository.full_name != self.config.show_repo.as_slug() {
                return Err(ShowLifecycleError::InvalidEvent(format!(
                    "event repository {} is not {}",
                    repository.full_name,
                    self.config.show_repo.as_slug()
                )));
            }
        }
        if !event.issue.has_label(&self.config.show_label) {
            return Err(ShowLifecycleError::InvalidEvent(format!(
                "issue #{} is not labeled '{}'",
                event.issue.number, self.config.show_label
            )));
        }
        self.finish_show(event.issue.into_show_record()).await
    }

    async fn finish_show(&self, show: ShowRecord) -> Result<LifecycleReport, ShowLifecycleError> {
        let templates = &self.config.templates;
        let comment_url = self
            .issues
            .create_comment(show.number, &templates.done_comment())
            .await?;
        info!(show = show.number, comment_url = %comment_url, "done comment created");

        self.social
            .update_profile(&self.config.default_profile)
            .await?;
        info!(show = show.number, "profile reverted to default");

        let completed = self
            .complete_markers(
                &show,
                &[ChecklistCompletion::new(
                    TODO_PROFILE_RESET,
                    templates.profile_url(),
                )],
                true,
            )
            .await?;

        Ok(LifecycleReport {
            stage: LifecycleStage::Done.as_str(),
            show_number: show.number,
            show_url: show.html_url,
            comment_url,
            post_url: None,
            completed_markers: completed,
            closed: true,
        })
    }

    async fn complete_markers(
        &self,
        show: &ShowRecord,
        completions: &[ChecklistCompletion],
        close: bool,
    ) -> Result<Vec<String>, ShowLifecycleError> {
        let rewrite = mark_checklist_items_done(&show.body, completions);
        for tag in &rewrite.unmatched {
            warn!(show = show.number, tag = %tag, "no open checklist marker to complete");
        }
        let patch = IssuePatch {
            body: rewrite.changed().then(|| rewrite.body.clone()),
            state: (close && show.state != ShowState::Closed).then_some(ShowState::Closed),
            ..IssuePatch::default()
        };
        if patch.is_empty() {
            debug!(show = show.number, "issue already up to date");
            return Ok(rewrite.completed);
        }
        let issue_url = self.issues.patch_issue(show.number, &patch).await?;
        info!(
            show = show.number,
            issue_url = %issue_url,
            completed = rewrite.completed.len(),
            closed = patch.state.is_some(),
            "show issue updated"
        );
        Ok(rewrite.completed)
    }

    /// Scheduler triggers for every open future show. Read-only.
    pub async fn project(&self, now: DateTime<Utc>) -> Result<ScheduleProjection, ShowLifecycleError> {
        project_schedule(&self.config, self.issues.as_ref(), now).await
    }
}

/// Projection that needs only the issue tracker, for callers without social credentials.
pub async fn project_schedule(
    config: &HelpdeskConfig,
    issues: &dyn IssueTracker,
    now: DateTime<Utc>,
) -> Result<ScheduleProjection, ShowLifecycleError> {
    let filter = IssueFilter::shows(&config.show_label, IssueStateFilter::Open);
    let shows = issues.list_shows(&filter).await?;
    let projection = project_scheduler_triggers(
        &shows,
        &config.parser,
        &config.windows,
        config.trigger_lead,
        now,
    )?;
    info!(
        shows = projection.start.len(),
        "projected scheduler triggers"
    );
    Ok(projection)
}

use chrono::{DateTime, Utc};
use helpdesk_shows::{
    classify_scheduled_post, reconcile_scheduled_posts, DesiredPost, ScheduleEffect,
    ScheduledPostKind, ShowRecord, ShowScheduleError,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::HelpdeskConfig;
use crate::error::ShowLifecycleError;
use crate::show_lifecycle::ShowLifecycleRuntime;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub desired: usize,
    pub observed: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl ReconcileReport {
    pub fn summary_line(&self) -> String {
        format!(
            "helpdesk scheduled posts: desired={} observed={} created={} updated={} deleted={}",
            self.desired, self.observed, self.created, self.updated, self.deleted
        )
    }
}

/// Desired scheduled posts for every open show still ahead of `now`.
///
/// Announcements are always scheduled; live-now posts only when enabled.
pub fn desired_posts_for(
    shows: &[ShowRecord],
    config: &HelpdeskConfig,
    now: DateTime<Utc>,
) -> Result<Vec<DesiredPost>, ShowScheduleError> {
    let mut desired = Vec::new();
    for show in shows.iter().filter(|show| show.is_open()) {
        let parsed = config
            .parser
            .parse(&show.body)
            .map_err(|source| ShowScheduleError {
                issue_number: show.number,
                source,
            })?;
        let show_at = parsed.resolved_instant;
        if show_at <= now {
            debug!(show = show.number, "skipping past show");
            continue;
        }
        let title = show.parsed_title().title;
        desired.push(DesiredPost {
            show_number: show.number,
            kind: ScheduledPostKind::Announcement,
            target_instant: config.windows.announcement_instant(show_at),
            text: config
                .templates
                .announcement_post(&title, &show.html_url),
        });
        if config.schedule_live_now_posts {
            desired.push(DesiredPost {
                show_number: show.number,
                kind: ScheduledPostKind::LiveNow,
                target_instant: show_at,
                text: config.templates.live_post(&title, &show.html_url),
            });
        }
    }
    Ok(desired)
}

impl ShowLifecycleRuntime {
    /// Converges the provider's scheduled posts onto the open future shows.
    pub async fn reconcile_scheduled_posts(
        &self,
        now: DateTime<Utc>,
    ) -> Result<ReconcileReport, ShowLifecycleError> {
        let shows = self.open_shows().await?;
        let desired = desired_posts_for(&shows, &self.config, now)?;

        let repo_slug = self.config.show_repo.as_slug();
        let observed = self
            .social
            .list_scheduled_posts()
            .await?
            .into_iter()
            .filter_map(|post| {
                classify_scheduled_post(
                    &post.id,
                    &post.text,
                    post.scheduled_at,
                    post.completed_at.is_some(),
                    &repo_slug,
                )
            })
            .collect::<Vec<_>>();

        let mut report = ReconcileReport {
            desired: desired.len(),
            observed: observed.len(),
            ..ReconcileReport::default()
        };
        for effect in reconcile_scheduled_posts(&desired, &observed) {
            match effect {
                ScheduleEffect::Create(post) => {
                    let id = self
                        .social
                        .create_scheduled_post(post.target_instant, &post.text)
                        .await?;
                    info!(
                        show = post.show_number,
                        kind = post.kind.as_str(),
                        id = %id,
                        scheduled_at = %post.target_instant,
                        "scheduled post created"
                    );
                    report.created += 1;
                }
                ScheduleEffect::Update {
                    id,
                    show_number,
                    scheduled_at,
                    text,
                } => {
                    self.social
                        .update_scheduled_post(&id, Some(scheduled_at), Some(&text))
                        .await?;
                    info!(show = show_number, id = %id, scheduled_at = %scheduled_at, "scheduled post updated");
                    report.updated += 1;
                }
                ScheduleEffect::Delete { id, show_number } => {
                    self.social.delete_scheduled_post(&id).await?;
                    info!(show = show_number, id = %id, "scheduled post deleted");
                    report.deleted += 1;
                }
            }
        }
        Ok(report)
    }

    /// Deletes every scheduled post on the account, related to a show or not.
    pub async fn purge_scheduled_posts(&self) -> Result<usize, ShowLifecycleError> {
        let posts = self.social.list_scheduled_posts().await?;
        let mut deleted = 0_usize;
        for post in posts {
            self.social.delete_scheduled_post(&post.id).await?;
            info!(id = %post.id, "scheduled post deleted");
            deleted += 1;
        }
        Ok(deleted)
    }
}

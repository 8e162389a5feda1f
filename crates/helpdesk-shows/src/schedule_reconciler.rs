//! Desired-versus-observed reconciliation of scheduled social posts.
//!
//! Posts are keyed on `(show_number, kind)`. Remote posts carry no structured
//! link to their show; the link is recovered from the show URL on the last
//! line of the post text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Substring that identifies announcement posts among scheduled posts. The
/// announcement template embeds it, and it names the default announcement lead.
pub const ANNOUNCEMENT_POST_MARKER: &str = "Starting in 30 minutes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduledPostKind {
    Announcement,
    LiveNow,
}

impl ScheduledPostKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Announcement => "announcement",
            Self::LiveNow => "live_now",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredPost {
    pub show_number: u64,
    pub kind: ScheduledPostKind,
    pub target_instant: DateTime<Utc>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedPost {
    pub id: String,
    pub show_number: u64,
    pub kind: ScheduledPostKind,
    pub scheduled_at: DateTime<Utc>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum ScheduleEffect {
    Create(DesiredPost),
    Update {
        id: String,
        show_number: u64,
        scheduled_at: DateTime<Utc>,
        text: String,
    },
    Delete {
        id: String,
        show_number: u64,
    },
}

impl ScheduleEffect {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }
}

/// Links a remote scheduled post back to its show, or returns `None` when the
/// post is completed or does not end with an issue URL of `repo_slug`.
pub fn classify_scheduled_post(
    id: &str,
    text: &str,
    scheduled_at: DateTime<Utc>,
    completed: bool,
    repo_slug: &str,
) -> Option<ObservedPost> {
    if completed {
        return None;
    }
    let last_line = text.trim().lines().last()?.trim();
    let show_number = show_number_from_url(last_line, repo_slug)?;
    let kind = if text.contains(ANNOUNCEMENT_POST_MARKER) {
        ScheduledPostKind::Announcement
    } else {
        ScheduledPostKind::LiveNow
    };
    Some(ObservedPost {
        id: id.to_string(),
        show_number,
        kind,
        scheduled_at,
        text: text.to_string(),
    })
}

fn show_number_from_url(line: &str, repo_slug: &str) -> Option<u64> {
    let needle = format!("{}/issues/", repo_slug.trim_matches('/'));
    let start = line.find(&needle)? + needle.len();
    let digits = line[start..].trim_end_matches('/');
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Computes the effects that converge `observed` onto `desired`.
///
/// Creates and updates follow desired order; deletes follow observed order.
/// Instants and texts are compared exactly.
pub fn reconcile_scheduled_posts(
    desired: &[DesiredPost],
    observed: &[ObservedPost],
) -> Vec<ScheduleEffect> {
    let mut matched = vec![false; observed.len()];
    let mut effects = Vec::new();

    for post in desired {
        let existing = observed.iter().enumerate().find(|(index, candidate)| {
            !matched[*index]
                && candidate.show_number == post.show_number
                && candidate.kind == post.kind
        });
        match existing {
            Some((index, candidate)) => {
                matched[index] = true;
                if candidate.scheduled_at != post.target_instant || candidate.text != post.text {
                    effects.push(ScheduleEffect::Update {
                        id: candidate.id.clone(),
                        show_number: post.show_number,
                        scheduled_at: post.target_instant,
                        text: post.text.clone(),
                    });
                }
            }
            None => effects.push(ScheduleEffect::Create(post.clone())),
        }
    }

    for (index, candidate) in observed.iter().enumerate() {
        if !matched[index] {
            effects.push(ScheduleEffect::Delete {
                id: candidate.id.clone(),
                show_number: candidate.show_number,
            });
        }
    }
    effects
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::{
        classify_scheduled_post, reconcile_scheduled_posts, DesiredPost, ObservedPost,
        ScheduleEffect, ScheduledPostKind, ANNOUNCEMENT_POST_MARKER,
    };
    use crate::trigger_window::DEFAULT_ANNOUNCEMENT_LEAD_MINUTES;

    const ANNOUNCEMENT_TEXT: &str = "📯  Starting in 30 minutes\n\n💁🏻‍♂️  Creating tests\n🔴  Watch live at https://twitch.tv/gregorcodes\n\nhttps://github.com/gr2m/helpdesk/issues/49";

    fn t1() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 8, 26, 16, 30, 0).unwrap()
    }

    fn desired(show_number: u64, at: DateTime<Utc>, text: &str) -> DesiredPost {
        DesiredPost {
            show_number,
            kind: ScheduledPostKind::Announcement,
            target_instant: at,
            text: text.to_string(),
        }
    }

    fn observed(id: &str, show_number: u64, at: DateTime<Utc>, text: &str) -> ObservedPost {
        ObservedPost {
            id: id.to_string(),
            show_number,
            kind: ScheduledPostKind::Announcement,
            scheduled_at: at,
            text: text.to_string(),
        }
    }

    #[test]
    fn unit_reconcile_emits_nothing_when_converged() {
        let effects = reconcile_scheduled_posts(
            &[desired(49, t1(), ANNOUNCEMENT_TEXT)],
            &[observed("x", 49, t1(), ANNOUNCEMENT_TEXT)],
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn unit_reconcile_updates_moved_post() {
        let t0 = t1() - Duration::hours(1);
        let effects = reconcile_scheduled_posts(
            &[desired(49, t1(), ANNOUNCEMENT_TEXT)],
            &[observed("x", 49, t0, ANNOUNCEMENT_TEXT)],
        );
        assert_eq!(
            effects,
            vec![ScheduleEffect::Update {
                id: "x".to_string(),
                show_number: 49,
                scheduled_at: t1(),
                text: ANNOUNCEMENT_TEXT.to_string(),
            }]
        );
    }

    #[test]
    fn unit_reconcile_updates_when_only_text_differs() {
        let effects = reconcile_scheduled_posts(
            &[desired(49, t1(), ANNOUNCEMENT_TEXT)],
            &[observed("x", 49, t1(), "old text")],
        );
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].name(), "update");
    }

    #[test]
    fn unit_reconcile_deletes_orphaned_post() {
        let effects =
            reconcile_scheduled_posts(&[], &[observed("y", 12, t1(), ANNOUNCEMENT_TEXT)]);
        assert_eq!(
            effects,
            vec![ScheduleEffect::Delete {
                id: "y".to_string(),
                show_number: 12,
            }]
        );
    }

    #[test]
    fn functional_reconcile_orders_creates_before_deletes_and_matches_on_kind() {
        let live_now = DesiredPost {
            show_number: 49,
            kind: ScheduledPostKind::LiveNow,
            target_instant: t1() + Duration::minutes(30),
            text: "🔴  Now live".to_string(),
        };
        let effects = reconcile_scheduled_posts(
            &[desired(50, t1(), ANNOUNCEMENT_TEXT), live_now.clone()],
            &[
                observed("a", 49, t1(), ANNOUNCEMENT_TEXT),
                observed("b", 50, t1(), ANNOUNCEMENT_TEXT),
                observed("c", 50, t1(), ANNOUNCEMENT_TEXT),
            ],
        );
        let names = effects.iter().map(ScheduleEffect::name).collect::<Vec<_>>();
        assert_eq!(names, vec!["create", "delete", "delete"]);
        assert_eq!(effects[0], ScheduleEffect::Create(live_now));
        assert_eq!(
            effects[1],
            ScheduleEffect::Delete {
                id: "a".to_string(),
                show_number: 49
            }
        );
        assert_eq!(
            effects[2],
            ScheduleEffect::Delete {
                id: "c".to_string(),
                show_number: 50
            }
        );
    }

    #[test]
    fn unit_classify_links_post_to_show_by_trailing_url() {
        let post = classify_scheduled_post("1", ANNOUNCEMENT_TEXT, t1(), false, "gr2m/helpdesk")
            .expect("related post");
        assert_eq!(post.show_number, 49);
        assert_eq!(post.kind, ScheduledPostKind::Announcement);

        let live = classify_scheduled_post(
            "2",
            "🔴  Now live at https://twitch.tv/gregorcodes\n\nhttps://github.com/gr2m/helpdesk/issues/50\n",
            t1(),
            false,
            "gr2m/helpdesk",
        )
        .expect("related post");
        assert_eq!(live.show_number, 50);
        assert_eq!(live.kind, ScheduledPostKind::LiveNow);
    }

    #[test]
    fn regression_classify_ignores_unrelated_and_completed_posts() {
        assert!(classify_scheduled_post("1", "just a tweet", t1(), false, "gr2m/helpdesk").is_none());
        assert!(classify_scheduled_post(
            "2",
            "Starting in 30 minutes\nhttps://github.com/other/repo/issues/3",
            t1(),
            false,
            "gr2m/helpdesk"
        )
        .is_none());
        assert!(classify_scheduled_post("3", ANNOUNCEMENT_TEXT, t1(), true, "gr2m/helpdesk").is_none());
    }

    #[test]
    fn regression_announcement_marker_names_the_default_lead() {
        assert_eq!(
            ANNOUNCEMENT_POST_MARKER,
            format!("Starting in {DEFAULT_ANNOUNCEMENT_LEAD_MINUTES} minutes")
        );
    }
}

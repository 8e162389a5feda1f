use chrono::Duration;
use helpdesk_shows::readme_section::DEFAULT_README_SECTION;
use helpdesk_shows::scheduler_export::DEFAULT_TRIGGER_LEAD_MINUTES;
use helpdesk_shows::{ShowTimeParser, TriggerWindowPolicy, ANNOUNCEMENT_POST_MARKER};

use crate::collaborators::{ProfileUpdate, ReadmeTarget, RepoRef};

pub const DEFAULT_SHOW_REPO: &str = "gr2m/helpdesk";
pub const DEFAULT_SHOW_LABEL: &str = "show";
pub const DEFAULT_STREAM_URL: &str = "https://twitch.tv/gregorcodes";
pub const DEFAULT_SOCIAL_HANDLE: &str = "gr2m";
pub const README_COMMIT_MESSAGE: &str = "docs(README): update helpdesk shows";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Rendered texts for comments and social posts.
pub struct ShowTemplates {
    pub stream_url: String,
    pub social_handle: String,
}

impl Default for ShowTemplates {
    fn default() -> Self {
        Self {
            stream_url: DEFAULT_STREAM_URL.to_string(),
            social_handle: DEFAULT_SOCIAL_HANDLE.to_string(),
        }
    }
}

impl ShowTemplates {
    /// Carries [`ANNOUNCEMENT_POST_MARKER`] so scheduled copies classify as announcements.
    pub fn announcement_post(&self, title: &str, show_url: &str) -> String {
        format!(
            "📯  {ANNOUNCEMENT_POST_MARKER}\n\n💁🏻‍♂️  {title}\n🔴  Watch live at {}\n\n{show_url}",
            self.stream_url
        )
    }

    pub fn live_post(&self, title: &str, show_url: &str) -> String {
        format!(
            "🔴  Now live at {}\n\n💁🏻‍♂️  {title}\n\n{show_url}",
            self.stream_url
        )
    }

    pub fn announcement_comment(&self) -> String {
        format!("Going live in 30 minutes at {}", self.stream_url)
    }

    pub fn live_comment(&self) -> String {
        format!("I'm now live on {}", self.stream_url)
    }

    pub fn done_comment(&self) -> String {
        "Show is done for today, thank you all! Recording is coming up in a moment".to_string()
    }

    pub fn post_url(&self, post_id: &str) -> String {
        format!("https://twitter.com/{}/status/{post_id}", self.social_handle)
    }

    pub fn profile_url(&self) -> String {
        format!("https://twitter.com/{}", self.social_handle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Everything the lifecycle actions need, assembled once by the entry point.
pub struct HelpdeskConfig {
    pub show_repo: RepoRef,
    pub show_label: String,
    pub parser: ShowTimeParser,
    pub windows: TriggerWindowPolicy,
    /// How far ahead of each window the exported scheduler triggers fire.
    pub trigger_lead: Duration,
    pub templates: ShowTemplates,
    pub live_profile: ProfileUpdate,
    pub default_profile: ProfileUpdate,
    pub schedule_live_now_posts: bool,
    pub readme_targets: Vec<ReadmeTarget>,
    pub readme_section: String,
}

impl HelpdeskConfig {
    pub fn new(show_repo: RepoRef) -> Self {
        // `<owner>/<owner>` is the owner's profile README repository.
        let profile_repo = RepoRef {
            owner: show_repo.owner.clone(),
            name: show_repo.owner.clone(),
        };
        Self {
            readme_targets: vec![
                ReadmeTarget::main_readme(show_repo.clone()),
                ReadmeTarget::main_readme(profile_repo),
            ],
            show_repo,
            show_label: DEFAULT_SHOW_LABEL.to_string(),
            parser: ShowTimeParser::default(),
            windows: TriggerWindowPolicy::default(),
            trigger_lead: Duration::minutes(DEFAULT_TRIGGER_LEAD_MINUTES),
            templates: ShowTemplates::default(),
            live_profile: ProfileUpdate::new(
                "🔴 Gregor is now live on twitch.tv/gregorcodes",
                DEFAULT_STREAM_URL,
            ),
            default_profile: ProfileUpdate::new("Gregor", "https://github.com/gr2m/"),
            schedule_live_now_posts: false,
            readme_section: DEFAULT_README_SECTION.to_string(),
        }
    }
}

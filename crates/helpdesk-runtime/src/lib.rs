//! Runtime for the helpdesk show automation.
//!
//! Wires the pure show model from `helpdesk-shows` to the issue tracker and
//! social-media collaborators, and provides the GitHub and Twitter clients
//! used in production.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod github_api_client;
pub mod github_issue;
pub mod github_output;
mod http_helpers;
pub mod new_show;
pub mod oauth1;
pub mod readme_sync;
pub mod scheduled_posts;
pub mod show_lifecycle;
pub mod twitter_api_client;

pub use collaborators::{
    IssueFilter, IssuePatch, IssueStateFilter, IssueTracker, ProfileUpdate, ReadmeFile,
    ReadmeRepository, ReadmeTarget, RepoRef, RepositoryDispatcher, ScheduledPostRecord,
    SocialMedia,
};
pub use config::{HelpdeskConfig, ShowTemplates};
pub use error::ShowLifecycleError;
pub use github_api_client::{GithubApiClient, DEFAULT_GITHUB_API_BASE};
pub use github_issue::{load_issue_event, GithubIssue, GithubIssueEvent};
pub use github_output::append_github_outputs;
pub use http_helpers::DEFAULT_REQUEST_TIMEOUT_MS;
pub use new_show::{apply_new_show, parse_new_show_form};
pub use oauth1::OAuth1Credentials;
pub use readme_sync::{sync_readmes, ReadmeSyncReport};
pub use scheduled_posts::{desired_posts_for, ReconcileReport};
pub use show_lifecycle::{project_schedule, LifecycleReport, ShowLifecycleRuntime};
pub use twitter_api_client::{
    TwitterApiClient, TwitterApiConfig, DEFAULT_TWITTER_ADS_API_BASE, DEFAULT_TWITTER_API_BASE,
};

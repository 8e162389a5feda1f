use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use helpdesk_runtime::config::DEFAULT_SHOW_REPO;
use helpdesk_runtime::{
    DEFAULT_GITHUB_API_BASE, DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_TWITTER_ADS_API_BASE,
    DEFAULT_TWITTER_API_BASE,
};
use helpdesk_shows::show_time::DEFAULT_LOW_HOUR_THRESHOLD;
use helpdesk_webhook::DEFAULT_MAX_SKEW_SECONDS;

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_hour(value: &str) -> Result<u32, String> {
    let parsed = value
        .parse::<u32>()
        .map_err(|error| format!("failed to parse hour: {error}"))?;
    if parsed > 12 {
        return Err("value must be in range 0..=12".to_string());
    }
    Ok(parsed)
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|error| format!("failed to parse RFC 3339 instant: {error}"))
}

#[derive(Debug, Parser)]
#[command(
    name = "helpdesk",
    about = "Automation for the helpdesk livestream show lifecycle",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: HelpdeskCommand,
}

#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    #[arg(
        long,
        env = "HELPDESK_SHOW_REPO",
        default_value = DEFAULT_SHOW_REPO,
        global = true,
        help = "Repository holding the show issues, as owner/repo"
    )]
    pub repo: String,

    #[arg(
        long,
        env = "GITHUB_API_URL",
        default_value = DEFAULT_GITHUB_API_BASE,
        global = true
    )]
    pub github_api_base: String,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub github_token: Option<String>,

    #[arg(
        long,
        env = "HELPDESK_REQUEST_TIMEOUT_MS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        global = true
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long,
        default_value_t = DEFAULT_LOW_HOUR_THRESHOLD,
        value_parser = parse_hour,
        global = true,
        help = "Parsed show hours below this value are moved to the afternoon"
    )]
    pub low_hour_threshold: u32,

    #[arg(
        long,
        default_value_t = 4,
        value_parser = parse_positive_u64,
        global = true,
        help = "Hours after show start during which `done` still applies"
    )]
    pub show_duration_hours: u64,

    #[arg(
        long,
        value_parser = parse_instant,
        global = true,
        help = "Evaluate windows at this RFC 3339 instant instead of the current time"
    )]
    pub now: Option<DateTime<Utc>>,

    #[command(flatten)]
    pub twitter: TwitterArgs,
}

#[derive(Debug, Clone, Args)]
pub struct TwitterArgs {
    #[arg(long, env = "TWITTER_API_URL", default_value = DEFAULT_TWITTER_API_BASE, global = true)]
    pub twitter_api_base: String,

    #[arg(
        long,
        env = "TWITTER_ADS_API_URL",
        default_value = DEFAULT_TWITTER_ADS_API_BASE,
        global = true
    )]
    pub twitter_ads_api_base: String,

    #[arg(long, env = "TWITTER_CONSUMER_KEY", hide_env_values = true, global = true)]
    pub twitter_consumer_key: Option<String>,

    #[arg(long, env = "TWITTER_CONSUMER_SECRET", hide_env_values = true, global = true)]
    pub twitter_consumer_secret: Option<String>,

    #[arg(long, env = "TWITTER_ACCESS_TOKEN_KEY", hide_env_values = true, global = true)]
    pub twitter_access_token_key: Option<String>,

    #[arg(
        long,
        env = "TWITTER_ACCESS_TOKEN_SECRET",
        hide_env_values = true,
        global = true
    )]
    pub twitter_access_token_secret: Option<String>,

    #[arg(long, env = "TWITTER_ACCOUNT_ID", global = true)]
    pub twitter_account_id: Option<String>,

    #[arg(long, env = "TWITTER_USER_ID", global = true)]
    pub twitter_user_id: Option<String>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum HelpdeskCommand {
    /// Comment and post the 30 minute announcement for the upcoming show.
    Announce,
    /// Comment, post, and switch the profile for the show starting now.
    Start,
    /// Wrap up the running show, or the show closed by an issue event.
    Done {
        #[arg(long, env = "GITHUB_EVENT_PATH")]
        event_path: Option<PathBuf>,

        #[arg(
            long,
            help = "Select the show by time window even when an event payload is present"
        )]
        ignore_event: bool,
    },
    /// Print the scheduler triggers for all future shows.
    Project {
        #[arg(long, env = "GITHUB_OUTPUT")]
        github_output: Option<PathBuf>,
    },
    /// Converge scheduled social posts onto the open future shows.
    ReconcileScheduledPosts {
        #[arg(long, help = "Also schedule the live-now post at show time")]
        live_now_posts: bool,
    },
    /// Delete every scheduled social post on the account.
    PurgeScheduledPosts,
    /// Rewrite the shows section of the configured READMEs.
    SyncReadme,
    /// Format a newly opened show issue from its parsed form fields.
    NewShow {
        #[arg(long, env = "PARSED_ISSUE_JSON")]
        parsed_issue_json: String,

        #[arg(long, env = "GITHUB_EVENT_PATH")]
        event_path: PathBuf,
    },
    /// Serve the stream-platform webhook endpoint.
    ServeWebhook {
        #[arg(long, env = "HELPDESK_WEBHOOK_BIND", default_value = "127.0.0.1:8888")]
        bind: String,

        #[arg(long, env = "TWITCH_EVENTSUB_SECRET", hide_env_values = true)]
        twitch_eventsub_secret: String,

        #[arg(long, env = "TWITCH_BROADCASTER_USER_ID")]
        twitch_broadcaster_user_id: String,

        #[arg(
            long,
            default_value_t = DEFAULT_MAX_SKEW_SECONDS,
            help = "Maximum message timestamp age in seconds; 0 disables the check"
        )]
        max_skew_seconds: u64,
    },
}

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Duration, Utc};
use helpdesk_runtime::{
    append_github_outputs, apply_new_show, load_issue_event, parse_new_show_form,
    project_schedule, sync_readmes, GithubApiClient, GithubIssueEvent, HelpdeskConfig,
    OAuth1Credentials, RepoRef, ShowLifecycleRuntime, TwitterApiClient, TwitterApiConfig,
};
use helpdesk_shows::ScheduleProjection;
use helpdesk_webhook::{run_webhook_server, StreamWebhookConfig, WebhookServerState};
use serde_json::Value;
use tracing::debug;

use crate::cli_args::{Cli, CommonArgs, HelpdeskCommand, TwitterArgs};

const OUTPUT_SCHEDULE_START: &str = "schedule_start";
const OUTPUT_SCHEDULE_ANNOUNCEMENT: &str = "schedule_announcement";

pub(crate) async fn run_cli(cli: Cli) -> Result<()> {
    for line in run_command(&cli).await? {
        println!("{line}");
    }
    Ok(())
}

/// Runs one subcommand and returns the lines to print on success.
pub(crate) async fn run_command(cli: &Cli) -> Result<Vec<String>> {
    let common = &cli.common;
    let mut config = build_helpdesk_config(common)?;
    let now = common.now.unwrap_or_else(Utc::now);

    match &cli.command {
        HelpdeskCommand::Announce => {
            let report = lifecycle_runtime(common, config)?.announce(now).await?;
            Ok(vec![report.summary_line()])
        }
        HelpdeskCommand::Start => {
            let report = lifecycle_runtime(common, config)?.start(now).await?;
            Ok(vec![report.summary_line()])
        }
        HelpdeskCommand::Done {
            event_path,
            ignore_event,
        } => {
            let event = match event_path.as_deref() {
                Some(path) if !ignore_event => load_closed_issue_event(path)?,
                _ => None,
            };
            let runtime = lifecycle_runtime(common, config)?;
            let report = match event {
                Some(event) => runtime.done_for_event(event).await?,
                None => runtime.done(now).await?,
            };
            Ok(vec![report.summary_line()])
        }
        HelpdeskCommand::Project { github_output } => {
            let github = github_client(common, &config)?;
            let projection = project_schedule(&config, &github, now).await?;
            if let Some(path) = github_output.as_deref() {
                let start = projection.start_lines();
                let announcement = projection.announcement_lines();
                append_github_outputs(
                    path,
                    &[
                        (OUTPUT_SCHEDULE_START, start.as_str()),
                        (OUTPUT_SCHEDULE_ANNOUNCEMENT, announcement.as_str()),
                    ],
                )?;
            }
            Ok(render_projection(&projection))
        }
        HelpdeskCommand::ReconcileScheduledPosts { live_now_posts } => {
            config.schedule_live_now_posts = *live_now_posts;
            let report = lifecycle_runtime(common, config)?
                .reconcile_scheduled_posts(now)
                .await?;
            Ok(vec![report.summary_line()])
        }
        HelpdeskCommand::PurgeScheduledPosts => {
            let deleted = lifecycle_runtime(common, config)?
                .purge_scheduled_posts()
                .await?;
            Ok(vec![format!("helpdesk scheduled posts purged: deleted={deleted}")])
        }
        HelpdeskCommand::SyncReadme => {
            let github = github_client(common, &config)?;
            let report = sync_readmes(&config, &github, &github).await?;
            Ok(vec![report.summary_line()])
        }
        HelpdeskCommand::NewShow {
            parsed_issue_json,
            event_path,
        } => {
            let form = parse_new_show_form(parsed_issue_json)?;
            let event = load_issue_event(event_path)?;
            let github = github_client(common, &config)?;
            let issue_url = apply_new_show(&config, &github, &event, &form).await?;
            Ok(vec![format!(
                "helpdesk new show: show={} issue_url={issue_url}",
                event.issue.number
            )])
        }
        HelpdeskCommand::ServeWebhook {
            bind,
            twitch_eventsub_secret,
            twitch_broadcaster_user_id,
            max_skew_seconds,
        } => {
            let mut webhook_config =
                StreamWebhookConfig::new(twitch_eventsub_secret, twitch_broadcaster_user_id);
            webhook_config.max_skew_seconds = *max_skew_seconds;
            let state = Arc::new(WebhookServerState {
                config: webhook_config,
                dispatcher: Arc::new(github_client(common, &config)?),
            });
            run_webhook_server(bind, state).await?;
            Ok(vec!["helpdesk webhook server stopped".to_string()])
        }
    }
}

pub(crate) fn build_helpdesk_config(common: &CommonArgs) -> Result<HelpdeskConfig> {
    let mut config = HelpdeskConfig::new(RepoRef::parse(&common.repo)?);
    config.parser.low_hour_threshold = common.low_hour_threshold;
    let hours = i64::try_from(common.show_duration_hours)
        .context("--show-duration-hours is out of range")?;
    config.windows.show_duration = Duration::hours(hours);
    Ok(config)
}

pub(crate) fn require<'a>(value: Option<&'a str>, flag: &str, env: &str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => bail!("{flag} is required (or set {env})"),
    }
}

fn github_client(common: &CommonArgs, config: &HelpdeskConfig) -> Result<GithubApiClient> {
    let token = require(common.github_token.as_deref(), "--github-token", "GITHUB_TOKEN")?;
    GithubApiClient::new(
        common.github_api_base.clone(),
        token.to_string(),
        config.show_repo.clone(),
        common.request_timeout_ms,
    )
}

pub(crate) fn twitter_config(twitter: &TwitterArgs, request_timeout_ms: u64) -> Result<TwitterApiConfig> {
    let credentials = OAuth1Credentials {
        consumer_key: require(
            twitter.twitter_consumer_key.as_deref(),
            "--twitter-consumer-key",
            "TWITTER_CONSUMER_KEY",
        )?
        .to_string(),
        consumer_secret: require(
            twitter.twitter_consumer_secret.as_deref(),
            "--twitter-consumer-secret",
            "TWITTER_CONSUMER_SECRET",
        )?
        .to_string(),
        access_token_key: require(
            twitter.twitter_access_token_key.as_deref(),
            "--twitter-access-token-key",
            "TWITTER_ACCESS_TOKEN_KEY",
        )?
        .to_string(),
        access_token_secret: require(
            twitter.twitter_access_token_secret.as_deref(),
            "--twitter-access-token-secret",
            "TWITTER_ACCESS_TOKEN_SECRET",
        )?
        .to_string(),
    };
    Ok(TwitterApiConfig {
        api_base: twitter.twitter_api_base.clone(),
        ads_api_base: twitter.twitter_ads_api_base.clone(),
        credentials,
        account_id: require(
            twitter.twitter_account_id.as_deref(),
            "--twitter-account-id",
            "TWITTER_ACCOUNT_ID",
        )?
        .to_string(),
        user_id: require(
            twitter.twitter_user_id.as_deref(),
            "--twitter-user-id",
            "TWITTER_USER_ID",
        )?
        .to_string(),
        request_timeout_ms,
    })
}

fn lifecycle_runtime(common: &CommonArgs, config: HelpdeskConfig) -> Result<ShowLifecycleRuntime> {
    let github = github_client(common, &config)?;
    let twitter = TwitterApiClient::new(twitter_config(&common.twitter, common.request_timeout_ms)?)?;
    Ok(ShowLifecycleRuntime::new(
        config,
        Arc::new(github),
        Arc::new(twitter),
    ))
}

/// Reads the Actions event payload; only `issues` events select a show.
pub(crate) fn load_closed_issue_event(path: &Path) -> Result<Option<GithubIssueEvent>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read event payload {}", path.display()))?;
    let value = serde_json::from_str::<Value>(&raw)
        .with_context(|| format!("failed to parse event payload {}", path.display()))?;
    if value.get("issue").is_none() {
        debug!(path = %path.display(), "event payload carries no issue, selecting show by window");
        return Ok(None);
    }
    load_issue_event(path).map(Some)
}

pub(crate) fn render_projection(projection: &ScheduleProjection) -> Vec<String> {
    let mut lines = vec![format!(
        "helpdesk project: shows={}",
        projection.start.len()
    )];
    for trigger in projection.start.iter().chain(projection.announcement.iter()) {
        lines.push(format!(
            "helpdesk trigger: show={} stage={} fire_at={} cron=\"{}\"",
            trigger.show_number,
            trigger.stage,
            trigger.fire_at.to_rfc3339(),
            trigger.expression
        ));
    }
    lines
}

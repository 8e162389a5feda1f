use std::sync::Arc;

use base64::Engine;
use chrono::{TimeZone, Utc};
use helpdesk_runtime::{
    sync_readmes, GithubApiClient, HelpdeskConfig, OAuth1Credentials, RepoRef,
    ShowLifecycleRuntime, TwitterApiClient, TwitterApiConfig,
};
use httpmock::prelude::*;
use serde_json::json;

fn github_client(server: &MockServer) -> GithubApiClient {
    GithubApiClient::new(
        server.base_url(),
        "token".to_string(),
        RepoRef::parse("gr2m/helpdesk").expect("repo"),
        2_000,
    )
    .expect("github client")
}

fn twitter_client(server: &MockServer) -> TwitterApiClient {
    TwitterApiClient::new(TwitterApiConfig {
        api_base: format!("{}/1.1", server.base_url()),
        ads_api_base: format!("{}/9", server.base_url()),
        credentials: OAuth1Credentials {
            consumer_key: "consumer".to_string(),
            consumer_secret: "consumer-secret".to_string(),
            access_token_key: "token".to_string(),
            access_token_secret: "token-secret".to_string(),
        },
        account_id: "18ce54d4x5t".to_string(),
        user_id: "12345".to_string(),
        request_timeout_ms: 2_000,
    })
    .expect("twitter client")
}

fn show_issue(number: u64, day: u32, state: &str) -> serde_json::Value {
    json!({
        "number": number,
        "title": format!("📅 8/{day} @ 10:00am PT - Show {number}"),
        "body": format!("📅 Thursday, August {day}, 2021\n🕐 10:00am Pacific Time\n"),
        "state": state,
        "html_url": format!("https://github.com/gr2m/helpdesk/issues/{number}"),
        "labels": [{ "name": "show" }]
    })
}

#[tokio::test]
async fn integration_reconcile_creates_missing_and_deletes_orphaned_posts() {
    let github = MockServer::start();
    let twitter = MockServer::start();
    github.mock(|when, then| {
        when.method(GET)
            .path("/repos/gr2m/helpdesk/issues")
            .query_param("state", "open");
        then.status(200)
            .json_body(json!([show_issue(49, 19, "open"), show_issue(50, 26, "open")]));
    });
    let list = twitter.mock(|when, then| {
        when.method(GET)
            .path("/9/accounts/18ce54d4x5t/scheduled_tweets")
            .query_param("count", "200");
        then.status(200).json_body(json!({
            "data": [{
                "id_str": "orphan",
                "text": "📯  Starting in 30 minutes\n\nhttps://github.com/gr2m/helpdesk/issues/40",
                "scheduled_at": "2021-08-12T16:30:00Z",
                "completed_at": null
            }],
            "next_cursor": null
        }));
    });
    let create = twitter.mock(|when, then| {
        when.method(POST)
            .path("/9/accounts/18ce54d4x5t/scheduled_tweets")
            .query_param("scheduled_at", "2021-08-26T16:30:00Z")
            .query_param("as_user_id", "12345");
        then.status(200).json_body(json!({ "data": { "id_str": "created-1" } }));
    });
    let delete = twitter.mock(|when, then| {
        when.method(DELETE)
            .path("/9/accounts/18ce54d4x5t/scheduled_tweets/orphan");
        then.status(200).json_body(json!({ "data": { "id_str": "orphan" } }));
    });

    let runtime = ShowLifecycleRuntime::new(
        HelpdeskConfig::new(RepoRef::parse("gr2m/helpdesk").expect("repo")),
        Arc::new(github_client(&github)),
        Arc::new(twitter_client(&twitter)),
    );
    let report = runtime
        .reconcile_scheduled_posts(Utc.with_ymd_and_hms(2021, 8, 20, 0, 0, 0).unwrap())
        .await
        .expect("reconcile");

    assert_eq!(report.desired, 1);
    assert_eq!(report.observed, 1);
    assert_eq!((report.created, report.updated, report.deleted), (1, 0, 1));
    list.assert_calls(1);
    create.assert_calls(1);
    delete.assert_calls(1);
}

#[tokio::test]
async fn integration_sync_readme_rewrites_show_section_through_contents_api() {
    let github = MockServer::start();
    github.mock(|when, then| {
        when.method(GET)
            .path("/repos/gr2m/helpdesk/issues")
            .query_param("state", "all");
        then.status(200)
            .json_body(json!([show_issue(50, 26, "open"), show_issue(40, 12, "closed")]));
    });
    let readme = "# helpdesk\n<!-- BEGIN section:helpdesk-shows -->\n<!-- END section:helpdesk-shows -->\n";
    let fetch_main = github.mock(|when, then| {
        when.method(GET)
            .path("/repos/gr2m/helpdesk/contents/README.md")
            .query_param("ref", "main");
        then.status(200).json_body(json!({
            "sha": "abc123",
            "content": base64::engine::general_purpose::STANDARD.encode(readme),
            "encoding": "base64"
        }));
    });
    let fetch_profile = github.mock(|when, then| {
        when.method(GET).path("/repos/gr2m/gr2m/contents/README.md");
        then.status(200).json_body(json!({
            "sha": "def456",
            "content": base64::engine::general_purpose::STANDARD.encode(readme),
            "encoding": "base64"
        }));
    });
    let update_main = github.mock(|when, then| {
        when.method(PUT)
            .path("/repos/gr2m/helpdesk/contents/README.md")
            .json_body_includes(
                json!({
                    "message": "docs(README): update helpdesk shows",
                    "sha": "abc123",
                    "branch": "main"
                })
                .to_string(),
            );
        then.status(200).json_body(json!({ "content": { "sha": "abc124" } }));
    });
    let update_profile = github.mock(|when, then| {
        when.method(PUT)
            .path("/repos/gr2m/gr2m/contents/README.md")
            .json_body_includes(json!({ "sha": "def456" }).to_string());
        then.status(200).json_body(json!({ "content": { "sha": "def457" } }));
    });

    let config = HelpdeskConfig::new(RepoRef::parse("gr2m/helpdesk").expect("repo"));
    let client = github_client(&github);
    let report = sync_readmes(&config, &client, &client)
        .await
        .expect("sync");

    assert_eq!(report.shows, 2);
    assert_eq!(report.updated, vec!["gr2m/helpdesk", "gr2m/gr2m"]);
    fetch_main.assert_calls(1);
    fetch_profile.assert_calls(1);
    update_main.assert_calls(1);
    update_profile.assert_calls(1);
}

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use helpdesk_runtime::{
    GithubApiClient, HelpdeskConfig, OAuth1Credentials, RepoRef, ShowLifecycleRuntime,
    TwitterApiClient, TwitterApiConfig,
};
use httpmock::prelude::*;
use serde_json::json;

const SHOW_BODY: &str = "💁🏻 **Creating tests**
📅 Thursday, August 19, 2021
🕐 10:00am Pacific Time
🎙️ _no guests_

- [ ] <!-- todo:announcement-tweet --> 30 minute announcement tweet
- [ ] <!-- todo:announcement-issue-comment --> 30 minute announcement comment
- [ ] <!-- todo:start-tweet --> start of show tweet
- [ ] <!-- todo:start-issue-comment --> comment on issue
- [ ] <!-- todo:twitter-profile-show-mode --> Set twitter profile url
- [ ] <!-- todo:twitter-profile-reset --> Reset twitter profile after the show
";

fn runtime(github: &MockServer, twitter: &MockServer) -> ShowLifecycleRuntime {
    let repo = RepoRef::parse("gr2m/helpdesk").expect("repo");
    let issues = GithubApiClient::new(github.base_url(), "token".to_string(), repo.clone(), 2_000)
        .expect("github client");
    let social = TwitterApiClient::new(TwitterApiConfig {
        api_base: format!("{}/1.1", twitter.base_url()),
        ads_api_base: format!("{}/9", twitter.base_url()),
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
    .expect("twitter client");
    ShowLifecycleRuntime::new(HelpdeskConfig::new(repo), Arc::new(issues), Arc::new(social))
}

fn mock_open_show<'a>(github: &'a MockServer, body: &str) -> httpmock::Mock<'a> {
    let body = body.to_string();
    github.mock(move |when, then| {
        when.method(GET)
            .path("/repos/gr2m/helpdesk/issues")
            .query_param("labels", "show")
            .query_param("state", "open");
        then.status(200).json_body(json!([{
            "number": 49,
            "title": "📅 8/19 @ 10:00am PT - Creating tests",
            "body": body,
            "state": "open",
            "html_url": "https://github.com/gr2m/helpdesk/issues/49",
            "labels": [{ "name": "show" }]
        }]));
    })
}

#[tokio::test]
async fn integration_start_comments_posts_switches_profile_and_marks_issue() {
    let github = MockServer::start();
    let twitter = MockServer::start();
    let list = mock_open_show(&github, SHOW_BODY);
    let comment = github.mock(|when, then| {
        when.method(POST)
            .path("/repos/gr2m/helpdesk/issues/49/comments")
            .json_body(json!({ "body": "I'm now live on https://twitch.tv/gregorcodes" }));
        then.status(201).json_body(json!({
            "html_url": "https://github.com/gr2m/helpdesk/issues/49#issuecomment-7"
        }));
    });
    let post = twitter.mock(|when, then| {
        when.method(POST)
            .path("/1.1/statuses/update.json")
            .header_exists("authorization");
        then.status(200).json_body(json!({ "id_str": "1430" }));
    });
    let profile = twitter.mock(|when, then| {
        when.method(POST)
            .path("/1.1/account/update_profile.json")
            .query_param("url", "https://twitch.tv/gregorcodes");
        then.status(200).json_body(json!({ "screen_name": "gr2m" }));
    });
    let patch = github.mock(|when, then| {
        when.method(PATCH)
            .path("/repos/gr2m/helpdesk/issues/49")
            .body_includes(
                "- [x] <!-- todo:start-tweet --> start of show tweet (https://twitter.com/gr2m/status/1430)",
            )
            .body_includes(
                "- [x] <!-- todo:start-issue-comment --> comment on issue (https://github.com/gr2m/helpdesk/issues/49#issuecomment-7)",
            );
        then.status(200).json_body(json!({
            "html_url": "https://github.com/gr2m/helpdesk/issues/49"
        }));
    });

    let show_at = Utc.with_ymd_and_hms(2021, 8, 19, 17, 0, 0).unwrap();
    let report = runtime(&github, &twitter)
        .start(show_at + Duration::minutes(1))
        .await
        .expect("start");

    assert_eq!(report.stage, "start");
    assert_eq!(
        report.post_url.as_deref(),
        Some("https://twitter.com/gr2m/status/1430")
    );
    list.assert_calls(1);
    comment.assert_calls(1);
    post.assert_calls(1);
    profile.assert_calls(1);
    patch.assert_calls(1);
}

#[tokio::test]
async fn integration_done_resets_profile_and_closes_issue() {
    let github = MockServer::start();
    let twitter = MockServer::start();
    mock_open_show(&github, SHOW_BODY);
    let comment = github.mock(|when, then| {
        when.method(POST).path("/repos/gr2m/helpdesk/issues/49/comments");
        then.status(201).json_body(json!({
            "html_url": "https://github.com/gr2m/helpdesk/issues/49#issuecomment-8"
        }));
    });
    let profile = twitter.mock(|when, then| {
        when.method(POST)
            .path("/1.1/account/update_profile.json")
            .query_param("name", "Gregor")
            .query_param("url", "https://github.com/gr2m/");
        then.status(200).json_body(json!({}));
    });
    let patch = github.mock(|when, then| {
        when.method(PATCH)
            .path("/repos/gr2m/helpdesk/issues/49")
            .json_body_includes(r#"{"state":"closed"}"#);
        then.status(200).json_body(json!({
            "html_url": "https://github.com/gr2m/helpdesk/issues/49"
        }));
    });

    let show_at = Utc.with_ymd_and_hms(2021, 8, 19, 17, 0, 0).unwrap();
    let report = runtime(&github, &twitter)
        .done(show_at + Duration::hours(2))
        .await
        .expect("done");

    assert!(report.closed);
    assert_eq!(report.completed_markers, vec!["twitter-profile-reset"]);
    comment.assert_calls(1);
    profile.assert_calls(1);
    patch.assert_calls(1);
}

#[tokio::test]
async fn integration_twitter_failure_aborts_before_checklist_update() {
    let github = MockServer::start();
    let twitter = MockServer::start();
    mock_open_show(&github, SHOW_BODY);
    let comment = github.mock(|when, then| {
        when.method(POST).path("/repos/gr2m/helpdesk/issues/49/comments");
        then.status(201).json_body(json!({
            "html_url": "https://github.com/gr2m/helpdesk/issues/49#issuecomment-9"
        }));
    });
    twitter.mock(|when, then| {
        when.method(POST).path("/1.1/statuses/update.json");
        then.status(503).body("over capacity");
    });
    let patch = github.mock(|when, then| {
        when.method(PATCH).path("/repos/gr2m/helpdesk/issues/49");
        then.status(200).json_body(json!({
            "html_url": "https://github.com/gr2m/helpdesk/issues/49"
        }));
    });

    let show_at = Utc.with_ymd_and_hms(2021, 8, 19, 17, 0, 0).unwrap();
    let error = runtime(&github, &twitter)
        .announce(show_at - Duration::minutes(30))
        .await
        .expect_err("twitter outage");

    assert_eq!(error.reason_code(), "remote_call_failed");
    assert!(error.to_string().contains("status 503"));
    comment.assert_calls(1);
    patch.assert_calls(0);
}

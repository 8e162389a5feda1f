use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::collaborators::{ProfileUpdate, ScheduledPostRecord, SocialMedia};
use crate::http_helpers::{build_http_client, percent_encode, truncate_for_error, USER_AGENT};
use crate::oauth1::{authorization_header, OAuth1Credentials, OAuth1Nonce};

pub const DEFAULT_TWITTER_API_BASE: &str = "https://api.twitter.com/1.1";
pub const DEFAULT_TWITTER_ADS_API_BASE: &str = "https://ads-api.twitter.com/9";

#[derive(Debug, Clone)]
pub struct TwitterApiConfig {
    pub api_base: String,
    pub ads_api_base: String,
    pub credentials: OAuth1Credentials,
    /// Ads account owning the scheduled posts.
    pub account_id: String,
    /// User the scheduled posts are published as.
    pub user_id: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct ScheduledTweet {
    id_str: String,
    #[serde(default)]
    text: String,
    scheduled_at: DateTime<Utc>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
struct TweetIdentity {
    id_str: String,
}

#[derive(Clone)]
pub struct TwitterApiClient {
    http: reqwest::Client,
    config: TwitterApiConfig,
}

impl TwitterApiClient {
    pub fn new(config: TwitterApiConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );
        let http = build_http_client(headers, config.request_timeout_ms, "twitter")?;
        Ok(Self {
            http,
            config: TwitterApiConfig {
                api_base: config.api_base.trim_end_matches('/').to_string(),
                ads_api_base: config.ads_api_base.trim_end_matches('/').to_string(),
                ..config
            },
        })
    }

    fn scheduled_tweets_url(&self) -> String {
        format!(
            "{}/accounts/{}/scheduled_tweets",
            self.config.ads_api_base,
            percent_encode(&self.config.account_id)
        )
    }

    /// Sends one signed request; parameters travel in the query string.
    async fn signed_request(
        &self,
        operation: &str,
        method: Method,
        base_url: &str,
        params: &[(String, String)],
    ) -> Result<Value> {
        let nonce = OAuth1Nonce::generate(Utc::now().timestamp());
        let authorization = authorization_header(
            &self.config.credentials,
            method.as_str(),
            base_url,
            params,
            &nonce,
        )?;
        let url = with_query(base_url, params);
        debug!(operation, method = %method, "sending signed twitter request");
        let response = self
            .http
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .send()
            .await
            .with_context(|| format!("twitter api {operation} request failed"))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read twitter {operation} body"))?;
        if !status.is_success() {
            bail!(
                "twitter api {operation} failed with status {}: {}",
                status.as_u16(),
                truncate_for_error(&body, 800)
            );
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        let parsed: Value = serde_json::from_str(&body)
            .with_context(|| format!("failed to decode twitter {operation}"))?;
        if let Some(errors) = parsed.get("errors").or_else(|| parsed.get("error")) {
            if !errors.is_null() {
                bail!(
                    "twitter api {operation} returned errors: {}",
                    truncate_for_error(&errors.to_string(), 800)
                );
            }
        }
        Ok(parsed)
    }
}

fn with_query(base_url: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return base_url.to_string();
    }
    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{base_url}?{query}")
}

/// Ads API responses wrap their payload in `data`; v1.1 responses do not.
fn response_payload(value: Value) -> Value {
    match value {
        Value::Object(mut object) if object.contains_key("data") => {
            object.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
impl SocialMedia for TwitterApiClient {
    async fn post_status(&self, text: &str) -> Result<String> {
        let url = format!("{}/statuses/update.json", self.config.api_base);
        let params = vec![("status".to_string(), text.to_string())];
        let response = self
            .signed_request("post status", Method::POST, &url, &params)
            .await?;
        let tweet: TweetIdentity = serde_json::from_value(response_payload(response))
            .context("failed to decode twitter post status response")?;
        Ok(tweet.id_str)
    }

    async fn list_scheduled_posts(&self) -> Result<Vec<ScheduledPostRecord>> {
        let url = self.scheduled_tweets_url();
        let mut cursor: Option<String> = None;
        let mut rows = Vec::new();
        loop {
            let mut params = vec![("count".to_string(), "200".to_string())];
            if let Some(cursor) = cursor.as_deref() {
                params.push(("cursor".to_string(), cursor.to_string()));
            }
            let mut response = self
                .signed_request("list scheduled posts", Method::GET, &url, &params)
                .await?;
            let next_cursor = response
                .get_mut("next_cursor")
                .map(Value::take)
                .and_then(|value| value.as_str().map(ToOwned::to_owned));
            let chunk: Vec<ScheduledTweet> = serde_json::from_value(response_payload(response))
                .context("failed to decode twitter scheduled posts")?;
            rows.extend(chunk.into_iter().map(|tweet| ScheduledPostRecord {
                id: tweet.id_str,
                text: tweet.text,
                scheduled_at: tweet.scheduled_at,
                completed_at: tweet.completed_at,
            }));
            match next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }
        Ok(rows)
    }

    async fn create_scheduled_post(
        &self,
        scheduled_at: DateTime<Utc>,
        text: &str,
    ) -> Result<String> {
        let params = vec![
            ("scheduled_at".to_string(), format_instant(scheduled_at)),
            ("text".to_string(), text.to_string()),
            ("as_user_id".to_string(), self.config.user_id.clone()),
        ];
        let response = self
            .signed_request(
                "create scheduled post",
                Method::POST,
                &self.scheduled_tweets_url(),
                &params,
            )
            .await?;
        let tweet: TweetIdentity = serde_json::from_value(response_payload(response))
            .context("failed to decode twitter scheduled post")?;
        Ok(tweet.id_str)
    }

    async fn update_scheduled_post(
        &self,
        id: &str,
        scheduled_at: Option<DateTime<Utc>>,
        text: Option<&str>,
    ) -> Result<()> {
        let mut params = Vec::new();
        if let Some(scheduled_at) = scheduled_at {
            params.push(("scheduled_at".to_string(), format_instant(scheduled_at)));
        }
        if let Some(text) = text {
            params.push(("text".to_string(), text.to_string()));
        }
        if params.is_empty() {
            return Err(anyhow!("scheduled post update for {id} has no changes"));
        }
        let url = format!("{}/{}", self.scheduled_tweets_url(), percent_encode(id));
        self.signed_request("update scheduled post", Method::PUT, &url, &params)
            .await?;
        Ok(())
    }

    async fn delete_scheduled_post(&self, id: &str) -> Result<()> {
        let url = format!("{}/{}", self.scheduled_tweets_url(), percent_encode(id));
        self.signed_request("delete scheduled post", Method::DELETE, &url, &[])
            .await?;
        Ok(())
    }

    async fn update_profile(&self, profile: &ProfileUpdate) -> Result<()> {
        let mut params = Vec::new();
        if let Some(name) = profile.name.as_deref() {
            params.push(("name".to_string(), name.to_string()));
        }
        if let Some(url) = profile.url.as_deref() {
            params.push(("url".to_string(), url.to_string()));
        }
        let url = format!("{}/account/update_profile.json", self.config.api_base);
        self.signed_request("update profile", Method::POST, &url, &params)
            .await?;
        Ok(())
    }
}

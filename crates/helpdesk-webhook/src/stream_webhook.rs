//! EventSub request evaluation.
//!
//! [`evaluate_stream_webhook`] is pure: it decides the response for a request
//! and whether the event must be relayed, leaving the dispatch itself to the
//! server.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::signature::{validate_timestamp_skew, verify_eventsub_signature};

pub const MESSAGE_TYPE_VERIFICATION: &str = "webhook_callback_verification";
pub const MESSAGE_TYPE_NOTIFICATION: &str = "notification";
pub const MESSAGE_TYPE_REVOCATION: &str = "revocation";
pub const DEFAULT_DISPATCH_EVENT_TYPE: &str = "glitch";
pub const DEFAULT_MAX_SKEW_SECONDS: u64 = 600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamWebhookConfig {
    pub secret: String,
    pub broadcaster_user_id: String,
    pub supported_event_types: Vec<String>,
    /// Repository dispatch `event_type` used for relayed events.
    pub dispatch_event_type: String,
    pub max_skew_seconds: u64,
}

impl StreamWebhookConfig {
    pub fn new(secret: impl Into<String>, broadcaster_user_id: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            broadcaster_user_id: broadcaster_user_id.into(),
            supported_event_types: vec!["stream.online".to_string(), "stream.offline".to_string()],
            dispatch_event_type: DEFAULT_DISPATCH_EVENT_TYPE.to_string(),
            max_skew_seconds: DEFAULT_MAX_SKEW_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StreamWebhookRequest<'a> {
    pub message_id: Option<&'a str>,
    pub timestamp: Option<&'a str>,
    pub signature: Option<&'a str>,
    pub message_type: Option<&'a str>,
    pub body: &'a [u8],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Unauthorized { reason: String },
    BadRequest { reason: String },
    /// Verification handshake; the challenge is echoed verbatim.
    Challenge(String),
    Revoked { event_type: String },
    UnsupportedEventType(String),
    UnsupportedUserAccount { user_id: String, login: String },
    Relay { event_type: String },
}

impl WebhookOutcome {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized { .. } => 401,
            Self::BadRequest { .. } => 400,
            Self::UnsupportedEventType(_) | Self::UnsupportedUserAccount { .. } => 404,
            Self::Challenge(_) | Self::Revoked { .. } | Self::Relay { .. } => 200,
        }
    }

    pub fn response_body(&self) -> String {
        match self {
            Self::Unauthorized { .. } => "Unauthorized".to_string(),
            Self::BadRequest { reason } => format!("Bad Request: {reason}"),
            Self::Challenge(challenge) => challenge.clone(),
            Self::UnsupportedEventType(_) => "unsupported event type".to_string(),
            Self::UnsupportedUserAccount { .. } => "unsupported user account".to_string(),
            Self::Revoked { .. } | Self::Relay { .. } => "ok".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct EventSubPayload {
    #[serde(default)]
    challenge: Option<String>,
    #[serde(default)]
    subscription: Option<EventSubSubscription>,
    #[serde(default)]
    event: Option<EventSubEvent>,
}

#[derive(Debug, Deserialize)]
struct EventSubSubscription {
    #[serde(rename = "type")]
    event_type: String,
}

#[derive(Debug, Default, Deserialize)]
struct EventSubEvent {
    #[serde(default)]
    broadcaster_user_id: String,
    #[serde(default)]
    broadcaster_user_login: String,
}

/// Decides the response for one EventSub request.
///
/// The signature is checked before anything else, including the verification
/// handshake.
pub fn evaluate_stream_webhook(
    config: &StreamWebhookConfig,
    request: &StreamWebhookRequest<'_>,
    now: DateTime<Utc>,
) -> WebhookOutcome {
    let (Some(message_id), Some(timestamp), Some(signature)) =
        (request.message_id, request.timestamp, request.signature)
    else {
        return WebhookOutcome::Unauthorized {
            reason: "missing eventsub signature headers".to_string(),
        };
    };
    if let Err(error) =
        verify_eventsub_signature(&config.secret, message_id, timestamp, request.body, signature)
    {
        warn!(message_id, error = %error, "eventsub signature rejected");
        return WebhookOutcome::Unauthorized {
            reason: error.to_string(),
        };
    }
    if let Err(error) = validate_timestamp_skew(timestamp, now, config.max_skew_seconds) {
        warn!(message_id, error = %error, "eventsub timestamp rejected");
        return WebhookOutcome::Unauthorized {
            reason: error.to_string(),
        };
    }

    let payload = match serde_json::from_slice::<EventSubPayload>(request.body) {
        Ok(payload) => payload,
        Err(error) => {
            return WebhookOutcome::BadRequest {
                reason: format!("invalid eventsub payload: {error}"),
            }
        }
    };
    let event_type = payload
        .subscription
        .as_ref()
        .map(|subscription| subscription.event_type.clone())
        .unwrap_or_default();

    match request.message_type.unwrap_or(MESSAGE_TYPE_NOTIFICATION) {
        MESSAGE_TYPE_VERIFICATION => {
            return match payload.challenge {
                Some(challenge) => {
                    debug!(message_id, event_type = %event_type, "answering eventsub challenge");
                    WebhookOutcome::Challenge(challenge)
                }
                None => WebhookOutcome::BadRequest {
                    reason: "verification message without challenge".to_string(),
                },
            };
        }
        MESSAGE_TYPE_REVOCATION => {
            warn!(message_id, event_type = %event_type, "eventsub subscription revoked");
            return WebhookOutcome::Revoked { event_type };
        }
        MESSAGE_TYPE_NOTIFICATION => {}
        other => {
            return WebhookOutcome::BadRequest {
                reason: format!("unsupported message type '{other}'"),
            }
        }
    }

    if !config
        .supported_event_types
        .iter()
        .any(|supported| *supported == event_type)
    {
        debug!(message_id, event_type = %event_type, "ignoring unsupported event type");
        return WebhookOutcome::UnsupportedEventType(event_type);
    }
    let event = payload.event.unwrap_or_default();
    if event.broadcaster_user_id != config.broadcaster_user_id {
        debug!(
            message_id,
            user_id = %event.broadcaster_user_id,
            login = %event.broadcaster_user_login,
            "ignoring event for another broadcaster"
        );
        return WebhookOutcome::UnsupportedUserAccount {
            user_id: event.broadcaster_user_id,
            login: event.broadcaster_user_login,
        };
    }
    WebhookOutcome::Relay { event_type }
}

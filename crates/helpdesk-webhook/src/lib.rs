//! Inbound stream-platform webhook for the helpdesk show automation.
//!
//! Verifies EventSub notifications and relays stream online/offline events to
//! the show repository as a repository dispatch.

pub mod server;
pub mod signature;
pub mod stream_webhook;

pub use server::{build_webhook_router, run_webhook_server, WebhookServerState};
pub use signature::{compute_eventsub_signature, verify_eventsub_signature};
pub use stream_webhook::{
    evaluate_stream_webhook, StreamWebhookConfig, StreamWebhookRequest, WebhookOutcome,
    DEFAULT_DISPATCH_EVENT_TYPE, DEFAULT_MAX_SKEW_SECONDS, MESSAGE_TYPE_NOTIFICATION,
    MESSAGE_TYPE_REVOCATION, MESSAGE_TYPE_VERIFICATION,
};

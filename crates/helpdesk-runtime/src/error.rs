use helpdesk_shows::{ReadmeSectionError, SchedulerExportError, ShowScheduleError, ShowTimeError};
use thiserror::Error;

#[derive(Debug, Error)]
/// Failures that abort a lifecycle action.
pub enum ShowLifecycleError {
    #[error(transparent)]
    Parse(#[from] ShowScheduleError),
    #[error("no open show is inside the {stage} window")]
    NoMatchingShow { stage: &'static str },
    #[error("invalid event payload: {0}")]
    InvalidEvent(String),
    #[error("invalid new show form: {0}")]
    InvalidShowForm(#[from] ShowTimeError),
    #[error(transparent)]
    Export(#[from] SchedulerExportError),
    #[error("README {repo}: {source}")]
    Readme {
        repo: String,
        #[source]
        source: ReadmeSectionError,
    },
    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

impl ShowLifecycleError {
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Parse(_) | Self::InvalidShowForm(_) | Self::Export(_) | Self::Readme { .. } => {
                "parse_error"
            }
            Self::NoMatchingShow { .. } => "not_found",
            Self::InvalidEvent(_) => "invalid_event",
            Self::Remote(_) => "remote_call_failed",
        }
    }
}

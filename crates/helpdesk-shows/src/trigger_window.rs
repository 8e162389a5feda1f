use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::show_record::ShowRecord;
use crate::show_time::{ParsedShowTime, ShowTimeError, ShowTimeParser};

pub const DEFAULT_ANNOUNCEMENT_LEAD_MINUTES: i64 = 30;
pub const DEFAULT_ANNOUNCEMENT_TOLERANCE_MINUTES: i64 = 25;
pub const DEFAULT_START_TOLERANCE_MINUTES: i64 = 15;
pub const DEFAULT_SHOW_DURATION_MINUTES: i64 = 4 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("show #{issue_number} has an unreadable schedule: {source}")]
pub struct ShowScheduleError {
    pub issue_number: u64,
    #[source]
    pub source: ShowTimeError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Lifecycle stages that are triggered by time windows around a show.
pub enum LifecycleStage {
    Announcement,
    Start,
    Done,
}

impl LifecycleStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Announcement => "announcement",
            Self::Start => "start",
            Self::Done => "done",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Offsets and tolerances that define each lifecycle window.
///
/// The announcement and start windows are symmetric and exclusive at both
/// edges. The done window opens right after showtime and closes, inclusively,
/// once `show_duration` has elapsed.
pub struct TriggerWindowPolicy {
    pub announcement_lead: Duration,
    pub announcement_tolerance: Duration,
    pub start_tolerance: Duration,
    pub show_duration: Duration,
}

impl Default for TriggerWindowPolicy {
    fn default() -> Self {
        Self {
            announcement_lead: Duration::minutes(DEFAULT_ANNOUNCEMENT_LEAD_MINUTES),
            announcement_tolerance: Duration::minutes(DEFAULT_ANNOUNCEMENT_TOLERANCE_MINUTES),
            start_tolerance: Duration::minutes(DEFAULT_START_TOLERANCE_MINUTES),
            show_duration: Duration::minutes(DEFAULT_SHOW_DURATION_MINUTES),
        }
    }
}

impl TriggerWindowPolicy {
    pub fn announcement_instant(&self, show_at: DateTime<Utc>) -> DateTime<Utc> {
        show_at - self.announcement_lead
    }

    pub fn is_announcement_time(&self, show_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        within_tolerance(
            self.announcement_instant(show_at),
            now,
            self.announcement_tolerance,
        )
    }

    pub fn is_start_time(&self, show_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        within_tolerance(show_at, now, self.start_tolerance)
    }

    pub fn is_done_time(&self, show_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now > show_at && now <= show_at + self.show_duration
    }

    pub fn contains(&self, stage: LifecycleStage, show_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match stage {
            LifecycleStage::Announcement => self.is_announcement_time(show_at, now),
            LifecycleStage::Start => self.is_start_time(show_at, now),
            LifecycleStage::Done => self.is_done_time(show_at, now),
        }
    }
}

fn within_tolerance(anchor: DateTime<Utc>, now: DateTime<Utc>, tolerance: Duration) -> bool {
    (now - anchor).abs() < tolerance
}

/// Returns the first show, in the given order, whose `stage` window contains `now`.
///
/// Show bodies are parsed lazily; a malformed body encountered before a match
/// aborts the scan.
pub fn find_show_in_window<'a>(
    shows: &'a [ShowRecord],
    parser: &ShowTimeParser,
    policy: &TriggerWindowPolicy,
    stage: LifecycleStage,
    now: DateTime<Utc>,
) -> Result<Option<(&'a ShowRecord, ParsedShowTime)>, ShowScheduleError> {
    for show in shows {
        let parsed = parser
            .parse(&show.body)
            .map_err(|source| ShowScheduleError {
                issue_number: show.number,
                source,
            })?;
        if policy.contains(stage, parsed.resolved_instant, now) {
            return Ok(Some((show, parsed)));
        }
    }
    Ok(None)
}

//! Cron-style exports of the lifecycle trigger instants.
//!
//! The external scheduler fires in UTC and evaluates five-field expressions
//! (`minute hour day month *`). Triggers are exported `trigger_lead` ahead of
//! the instant they serve so the fired job lands inside its window even when
//! the scheduler runs late.

use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use cron::Schedule;
use serde::Serialize;
use thiserror::Error;

use crate::show_record::ShowRecord;
use crate::show_time::ShowTimeParser;
use crate::trigger_window::{LifecycleStage, ShowScheduleError, TriggerWindowPolicy};

pub const DEFAULT_TRIGGER_LEAD_MINUTES: i64 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerExportError {
    #[error(transparent)]
    Schedule(#[from] ShowScheduleError),
    #[error("invalid scheduler expression '{expression}': {message}")]
    InvalidExpression { expression: String, message: String },
    #[error("scheduler expression '{0}' has no future occurrence")]
    NoFutureOccurrence(String),
    #[error("scheduler expression '{expression}' fires at {fires_at}, expected {expected}")]
    FireTimeMismatch {
        expression: String,
        expected: DateTime<Utc>,
        fires_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerTrigger {
    pub show_number: u64,
    pub stage: &'static str,
    pub fire_at: DateTime<Utc>,
    pub expression: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleProjection {
    pub start: Vec<SchedulerTrigger>,
    pub announcement: Vec<SchedulerTrigger>,
}

impl ScheduleProjection {
    pub fn is_empty(&self) -> bool {
        self.start.is_empty() && self.announcement.is_empty()
    }

    pub fn start_lines(&self) -> String {
        join_expressions(&self.start)
    }

    pub fn announcement_lines(&self) -> String {
        join_expressions(&self.announcement)
    }
}

fn join_expressions(triggers: &[SchedulerTrigger]) -> String {
    triggers
        .iter()
        .map(|trigger| trigger.expression.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats `instant` as `minute hour day month *` in UTC.
pub fn cron_expression_for(instant: DateTime<Utc>) -> String {
    format!(
        "{} {} {} {} *",
        instant.minute(),
        instant.hour(),
        instant.day(),
        instant.month()
    )
}

/// Next instant strictly after `after` at which a five-field expression fires.
pub fn next_fire_after(
    expression: &str,
    after: DateTime<Utc>,
) -> Result<DateTime<Utc>, SchedulerExportError> {
    let schedule = Schedule::from_str(&format!("0 {expression}")).map_err(|error| {
        SchedulerExportError::InvalidExpression {
            expression: expression.to_string(),
            message: error.to_string(),
        }
    })?;
    schedule
        .after(&after)
        .next()
        .ok_or_else(|| SchedulerExportError::NoFutureOccurrence(expression.to_string()))
}

/// Builds the trigger for `fire_at` and confirms its expression fires at that instant.
fn checked_trigger(
    show_number: u64,
    stage: LifecycleStage,
    fire_at: DateTime<Utc>,
) -> Result<SchedulerTrigger, SchedulerExportError> {
    let expression = cron_expression_for(fire_at);
    let fires_at = next_fire_after(&expression, fire_at - Duration::minutes(1))?;
    if fires_at != fire_at {
        return Err(SchedulerExportError::FireTimeMismatch {
            expression,
            expected: fire_at,
            fires_at,
        });
    }
    Ok(SchedulerTrigger {
        show_number,
        stage: stage.as_str(),
        fire_at,
        expression,
    })
}

/// Projects start and announcement triggers for every open show still ahead of `now`.
pub fn project_scheduler_triggers(
    shows: &[ShowRecord],
    parser: &ShowTimeParser,
    policy: &TriggerWindowPolicy,
    trigger_lead: Duration,
    now: DateTime<Utc>,
) -> Result<ScheduleProjection, SchedulerExportError> {
    let mut projection = ScheduleProjection::default();
    for show in shows.iter().filter(|show| show.is_open()) {
        let parsed = parser.parse(&show.body).map_err(|source| ShowScheduleError {
            issue_number: show.number,
            source,
        })?;
        let show_at = parsed.resolved_instant;
        if show_at <= now {
            continue;
        }

        projection.start.push(checked_trigger(
            show.number,
            LifecycleStage::Start,
            show_at - trigger_lead,
        )?);
        projection.announcement.push(checked_trigger(
            show.number,
            LifecycleStage::Announcement,
            policy.announcement_instant(show_at) - trigger_lead,
        )?);
    }
    Ok(projection)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{
        cron_expression_for, next_fire_after, project_scheduler_triggers, SchedulerExportError,
        DEFAULT_TRIGGER_LEAD_MINUTES,
    };
    use crate::show_record::{ShowRecord, ShowState};
    use crate::show_time::ShowTimeParser;
    use crate::trigger_window::TriggerWindowPolicy;

    fn show(number: u64, state: ShowState, date_line: &str) -> ShowRecord {
        ShowRecord {
            number,
            title: format!("show {number}"),
            body: format!("💁🏻 **Show**\n{date_line}\n🕐 10:00am Pacific Time\n"),
            state,
            html_url: format!("https://github.com/gr2m/helpdesk/issues/{number}"),
            labels: vec!["show".to_string()],
        }
    }

    fn lead() -> Duration {
        Duration::minutes(DEFAULT_TRIGGER_LEAD_MINUTES)
    }

    #[test]
    fn unit_cron_expression_uses_unpadded_utc_fields() {
        let instant = Utc.with_ymd_and_hms(2021, 8, 6, 7, 5, 0).unwrap();
        assert_eq!(cron_expression_for(instant), "5 7 6 8 *");
    }

    #[test]
    fn functional_projection_exports_future_open_shows_only() {
        let now = Utc.with_ymd_and_hms(2021, 8, 20, 0, 0, 0).unwrap();
        let shows = vec![
            show(40, ShowState::Open, "📅 Thursday, August 19, 2021"),
            show(41, ShowState::Open, "📅 Thursday, August 26, 2021"),
            show(42, ShowState::Closed, "📅 Thursday, September 2, 2021"),
        ];
        let projection = project_scheduler_triggers(
            &shows,
            &ShowTimeParser::default(),
            &TriggerWindowPolicy::default(),
            lead(),
            now,
        )
        .expect("projection");
        assert_eq!(projection.start_lines(), "57 16 26 8 *");
        assert_eq!(projection.announcement_lines(), "27 16 26 8 *");
        assert_eq!(projection.start[0].show_number, 41);
    }

    #[test]
    fn functional_projection_joins_multiple_shows_with_newlines() {
        let now = Utc.with_ymd_and_hms(2021, 8, 1, 0, 0, 0).unwrap();
        let shows = vec![
            show(41, ShowState::Open, "📅 Thursday, August 26, 2021"),
            show(43, ShowState::Open, "📅 Thursday, September 2, 2021"),
        ];
        let projection = project_scheduler_triggers(
            &shows,
            &ShowTimeParser::default(),
            &TriggerWindowPolicy::default(),
            lead(),
            now,
        )
        .expect("projection");
        assert_eq!(projection.start_lines(), "57 16 26 8 *\n57 16 2 9 *");
        assert_eq!(projection.announcement_lines(), "27 16 26 8 *\n27 16 2 9 *");
    }

    #[test]
    fn unit_projection_is_empty_without_future_shows() {
        let now = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let shows = vec![show(41, ShowState::Open, "📅 Thursday, August 26, 2021")];
        let projection = project_scheduler_triggers(
            &shows,
            &ShowTimeParser::default(),
            &TriggerWindowPolicy::default(),
            lead(),
            now,
        )
        .expect("projection");
        assert!(projection.is_empty());
        assert_eq!(projection.start_lines(), "");
    }

    #[test]
    fn regression_projection_reports_malformed_open_show() {
        let mut broken = show(44, ShowState::Open, "📅 Thursday, August 26, 2021");
        broken.body = "no schedule".to_string();
        let error = project_scheduler_triggers(
            &[broken],
            &ShowTimeParser::default(),
            &TriggerWindowPolicy::default(),
            lead(),
            Utc.with_ymd_and_hms(2021, 8, 1, 0, 0, 0).unwrap(),
        )
        .expect_err("malformed show");
        assert!(matches!(error, SchedulerExportError::Schedule(_)));
    }

    #[test]
    fn integration_exported_expression_fires_at_trigger_instant() {
        let now = Utc.with_ymd_and_hms(2021, 8, 20, 0, 0, 0).unwrap();
        let projection = project_scheduler_triggers(
            &[show(41, ShowState::Open, "📅 Thursday, August 26, 2021")],
            &ShowTimeParser::default(),
            &TriggerWindowPolicy::default(),
            lead(),
            now,
        )
        .expect("projection");
        let trigger = &projection.start[0];
        let fired = next_fire_after(&trigger.expression, now).expect("next fire");
        assert_eq!(fired, trigger.fire_at);
        assert_eq!(fired, Utc.with_ymd_and_hms(2021, 8, 26, 16, 57, 0).unwrap());
    }

    #[test]
    fn unit_next_fire_after_rejects_invalid_expression() {
        let error = next_fire_after("not a cron", Utc::now()).expect_err("invalid");
        assert!(matches!(
            error,
            SchedulerExportError::InvalidExpression { .. }
        ));
    }

    #[test]
    fn regression_projection_rejects_lead_the_expression_cannot_represent() {
        let error = project_scheduler_triggers(
            &[show(41, ShowState::Open, "📅 Thursday, August 26, 2021")],
            &ShowTimeParser::default(),
            &TriggerWindowPolicy::default(),
            Duration::seconds(90),
            Utc.with_ymd_and_hms(2021, 8, 20, 0, 0, 0).unwrap(),
        )
        .expect_err("sub-minute lead");
        assert_eq!(
            error,
            SchedulerExportError::FireTimeMismatch {
                expression: "58 16 26 8 *".to_string(),
                expected: Utc.with_ymd_and_hms(2021, 8, 26, 16, 58, 30).unwrap(),
                fires_at: Utc.with_ymd_and_hms(2021, 8, 26, 16, 58, 0).unwrap(),
            }
        );
    }

    #[test]
    fn functional_projection_keeps_announcement_already_behind_now() {
        let now = Utc.with_ymd_and_hms(2021, 8, 26, 16, 40, 0).unwrap();
        let projection = project_scheduler_triggers(
            &[show(41, ShowState::Open, "📅 Thursday, August 26, 2021")],
            &ShowTimeParser::default(),
            &TriggerWindowPolicy::default(),
            lead(),
            now,
        )
        .expect("projection");
        assert_eq!(projection.announcement_lines(), "27 16 26 8 *");
        assert!(projection.announcement[0].fire_at < now);
    }
}

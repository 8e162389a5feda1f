//! Show domain model for the helpdesk livestream automation.
//!
//! Pure functions only: parsing show times out of issue bodies, lifecycle
//! trigger windows, scheduled-post reconciliation, checklist marker rewrites,
//! scheduler exports, and README/issue rendering. Nothing in this crate talks
//! to the network or reads process configuration.

pub mod checklist;
pub mod readme_section;
pub mod schedule_reconciler;
pub mod scheduler_export;
pub mod show_issue_template;
pub mod show_record;
pub mod show_time;
pub mod trigger_window;

pub use checklist::{
    mark_checklist_items_done, parse_checklist_markers, ChecklistCompletion, ChecklistMarker,
    ChecklistRewrite,
};
pub use readme_section::{render_shows_section, replace_readme_section, ReadmeSectionError};
pub use schedule_reconciler::{
    classify_scheduled_post, reconcile_scheduled_posts, DesiredPost, ObservedPost,
    ScheduleEffect, ScheduledPostKind, ANNOUNCEMENT_POST_MARKER,
};
pub use scheduler_export::{
    cron_expression_for, next_fire_after, project_scheduler_triggers, ScheduleProjection,
    SchedulerExportError, SchedulerTrigger,
};
pub use show_issue_template::{render_show_issue, NewShowForm, RenderedShowIssue};
pub use show_record::{ShowRecord, ShowState, ShowTitle};
pub use show_time::{ParsedShowTime, ShowTimeError, ShowTimeParser};
pub use trigger_window::{
    find_show_in_window, LifecycleStage, ShowScheduleError, TriggerWindowPolicy,
};

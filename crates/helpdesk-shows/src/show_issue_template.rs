//! Canonical title and body for a newly opened show issue.
//!
//! The rendered body carries the `📅`/`🕐` lines read back by
//! [`crate::show_time::ShowTimeParser`] and every checklist marker the
//! lifecycle actions complete later.

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::checklist::{
    TODO_ANNOUNCEMENT_ISSUE_COMMENT, TODO_ANNOUNCEMENT_TWEET, TODO_PROFILE_RESET,
    TODO_PROFILE_SHOW_MODE, TODO_RECORDING_TWEET, TODO_START_ISSUE_COMMENT, TODO_START_TWEET,
};
use crate::show_time::{ShowTimeError, ShowTimeParser};

pub const AUTOMATING_HELPDESK_TYPE: &str = "automating helpdesk";
pub const AUTOMATING_HELPDESK_PREFIX: &str = "Automating gr2m/helpdesk: ";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Fields submitted through the new-show issue form.
pub struct NewShowForm {
    pub title: String,
    #[serde(rename = "type", default)]
    pub show_type: String,
    /// `YYYY-MM-DD`, Pacific Time.
    pub date: String,
    /// `HH:MM`, 24-hour clock.
    pub time: String,
    #[serde(default)]
    pub guests: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub outline: String,
    #[serde(default)]
    pub todos: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedShowIssue {
    pub title: String,
    pub body: String,
}

/// Renders the issue for `form`.
///
/// The body only carries a 12-hour clock, so `parser` must read it back as
/// the submitted time. Times outside the parser's show hours are rejected.
pub fn render_show_issue(
    form: &NewShowForm,
    parser: &ShowTimeParser,
) -> Result<RenderedShowIssue, ShowTimeError> {
    let date = NaiveDate::parse_from_str(form.date.trim(), "%Y-%m-%d")
        .map_err(|_| ShowTimeError::InvalidDate(form.date.clone()))?;
    let time = NaiveTime::parse_from_str(form.time.trim(), "%H:%M")
        .map_err(|_| ShowTimeError::InvalidTime(form.time.clone()))?;
    if parser.disambiguate(written_clock_time(time)) != time {
        return Err(ShowTimeError::InvalidTime(form.time.clone()));
    }

    let show_title = if form.show_type.trim() == AUTOMATING_HELPDESK_TYPE {
        format!("{AUTOMATING_HELPDESK_PREFIX}{}", form.title.trim())
    } else {
        form.title.trim().to_string()
    };
    let clock = twelve_hour_clock(time);
    let title = format!(
        "📅 {} @ {clock} PT - {show_title}",
        date.format("%-m/%-d")
    );
    let guests = render_guests(&form.guests);

    let body = format!(
        "💁🏻 **{show_title}**
📅 {long_date}
🕐 {clock} Pacific Time
🎙️ {guests}
📍 {location}
🏷️ {tags}

---

Subscribe to this issues to get a notification before the show begins and a summary after the show concludes.

### {show_title}

{summary}

#### Outline

{outline}

#### TODOs

Before the show

{todos}
- [ ] <!-- todo:{TODO_ANNOUNCEMENT_TWEET} --> 30 minute announcement tweet
- [ ] <!-- todo:{TODO_ANNOUNCEMENT_ISSUE_COMMENT} --> 30 minute announcement comment

When show begins

- [ ] <!-- todo:{TODO_START_TWEET} --> start of show tweet
- [ ] <!-- todo:{TODO_START_ISSUE_COMMENT} --> comment on issue
- [ ] <!-- todo:{TODO_PROFILE_SHOW_MODE} --> Set twitter profile url

After the show

- [ ] <!-- todo:{TODO_PROFILE_RESET} --> Reset twitter profile after the show
- [ ] <!-- todo:{TODO_RECORDING_TWEET} --> recording available tweet

<a name=\"recording\"></a>
#### Recording

_will be added after the show_

<a name=\"shownotes\"></a>
#### Shownotes

_will be added after the show_",
        long_date = date.format("%A, %B %-d, %Y"),
        location = form.location.trim(),
        tags = form.tags.trim(),
        summary = form.summary.trim(),
        outline = form.outline.trim(),
        todos = form.todos.trim(),
    );

    Ok(RenderedShowIssue { title, body })
}

/// The wall-clock value left once the am/pm suffix is dropped.
fn written_clock_time(time: NaiveTime) -> NaiveTime {
    let (_, hour) = time.hour12();
    time.with_hour(hour).unwrap_or(time)
}

fn twelve_hour_clock(time: NaiveTime) -> String {
    let (is_pm, hour) = time.hour12();
    let suffix = if is_pm { "pm" } else { "am" };
    format!("{hour}:{:02}{suffix}", time.minute())
}

fn render_guests(raw: &str) -> String {
    let guests = raw
        .split(',')
        .map(|guest| guest.trim().trim_start_matches('@'))
        .filter(|guest| !guest.is_empty())
        .map(|guest| format!("@{guest}"))
        .collect::<Vec<_>>();
    if guests.is_empty() {
        "_no guests_".to_string()
    } else {
        guests.join(", ")
    }
}

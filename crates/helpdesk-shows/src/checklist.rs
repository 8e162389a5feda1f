//! Checklist markers embedded in show issue bodies.
//!
//! A marker line looks like `- [ ] <!-- todo:<tag> --> <label>` and is
//! completed in place as `- [x] <!-- todo:<tag> --> <label> (<url>)`. The
//! HTML comment is preserved character for character so completed markers stay
//! greppable.

use std::sync::OnceLock;

use regex::Regex;

pub const TODO_ANNOUNCEMENT_TWEET: &str = "announcement-tweet";
pub const TODO_ANNOUNCEMENT_ISSUE_COMMENT: &str = "announcement-issue-comment";
pub const TODO_START_TWEET: &str = "start-tweet";
pub const TODO_START_ISSUE_COMMENT: &str = "start-issue-comment";
pub const TODO_PROFILE_SHOW_MODE: &str = "twitter-profile-show-mode";
pub const TODO_PROFILE_RESET: &str = "twitter-profile-reset";
pub const TODO_RECORDING_TWEET: &str = "recording-tweet";

const OPEN_BOX: &str = "- [ ] <!-- todo:";
const DONE_BOX: &str = "- [x] <!-- todo:";
const TAG_SUFFIX: &str = " --> ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistMarker {
    pub tag: String,
    pub done: bool,
    pub label: String,
    pub reference_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistCompletion {
    pub tag: String,
    pub reference_url: String,
}

impl ChecklistCompletion {
    pub fn new(tag: impl Into<String>, reference_url: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            reference_url: reference_url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistRewrite {
    pub body: String,
    pub completed: Vec<String>,
    pub unmatched: Vec<String>,
}

impl ChecklistRewrite {
    pub fn changed(&self) -> bool {
        !self.completed.is_empty()
    }
}

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?m)- \[( |x)\] <!-- todo:([A-Za-z0-9_-]+) -->([^\r\n]*)")
            .expect("checklist marker pattern compiles")
    })
}

/// Lists every checklist marker in `body`, open and completed.
pub fn parse_checklist_markers(body: &str) -> Vec<ChecklistMarker> {
    marker_pattern()
        .captures_iter(body)
        .map(|captures| {
            let done = &captures[1] == "x";
            let tag = captures[2].to_string();
            let rest = captures[3].trim();
            let (label, reference_url) = match (done, rest.rsplit_once(" (")) {
                (true, Some((label, url))) if url.ends_with(')') => (
                    label.trim().to_string(),
                    Some(url.trim_end_matches(')').to_string()),
                ),
                _ => (rest.to_string(), None),
            };
            ChecklistMarker {
                tag,
                done,
                label,
                reference_url,
            }
        })
        .collect()
}

/// Completes the first open marker for each tag, appending its reference URL.
///
/// Already-completed markers never match again, so reapplying a rewrite to its
/// own output is a no-op.
pub fn mark_checklist_items_done(body: &str, completions: &[ChecklistCompletion]) -> ChecklistRewrite {
    let mut output = body.to_string();
    let mut completed = Vec::new();
    let mut unmatched = Vec::new();
    for completion in completions {
        match complete_marker(&output, &completion.tag, &completion.reference_url) {
            Some(next) => {
                output = next;
                completed.push(completion.tag.clone());
            }
            None => unmatched.push(completion.tag.clone()),
        }
    }
    ChecklistRewrite {
        body: output,
        completed,
        unmatched,
    }
}

fn complete_marker(body: &str, tag: &str, reference_url: &str) -> Option<String> {
    let needle = format!("{OPEN_BOX}{tag}{TAG_SUFFIX}");
    let start = body.find(&needle)?;
    let label_start = start + needle.len();
    let label_end = body[label_start..]
        .find(['\r', '\n'])
        .map(|offset| label_start + offset)
        .unwrap_or(body.len());
    if label_start == label_end {
        return None;
    }

    let mut output = String::with_capacity(body.len() + reference_url.len() + 8);
    output.push_str(&body[..start]);
    output.push_str(DONE_BOX);
    output.push_str(tag);
    output.push_str(TAG_SUFFIX);
    output.push_str(&body[label_start..label_end]);
    output.push_str(" (");
    output.push_str(reference_url);
    output.push(')');
    output.push_str(&body[label_end..]);
    Some(output)
}

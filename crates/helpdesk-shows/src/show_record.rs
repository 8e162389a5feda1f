use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowState {
    Open,
    Closed,
}

impl ShowState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A show as tracked by its issue: identity is the issue number.
pub struct ShowRecord {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub state: ShowState,
    pub html_url: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl ShowRecord {
    pub fn is_open(&self) -> bool {
        self.state == ShowState::Open
    }

    pub fn parsed_title(&self) -> ShowTitle {
        ShowTitle::parse(&self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Title split of `📅 8/19 @ 10:00am PT - Creating tests with @guest`.
pub struct ShowTitle {
    pub datetime: Option<String>,
    pub title: String,
    pub guest: Option<String>,
}

impl ShowTitle {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (datetime, rest) = match raw.split_once(" - ") {
            Some((datetime, rest)) => (Some(datetime.trim().to_string()), rest),
            None => (None, raw),
        };
        let (title, guest) = match rest.split_once(" with @") {
            Some((title, guest)) if !guest.trim().is_empty() => {
                (title.trim(), Some(guest.trim().to_string()))
            }
            _ => (rest.trim(), None),
        };
        Self {
            datetime,
            title: title.to_string(),
            guest,
        }
    }
}

//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record and its subtask children.
//! - Define the input shapes for creation (`NewTask`) and shallow-merge
//!   edits (`TaskPatch`).
//! - Own the JSON wire format of dates (`YYYY-MM-DD`) and times (`HH:MM`).
//!
//! # Invariants
//! - `title` is stored trimmed and never blank.
//! - `description` is `None` rather than an empty string.
//! - `TaskPatch` cannot touch `notified`; only the reminder poller raises it.
//! - A task without `date` has no `scheduled_at`, whatever its `time`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Collection-unique task identifier (creation time in epoch milliseconds).
pub type TaskId = i64;

/// Stable identifier for a subtask.
pub type SubtaskId = Uuid;

/// Canonical task record, serialized as one element of the `tasks` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, deserialize_with = "wire::blank_as_none")]
    pub description: Option<String>,
    /// Absent means the task is unscheduled.
    #[serde(default, with = "wire::optional_date")]
    pub date: Option<NaiveDate>,
    /// Start of day is assumed when absent and `date` is present.
    #[serde(default, with = "wire::optional_time")]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub done: bool,
    /// One-way reminder flag.
    #[serde(default)]
    pub notified: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,
}

/// Checklist entry nested under a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: SubtaskId,
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

impl Task {
    /// Creates an open, unscheduled task.
    ///
    /// The caller is responsible for id uniqueness and for rejecting blank
    /// titles; see `TaskStore::create`.
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            date: None,
            time: None,
            done: false,
            notified: false,
            subtasks: Vec::new(),
        }
    }

    /// Returns the combined local date-time the task is scheduled for.
    pub fn scheduled_at(&self) -> Option<NaiveDateTime> {
        self.date
            .map(|date| date.and_time(self.time.unwrap_or(NaiveTime::MIN)))
    }

    pub fn is_scheduled(&self) -> bool {
        self.date.is_some()
    }

    /// Case-insensitive substring match over title and description.
    ///
    /// `needle` must already be lowercased; an empty needle matches.
    pub fn matches_text(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|description| description.to_lowercase().contains(needle))
    }

    /// Shallow-merges `patch` into this task.
    ///
    /// Returns `false` without touching anything when the patch carries a
    /// blank title.
    pub fn apply_patch(&mut self, patch: TaskPatch) -> bool {
        let title = match patch.title {
            Some(title) => match normalize_title(&title) {
                Some(title) => Some(title),
                None => return false,
            },
            None => None,
        };

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = normalize_description(description);
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(time) = patch.time {
            self.time = time;
        }
        if let Some(done) = patch.done {
            self.done = done;
        }
        if let Some(subtasks) = patch.subtasks {
            self.subtasks = subtasks;
        }
        true
    }
}

impl Subtask {
    /// Creates an open subtask with a fresh random id.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            done: false,
        }
    }
}

/// Creation request for `TaskStore::create`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn scheduled(mut self, date: NaiveDate, time: Option<NaiveTime>) -> Self {
        self.date = Some(date);
        self.time = time;
        self
    }
}

/// Partial update merged by `TaskStore::update`.
///
/// `None` leaves a field untouched. For optional fields, `Some(None)`
/// clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub date: Option<Option<NaiveDate>>,
    pub time: Option<Option<NaiveTime>>,
    pub done: Option<bool>,
    pub subtasks: Option<Vec<Subtask>>,
}

impl TaskPatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn time(mut self, time: Option<NaiveTime>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn done(mut self, done: bool) -> Self {
        self.done = Some(done);
        self
    }

    /// Returns whether applying this patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.done.is_none()
            && self.subtasks.is_none()
    }
}

/// Trims a title; `None` when nothing is left.
pub fn normalize_title(title: &str) -> Option<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub(crate) fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|value| !value.trim().is_empty())
}

/// Serde helpers for the persisted JSON shape.
mod wire {
    use serde::{Deserialize, Deserializer};

    const DATE_FORMAT: &str = "%Y-%m-%d";
    const TIME_FORMAT: &str = "%H:%M";
    const TIME_FORMAT_SECONDS: &str = "%H:%M:%S";

    pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|text| !text.trim().is_empty()))
    }

    pub mod optional_date {
        use super::{blank_as_none, DATE_FORMAT};
        use chrono::NaiveDate;
        use serde::{Deserializer, Serializer};

        pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(date) => serializer.collect_str(&date.format(DATE_FORMAT)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match blank_as_none(deserializer)? {
                Some(text) => NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
                None => Ok(None),
            }
        }
    }

    pub mod optional_time {
        use super::{blank_as_none, TIME_FORMAT, TIME_FORMAT_SECONDS};
        use chrono::{NaiveTime, Timelike};
        use serde::{Deserializer, Serializer};

        pub fn serialize<S>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(time) if time.second() == 0 && time.nanosecond() == 0 => {
                    serializer.collect_str(&time.format(TIME_FORMAT))
                }
                Some(time) => serializer.collect_str(&time.format(TIME_FORMAT_SECONDS)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match blank_as_none(deserializer)? {
                Some(text) => super::super::parse_time(&text)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid time `{text}`"))),
                None => Ok(None),
            }
        }
    }
}

/// Parses `HH:MM` or `HH:MM:SS`.
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .ok()
}

/// Parses `YYYY-MM-DD`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

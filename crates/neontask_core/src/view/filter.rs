//! Status filter, text search and schedule ordering.
//!
//! # Responsibility
//! - Keep tasks matching a `StatusFilter` and a free-text query.
//! - Order dated tasks chronologically ahead of unscheduled ones.
//!
//! # Invariants
//! - Dated tasks with equal date-time keep their collection order.
//! - Unscheduled tasks are ordered by descending id (newest first).
//! - `Pending` and `Done` partition the `All` view.

use crate::model::task::Task;
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Completion-state filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Done,
    Pending,
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Done => "done",
            Self::Pending => "pending",
        }
    }

    pub fn accepts(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Done => task.done,
            Self::Pending => !task.done,
        }
    }
}

impl Display for StatusFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a status filter string is not `all|done|pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusFilterError(String);

impl Display for ParseStatusFilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported status filter `{}`; expected all|done|pending",
            self.0
        )
    }
}

impl Error for ParseStatusFilterError {}

impl FromStr for StatusFilter {
    type Err = ParseStatusFilterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "done" => Ok(Self::Done),
            "pending" => Ok(Self::Pending),
            other => Err(ParseStatusFilterError(other.to_string())),
        }
    }
}

/// View parameters chosen by the front end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub status: StatusFilter,
    /// Free text; blank matches everything.
    pub search: String,
}

impl ViewQuery {
    pub fn new(status: StatusFilter, search: impl Into<String>) -> Self {
        Self {
            status,
            search: search.into(),
        }
    }
}

/// Filters and orders `tasks` for display.
pub fn visible_tasks<'a>(tasks: &'a [Task], query: &ViewQuery) -> Vec<&'a Task> {
    let needle = query.search.trim().to_lowercase();

    let mut visible: Vec<&Task> = tasks
        .iter()
        .filter(|task| query.status.accepts(task))
        .filter(|task| task.matches_text(&needle))
        .collect();

    // `sort_by` is stable, which keeps equal schedules in collection order.
    visible.sort_by(|a, b| schedule_order(a, b));
    visible
}

/// Display ordering between two tasks.
pub fn schedule_order(a: &Task, b: &Task) -> Ordering {
    match (a.scheduled_at(), b.scheduled_at()) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.id.cmp(&a.id),
    }
}

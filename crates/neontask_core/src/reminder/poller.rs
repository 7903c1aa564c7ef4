//! Due-task detection and one-shot reminder delivery.
//!
//! # Responsibility
//! - Derive each task's reminder state from its schedule and flags.
//! - For every due task: play the sound, show the alert, mark notified.
//!
//! # Invariants
//! - Undated, done or already-notified tasks never fire.
//! - A task is due while `|now - scheduled_at| < tolerance`.
//! - `mark_notified` runs even when sound or alert delivery fails, so a
//!   task cannot fire twice.

use crate::clock::Clock;
use crate::model::task::{Task, TaskId};
use crate::reminder::notify::{Notifier, Reminder};
use crate::service::task_store::{StoreError, StoreResult, TaskStore};
use crate::storage::kv::KeyValueStore;
use chrono::{NaiveDateTime, TimeDelta};
use log::{debug, info, warn};
use std::time::Duration;

/// Window around the scheduled time during which a task counts as due.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(60);

/// Gap between two polls; one extra poll runs immediately at start.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);

/// Derived reminder state; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderState {
    NotDue,
    DueUnnotified,
    Notified,
}

/// Classifies `task` at local wall time `now`.
pub fn reminder_state(task: &Task, now: NaiveDateTime, tolerance: TimeDelta) -> ReminderState {
    if task.notified {
        return ReminderState::Notified;
    }
    if task.done {
        return ReminderState::NotDue;
    }
    match task.scheduled_at() {
        Some(scheduled_at) => {
            let delta = now.signed_duration_since(scheduled_at);
            if delta < tolerance && delta > -tolerance {
                ReminderState::DueUnnotified
            } else {
                ReminderState::NotDue
            }
        }
        None => ReminderState::NotDue,
    }
}

/// Scans a store and fires reminders through a `Notifier`.
pub struct ReminderPoller<N: Notifier> {
    notifier: N,
    tolerance: TimeDelta,
}

impl<N: Notifier> ReminderPoller<N> {
    pub fn new(notifier: N) -> Self {
        Self {
            notifier,
            tolerance: to_delta(DEFAULT_TOLERANCE),
        }
    }

    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = to_delta(tolerance);
        self
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Runs one poll against the store clock.
    ///
    /// Returns the ids that fired. A persistence failure while marking a
    /// task does not stop the remaining reminders; the first such error is
    /// returned after all due tasks were handled.
    pub fn check<K: KeyValueStore, C: Clock>(
        &mut self,
        store: &mut TaskStore<K, C>,
    ) -> StoreResult<Vec<TaskId>> {
        let now = store.now().naive_local();
        let due: Vec<Reminder> = store
            .tasks()
            .iter()
            .filter(|task| {
                reminder_state(task, now, self.tolerance) == ReminderState::DueUnnotified
            })
            .filter_map(Reminder::for_task)
            .collect();

        debug!(
            "event=reminder_poll module=reminder status=ok due={} total={}",
            due.len(),
            store.len()
        );

        let mut fired = Vec::with_capacity(due.len());
        let mut first_error: Option<StoreError> = None;
        for reminder in due {
            if let Err(err) = self.notifier.play_sound() {
                debug!(
                    "event=reminder_sound module=reminder status=skipped id={} error={}",
                    reminder.task_id, err
                );
            }
            if let Err(err) = self.notifier.alert(&reminder) {
                warn!(
                    "event=reminder_alert module=reminder status=error id={} error={}",
                    reminder.task_id, err
                );
            }

            match store.mark_notified(reminder.task_id) {
                Ok(_) => {
                    info!(
                        "event=reminder_fire module=reminder status=ok id={}",
                        reminder.task_id
                    );
                    fired.push(reminder.task_id);
                }
                Err(err) => {
                    fired.push(reminder.task_id);
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(fired),
        }
    }
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

#[cfg(test)]
mod tests {
    use super::{reminder_state, ReminderState};
    use crate::model::task::{parse_date, parse_time, Task};
    use chrono::{NaiveDateTime, TimeDelta};

    fn at(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn scheduled(date: &str, time: Option<&str>) -> Task {
        let mut task = Task::new(1, "call mom");
        task.date = parse_date(date);
        task.time = time.and_then(parse_time);
        task
    }

    #[test]
    fn due_window_is_open_on_both_sides() {
        let task = scheduled("2030-05-01", Some("10:00"));
        let tolerance = TimeDelta::seconds(60);

        assert_eq!(
            reminder_state(&task, at("2030-05-01 09:59:01"), tolerance),
            ReminderState::DueUnnotified
        );
        assert_eq!(
            reminder_state(&task, at("2030-05-01 10:00:59"), tolerance),
            ReminderState::DueUnnotified
        );
        assert_eq!(
            reminder_state(&task, at("2030-05-01 10:01:00"), tolerance),
            ReminderState::NotDue
        );
        assert_eq!(
            reminder_state(&task, at("2030-05-01 09:59:00"), tolerance),
            ReminderState::NotDue
        );
    }

    #[test]
    fn date_without_time_is_due_at_midnight() {
        let task = scheduled("2030-05-01", None);
        assert_eq!(
            reminder_state(&task, at("2030-05-01 00:00:10"), TimeDelta::seconds(60)),
            ReminderState::DueUnnotified
        );
    }

    #[test]
    fn done_and_notified_tasks_never_become_due() {
        let now = at("2030-05-01 10:00:00");
        let tolerance = TimeDelta::seconds(60);

        let mut done = scheduled("2030-05-01", Some("10:00"));
        done.done = true;
        assert_eq!(reminder_state(&done, now, tolerance), ReminderState::NotDue);

        let mut notified = scheduled("2030-05-01", Some("10:00"));
        notified.notified = true;
        assert_eq!(
            reminder_state(&notified, now, tolerance),
            ReminderState::Notified
        );

        let undated = Task::new(2, "no date");
        assert_eq!(reminder_state(&undated, now, tolerance), ReminderState::NotDue);
    }
}

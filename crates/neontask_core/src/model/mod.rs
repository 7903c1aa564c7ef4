//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record shared by store, view and reminders.
//! - Keep the wire shape of the persisted JSON array in one place.
//!
//! # Invariants
//! - Every task is identified by a collection-unique `TaskId`.
//! - `notified` is only ever raised by the reminder poller.

pub mod task;

//! Time-based reminders.
//!
//! # Responsibility
//! - Detect tasks whose scheduled time has just arrived.
//! - Deliver the sound + alert side effects and raise `notified` once.
//! - Drive periodic polling on a single-threaded event loop.
//!
//! # Invariants
//! - The store's `notified` flag is the only guard against re-firing.
//! - Sound failures never prevent the alert or the flag update.

pub mod notify;
pub mod poller;
pub mod runner;

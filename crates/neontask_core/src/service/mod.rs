//! Task use-case services.
//!
//! # Responsibility
//! - Own the in-memory task collection and its mutating operations.
//! - Persist through the storage adapter after every successful mutation.
//!
//! # Invariants
//! - Callers never write storage directly; every write goes through
//!   `TaskStore`.

pub mod command;
pub mod task_store;

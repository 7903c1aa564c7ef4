//! Derived, read-only views over the task collection.
//!
//! # Responsibility
//! - Turn the raw collection plus a status filter and search text into the
//!   ordered list a front end renders.
//!
//! # Invariants
//! - Views never mutate tasks.
//! - The same input always yields the same ordered output.

pub mod filter;

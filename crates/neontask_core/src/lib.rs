//! Core task-list state and reminder engine for neontask.
//! This crate is the single source of truth for task invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod reminder;
pub mod service;
pub mod storage;
pub mod view;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppConfig, ConfigError, ReminderConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{NewTask, Subtask, SubtaskId, Task, TaskId, TaskPatch};
pub use reminder::notify::{Notifier, NotifyError, Reminder, SoundPlayer, TerminalNotifier};
pub use reminder::poller::{reminder_state, ReminderPoller, ReminderState};
pub use reminder::runner::{EventLoop, LoopExit};
pub use service::command::{CommandOutcome, StoreCommand};
pub use service::task_store::{StoreError, StoreEvent, StoreResult, TaskStore};
pub use storage::kv::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
pub use storage::task_storage::{TaskStorage, TASKS_KEY};
pub use storage::{StorageError, StorageResult};
pub use view::filter::{visible_tasks, StatusFilter, ViewQuery};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

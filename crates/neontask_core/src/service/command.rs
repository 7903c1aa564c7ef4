//! Front-end commands routed through `TaskStore::apply`.

use crate::model::task::{NewTask, SubtaskId, TaskId, TaskPatch};

/// One user-initiated mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCommand {
    Create(NewTask),
    ToggleDone(TaskId),
    Delete(TaskId),
    Update(TaskId, TaskPatch),
    AddSubtask { task_id: TaskId, title: String },
    ToggleSubtask { task_id: TaskId, subtask_id: SubtaskId },
    RemoveSubtask { task_id: TaskId, subtask_id: SubtaskId },
}

/// Result of applying a `StoreCommand`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Created(TaskId),
    Applied,
    /// Blank title or unknown id; nothing changed and nothing was written.
    Ignored,
}

impl CommandOutcome {
    pub(crate) fn from_changed(changed: bool) -> Self {
        if changed {
            Self::Applied
        } else {
            Self::Ignored
        }
    }
}

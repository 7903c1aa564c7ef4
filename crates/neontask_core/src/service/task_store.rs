//! In-memory task collection with write-through persistence.
//!
//! # Responsibility
//! - Provide create/update/toggle/delete/mark-notified and subtask
//!   operations over the ordered collection (newest first).
//! - Persist the full collection after each successful mutation.
//! - Notify subscribers after a mutation has been persisted.
//!
//! # Invariants
//! - Task ids are unique within the collection.
//! - Blank titles and unknown ids are no-ops: no state change, no write.
//! - `notified` only moves from `false` to `true`, via `mark_notified`.
//! - On a failed write the in-memory change is kept and the error is
//!   returned; the next successful write re-syncs the whole collection.

use crate::clock::{Clock, SystemClock};
use crate::model::task::{
    normalize_description, normalize_title, NewTask, Subtask, SubtaskId, Task, TaskId, TaskPatch,
};
use crate::service::command::{CommandOutcome, StoreCommand};
use crate::storage::kv::KeyValueStore;
use crate::storage::task_storage::TaskStorage;
use crate::storage::StorageError;
use crate::view::filter::{visible_tasks, ViewQuery};
use chrono::{DateTime, Local};
use log::{debug, error};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Error returned by mutating store operations.
#[derive(Debug)]
pub enum StoreError {
    /// The mutation was applied in memory but could not be persisted.
    Persist(StorageError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Persist(err) => write!(f, "failed to persist tasks: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persist(err) => Some(err),
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Persist(value)
    }
}

/// Change notification delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Created(TaskId),
    Updated(TaskId),
    Deleted(TaskId),
    Notified(TaskId),
}

impl StoreEvent {
    fn name(self) -> &'static str {
        match self {
            Self::Created(_) => "task_create",
            Self::Updated(_) => "task_update",
            Self::Deleted(_) => "task_delete",
            Self::Notified(_) => "task_notified",
        }
    }

    pub fn task_id(self) -> TaskId {
        match self {
            Self::Created(id) | Self::Updated(id) | Self::Deleted(id) | Self::Notified(id) => id,
        }
    }
}

type Listener = Box<dyn FnMut(&StoreEvent)>;

/// Owner of the task collection.
pub struct TaskStore<K: KeyValueStore, C: Clock = SystemClock> {
    tasks: Vec<Task>,
    storage: TaskStorage<K>,
    clock: C,
    listeners: Vec<Listener>,
}

impl<K: KeyValueStore> TaskStore<K, SystemClock> {
    /// Restores the persisted collection using the system clock.
    pub fn open(storage: TaskStorage<K>) -> Self {
        Self::with_clock(storage, SystemClock)
    }
}

impl<K: KeyValueStore, C: Clock> TaskStore<K, C> {
    /// Restores the persisted collection; unreadable data yields an empty
    /// store.
    pub fn with_clock(storage: TaskStorage<K>, clock: C) -> Self {
        let tasks = storage.load();
        Self {
            tasks,
            storage,
            clock,
            listeners: Vec::new(),
        }
    }

    /// Registers a listener called after each persisted mutation.
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Creates a task and prepends it to the collection.
    ///
    /// Returns `Ok(None)` without any change when the title is blank.
    pub fn create(&mut self, request: NewTask) -> StoreResult<Option<Task>> {
        let Some(title) = normalize_title(&request.title) else {
            debug!("event=task_create module=store status=ignored reason=blank_title");
            return Ok(None);
        };

        let mut task = Task::new(self.next_id(), title);
        task.description = normalize_description(request.description);
        task.date = request.date;
        task.time = request.time;

        self.tasks.insert(0, task.clone());
        self.commit(StoreEvent::Created(task.id))?;
        Ok(Some(task))
    }

    /// Flips `done`; `Ok(false)` when the id is unknown.
    ///
    /// `notified` is left untouched.
    pub fn toggle_done(&mut self, id: TaskId) -> StoreResult<bool> {
        let Some(task) = self.find_mut(id) else {
            return Ok(false);
        };
        task.done = !task.done;
        self.commit(StoreEvent::Updated(id))?;
        Ok(true)
    }

    /// Removes a task; `Ok(false)` when the id is unknown.
    pub fn delete(&mut self, id: TaskId) -> StoreResult<bool> {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            return Ok(false);
        };
        self.tasks.remove(index);
        self.commit(StoreEvent::Deleted(id))?;
        Ok(true)
    }

    /// Shallow-merges `patch` into the task.
    ///
    /// `Ok(false)` when the id is unknown, the patch is empty or it carries
    /// a blank title; in all three cases nothing is written.
    pub fn update(&mut self, id: TaskId, patch: TaskPatch) -> StoreResult<bool> {
        if patch.is_empty() {
            debug!("event=task_update module=store status=ignored reason=empty_patch id={id}");
            return Ok(false);
        }
        let Some(task) = self.find_mut(id) else {
            return Ok(false);
        };
        if !task.apply_patch(patch) {
            debug!("event=task_update module=store status=ignored reason=blank_title id={id}");
            return Ok(false);
        }
        self.commit(StoreEvent::Updated(id))?;
        Ok(true)
    }

    /// Raises the one-way `notified` flag.
    ///
    /// Idempotent: `Ok(false)` and no write when already set or unknown.
    pub fn mark_notified(&mut self, id: TaskId) -> StoreResult<bool> {
        let Some(task) = self.find_mut(id) else {
            return Ok(false);
        };
        if task.notified {
            return Ok(false);
        }
        task.notified = true;
        self.commit(StoreEvent::Notified(id))?;
        Ok(true)
    }

    /// Appends an open subtask; `Ok(None)` for a blank title or unknown task.
    pub fn add_subtask(&mut self, task_id: TaskId, title: &str) -> StoreResult<Option<SubtaskId>> {
        let Some(title) = normalize_title(title) else {
            return Ok(None);
        };
        let Some(task) = self.find_mut(task_id) else {
            return Ok(None);
        };
        let subtask = Subtask::new(title);
        let subtask_id = subtask.id;
        task.subtasks.push(subtask);
        self.commit(StoreEvent::Updated(task_id))?;
        Ok(Some(subtask_id))
    }

    /// Flips a subtask's `done`; `Ok(false)` when either id is unknown.
    pub fn toggle_subtask(&mut self, task_id: TaskId, subtask_id: SubtaskId) -> StoreResult<bool> {
        let Some(subtask) = self
            .find_mut(task_id)
            .and_then(|task| task.subtasks.iter_mut().find(|sub| sub.id == subtask_id))
        else {
            return Ok(false);
        };
        subtask.done = !subtask.done;
        self.commit(StoreEvent::Updated(task_id))?;
        Ok(true)
    }

    /// Removes a subtask; `Ok(false)` when either id is unknown.
    pub fn remove_subtask(&mut self, task_id: TaskId, subtask_id: SubtaskId) -> StoreResult<bool> {
        let Some(task) = self.find_mut(task_id) else {
            return Ok(false);
        };
        let before = task.subtasks.len();
        task.subtasks.retain(|sub| sub.id != subtask_id);
        if task.subtasks.len() == before {
            return Ok(false);
        }
        self.commit(StoreEvent::Updated(task_id))?;
        Ok(true)
    }

    /// Dispatches a front-end command to the matching operation.
    pub fn apply(&mut self, command: StoreCommand) -> StoreResult<CommandOutcome> {
        let outcome = match command {
            StoreCommand::Create(request) => match self.create(request)? {
                Some(task) => CommandOutcome::Created(task.id),
                None => CommandOutcome::Ignored,
            },
            StoreCommand::ToggleDone(id) => CommandOutcome::from_changed(self.toggle_done(id)?),
            StoreCommand::Delete(id) => CommandOutcome::from_changed(self.delete(id)?),
            StoreCommand::Update(id, patch) => {
                CommandOutcome::from_changed(self.update(id, patch)?)
            }
            StoreCommand::AddSubtask { task_id, title } => {
                CommandOutcome::from_changed(self.add_subtask(task_id, &title)?.is_some())
            }
            StoreCommand::ToggleSubtask {
                task_id,
                subtask_id,
            } => CommandOutcome::from_changed(self.toggle_subtask(task_id, subtask_id)?),
            StoreCommand::RemoveSubtask {
                task_id,
                subtask_id,
            } => CommandOutcome::from_changed(self.remove_subtask(task_id, subtask_id)?),
        };
        Ok(outcome)
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Full collection in storage order (newest first).
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Filtered and ordered view for display.
    pub fn view(&self, query: &ViewQuery) -> Vec<&Task> {
        visible_tasks(&self.tasks, query)
    }

    /// Current time according to the store clock.
    pub fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    pub fn storage(&self) -> &TaskStorage<K> {
        &self.storage
    }

    fn find_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    /// Creation timestamp in milliseconds, bumped past any existing id.
    fn next_id(&self) -> TaskId {
        let candidate = self.clock.now().timestamp_millis();
        match self.tasks.iter().map(|task| task.id).max() {
            Some(max_id) if max_id >= candidate => max_id + 1,
            _ => candidate,
        }
    }

    fn commit(&mut self, event: StoreEvent) -> StoreResult<()> {
        if let Err(err) = self.storage.save(&self.tasks) {
            error!(
                "event={} module=store status=error id={} error={}",
                event.name(),
                event.task_id(),
                err
            );
            return Err(err.into());
        }

        debug!(
            "event={} module=store status=ok id={} count={}",
            event.name(),
            event.task_id(),
            self.tasks.len()
        );
        for listener in &mut self.listeners {
            listener(&event);
        }
        Ok(())
    }
}

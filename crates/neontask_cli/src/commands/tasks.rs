//! One-shot task commands.
//!
//! Each command runs against any `TaskStore` and returns the text to print,
//! so `watch` and the one-shot binary share the same wording. Unknown ids
//! are reported, never treated as failures.

use super::render::{print_tasks, task_block};
use super::Session;
use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveTime};
use log::info;
use neontask_core::{
    Clock, KeyValueStore, NewTask, StatusFilter, SubtaskId, Task, TaskId, TaskPatch, TaskStore,
    ViewQuery,
};

const BLANK_TITLE: &str = "Title must not be blank; nothing was changed.";

pub fn add(
    session: &Session,
    title: String,
    description: Option<String>,
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
) -> Result<()> {
    let mut request = NewTask::new(title);
    if let Some(description) = description {
        request = request.description(description);
    }
    if let Some(date) = date {
        request = request.scheduled(date, time);
    }

    let mut store = session.store();
    match store.create(request)? {
        Some(task) => {
            info!("event=cli_add module=cli status=ok id={}", task.id);
            println!("Created {}", task_block(&task));
        }
        None => println!("{BLANK_TITLE}"),
    }
    Ok(())
}

pub fn list(session: &Session, status: StatusFilter, search: &str) -> Result<()> {
    let store = session.store();
    print_tasks(store.view(&ViewQuery::new(status, search)));
    Ok(())
}

pub fn toggle(session: &Session, id: TaskId) -> Result<()> {
    println!("{}", toggle_task(&mut session.store(), id)?);
    Ok(())
}

pub fn edit(session: &Session, id: TaskId, patch: TaskPatch) -> Result<()> {
    println!("{}", edit_task(&mut session.store(), id, patch)?);
    Ok(())
}

pub fn delete(session: &Session, id: TaskId) -> Result<()> {
    println!("{}", delete_task(&mut session.store(), id)?);
    Ok(())
}

pub fn add_subtask(session: &Session, task_id: TaskId, title: &str) -> Result<()> {
    println!("{}", add_subtask_to(&mut session.store(), task_id, title)?);
    Ok(())
}

pub fn toggle_subtask(session: &Session, task_id: TaskId, reference: &str) -> Result<()> {
    println!("{}", toggle_subtask_of(&mut session.store(), task_id, reference)?);
    Ok(())
}

pub fn remove_subtask(session: &Session, task_id: TaskId, reference: &str) -> Result<()> {
    println!("{}", remove_subtask_of(&mut session.store(), task_id, reference)?);
    Ok(())
}

/// Runs one reminder poll; fired alerts are printed by the notifier.
pub fn check(session: &Session) -> Result<()> {
    let mut store = session.store();
    let mut poller = session.poller();
    let fired = poller.check(&mut store)?;
    if fired.is_empty() {
        println!("No reminders due.");
    }
    Ok(())
}

pub fn toggle_task<K: KeyValueStore, C: Clock>(
    store: &mut TaskStore<K, C>,
    id: TaskId,
) -> Result<String> {
    if !store.toggle_done(id)? {
        return Ok(no_task(id));
    }
    Ok(current_block(store, id))
}

pub fn edit_task<K: KeyValueStore, C: Clock>(
    store: &mut TaskStore<K, C>,
    id: TaskId,
    patch: TaskPatch,
) -> Result<String> {
    if patch.is_empty() {
        return Ok("Nothing to change; pass at least one field.".to_string());
    }
    if store.get(id).is_none() {
        return Ok(no_task(id));
    }
    if !store.update(id, patch)? {
        return Ok(BLANK_TITLE.to_string());
    }
    Ok(current_block(store, id))
}

pub fn delete_task<K: KeyValueStore, C: Clock>(
    store: &mut TaskStore<K, C>,
    id: TaskId,
) -> Result<String> {
    if !store.delete(id)? {
        return Ok(no_task(id));
    }
    Ok(format!("Deleted {id}"))
}

pub fn add_subtask_to<K: KeyValueStore, C: Clock>(
    store: &mut TaskStore<K, C>,
    task_id: TaskId,
    title: &str,
) -> Result<String> {
    if store.get(task_id).is_none() {
        return Ok(no_task(task_id));
    }
    Ok(match store.add_subtask(task_id, title)? {
        Some(subtask_id) => format!("Added subtask {subtask_id}"),
        None => BLANK_TITLE.to_string(),
    })
}

pub fn toggle_subtask_of<K: KeyValueStore, C: Clock>(
    store: &mut TaskStore<K, C>,
    task_id: TaskId,
    reference: &str,
) -> Result<String> {
    let Some(subtask_id) = resolve_subtask(store.get(task_id), reference)? else {
        return Ok(no_subtask(task_id, reference));
    };
    store.toggle_subtask(task_id, subtask_id)?;
    Ok(current_block(store, task_id))
}

pub fn remove_subtask_of<K: KeyValueStore, C: Clock>(
    store: &mut TaskStore<K, C>,
    task_id: TaskId,
    reference: &str,
) -> Result<String> {
    let Some(subtask_id) = resolve_subtask(store.get(task_id), reference)? else {
        return Ok(no_subtask(task_id, reference));
    };
    store.remove_subtask(task_id, subtask_id)?;
    Ok(format!("Removed subtask {subtask_id}"))
}

/// Accepts a 1-based position or a full subtask id.
///
/// `Ok(None)` when the task or the subtask does not exist; `Err` only for
/// text that is neither a number nor an id.
pub fn resolve_subtask(task: Option<&Task>, reference: &str) -> Result<Option<SubtaskId>> {
    let reference = reference.trim();
    let parsed = match reference.parse::<usize>() {
        Ok(position) => SubtaskRef::Position(position),
        Err(_) => SubtaskRef::Id(
            reference
                .parse()
                .map_err(|_| anyhow!("`{reference}` is neither a position nor a subtask id"))?,
        ),
    };

    let Some(task) = task else {
        return Ok(None);
    };
    let found = match parsed {
        SubtaskRef::Position(position) => position
            .checked_sub(1)
            .and_then(|index| task.subtasks.get(index)),
        SubtaskRef::Id(id) => task.subtasks.iter().find(|subtask| subtask.id == id),
    };
    Ok(found.map(|subtask| subtask.id))
}

enum SubtaskRef {
    Position(usize),
    Id(SubtaskId),
}

fn current_block<K: KeyValueStore, C: Clock>(store: &TaskStore<K, C>, id: TaskId) -> String {
    store.get(id).map(task_block).unwrap_or_else(|| no_task(id))
}

fn no_task(id: TaskId) -> String {
    format!("No task with id {id}; nothing changed.")
}

fn no_subtask(task_id: TaskId, reference: &str) -> String {
    format!("Task {task_id} has no subtask `{reference}`; nothing changed.")
}

#[cfg(test)]
mod tests {
    use super::{
        delete_task, edit_task, remove_subtask_of, resolve_subtask, toggle_subtask_of,
        toggle_task,
    };
    use neontask_core::{
        KeyValueStore, MemoryKeyValueStore, NewTask, Subtask, Task, TaskPatch, TaskStorage,
        TaskStore, TASKS_KEY,
    };

    fn parent() -> Task {
        let mut task = Task::new(1, "parent");
        task.subtasks.push(Subtask::new("first"));
        task.subtasks.push(Subtask::new("second"));
        task
    }

    #[test]
    fn resolves_by_position_and_by_id() {
        let task = parent();
        assert_eq!(
            resolve_subtask(Some(&task), "2").unwrap(),
            Some(task.subtasks[1].id)
        );
        let by_id = task.subtasks[0].id.to_string();
        assert_eq!(
            resolve_subtask(Some(&task), &by_id).unwrap(),
            Some(task.subtasks[0].id)
        );
    }

    #[test]
    fn missing_subtask_is_none_and_garbage_is_error() {
        let task = parent();
        assert_eq!(resolve_subtask(Some(&task), "0").unwrap(), None);
        assert_eq!(resolve_subtask(Some(&task), "3").unwrap(), None);
        assert_eq!(resolve_subtask(None, "1").unwrap(), None);
        assert!(resolve_subtask(Some(&task), "nope").is_err());
    }

    #[test]
    fn unknown_ids_are_reported_without_failing() {
        let kv = MemoryKeyValueStore::new();
        let mut store = TaskStore::open(TaskStorage::new(&kv));
        store.create(NewTask::new("only")).unwrap();
        let raw_before = kv.get(TASKS_KEY).unwrap();

        assert!(toggle_task(&mut store, 404).unwrap().starts_with("No task with id 404"));
        assert!(delete_task(&mut store, 404).unwrap().starts_with("No task with id 404"));
        let patch = TaskPatch::default().title("renamed");
        assert!(edit_task(&mut store, 404, patch).unwrap().starts_with("No task with id 404"));
        assert!(toggle_subtask_of(&mut store, 404, "1").unwrap().contains("nothing changed"));
        assert!(remove_subtask_of(&mut store, 404, "1").unwrap().contains("nothing changed"));

        assert_eq!(kv.get(TASKS_KEY).unwrap(), raw_before);
    }

    #[test]
    fn edit_reports_blank_title_and_applies_fields() {
        let kv = MemoryKeyValueStore::new();
        let mut store = TaskStore::open(TaskStorage::new(&kv));
        let task = store.create(NewTask::new("draft")).unwrap().unwrap();

        let blank = edit_task(&mut store, task.id, TaskPatch::default().title("  ")).unwrap();
        assert!(blank.starts_with("Title must not be blank"));

        let shown = edit_task(&mut store, task.id, TaskPatch::default().title("final")).unwrap();
        assert!(shown.contains("final"));
        assert_eq!(store.get(task.id).unwrap().title, "final");
    }
}

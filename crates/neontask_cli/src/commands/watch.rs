//! Interactive session: reminder polling plus line commands on stdin.
//!
//! # Invariants
//! - Store mutations and polls run on one thread, one turn at a time.
//! - Closing stdin stops command input but not polling; Ctrl-C or `quit`
//!   ends the session.
//! - The session saves its whole in-memory collection, so writes made by
//!   other processes meanwhile are overwritten. Edits belong here.

use super::render::print_tasks;
use super::tasks::resolve_subtask;
use super::Session;
use anyhow::{Context, Result};
use log::{info, warn};
use neontask_core::model::task::{parse_date, parse_time};
use neontask_core::{
    Clock, CommandOutcome, EventLoop, KeyValueStore, LoopExit, NewTask, StatusFilter,
    StoreCommand, StoreResult, TaskId, TaskPatch, TaskStore, ViewQuery,
};
use std::ops::ControlFlow;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const HELP: &str = "\
commands:
  add [YYYY-MM-DD [HH:MM]] <title>   create a task
  toggle <id>                        flip done/open
  delete <id>                        remove a task
  edit <id> title <text>             rename a task
  edit <id> desc|date|time <value>   set a field; `-` clears it
  sub add <id> <title>               append a subtask
  sub toggle|rm <id> <n|subtask-id>  flip or remove a subtask
  list [all|done|pending]            show tasks
  help                               show this text
  quit                               leave the session

Changes made by other neontask processes while this session runs are not
picked up and will be overwritten; make edits here instead.";

/// One parsed stdin line.
#[derive(Debug, PartialEq, Eq)]
enum WatchInput {
    Command(StoreCommand),
    /// Subtask addressed by position or id; resolved against the store.
    Subtask {
        task_id: TaskId,
        reference: String,
        action: SubtaskAction,
    },
    List(StatusFilter),
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubtaskAction {
    Toggle,
    Remove,
}

pub fn run(session: &Session) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let exit = runtime.block_on(watch(session));
    // A pending stdin read would otherwise hold shutdown until the next line.
    runtime.shutdown_background();

    info!("event=cli_watch module=cli status=stop exit={:?}", exit);
    Ok(())
}

async fn watch(session: &Session) -> LoopExit {
    let mut store = session.store();
    let mut poller = session.poller();
    let cancel = CancellationToken::new();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(read_lines(tx));
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    println!("Watching reminders. Type `help` for commands, Ctrl-C to stop.");
    let event_loop = EventLoop::new(session.config.reminder.poll_interval(), cancel);
    event_loop.run(&mut store, &mut poller, rx, handle_line).await
}

async fn read_lines(tx: mpsc::UnboundedSender<String>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(line).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                warn!("event=cli_stdin module=cli status=error error={}", err);
                break;
            }
        }
    }
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => cancel.cancel(),
        Err(err) => warn!("event=cli_signal module=cli status=error error={}", err),
    }
}

fn handle_line<K: KeyValueStore, C: Clock>(
    store: &mut TaskStore<K, C>,
    line: String,
) -> ControlFlow<()> {
    let input = match parse_line(&line) {
        Ok(Some(input)) => input,
        Ok(None) => return ControlFlow::Continue(()),
        Err(message) => {
            eprintln!("{message}");
            return ControlFlow::Continue(());
        }
    };

    match input {
        WatchInput::Quit => return ControlFlow::Break(()),
        WatchInput::Help => println!("{HELP}"),
        WatchInput::List(status) => print_tasks(store.view(&ViewQuery::new(status, ""))),
        WatchInput::Command(command) => report(store.apply(command)),
        WatchInput::Subtask {
            task_id,
            reference,
            action,
        } => match resolve_subtask(store.get(task_id), &reference) {
            Ok(Some(subtask_id)) => {
                let command = match action {
                    SubtaskAction::Toggle => StoreCommand::ToggleSubtask {
                        task_id,
                        subtask_id,
                    },
                    SubtaskAction::Remove => StoreCommand::RemoveSubtask {
                        task_id,
                        subtask_id,
                    },
                };
                report(store.apply(command));
            }
            Ok(None) => report(Ok(CommandOutcome::Ignored)),
            Err(err) => eprintln!("{err}"),
        },
    }
    ControlFlow::Continue(())
}

fn report(outcome: StoreResult<CommandOutcome>) {
    match outcome {
        Ok(CommandOutcome::Created(id)) => println!("Created {id}"),
        Ok(CommandOutcome::Applied) => println!("OK"),
        Ok(CommandOutcome::Ignored) => println!("Nothing changed (blank title or unknown id)."),
        Err(err) => eprintln!("error: {err}"),
    }
}

/// `Ok(None)` for blank lines.
fn parse_line(line: &str) -> Result<Option<WatchInput>, String> {
    let (verb, rest) = split_word(line);

    let input = match verb {
        "" => return Ok(None),
        "quit" | "exit" => WatchInput::Quit,
        "help" | "?" => WatchInput::Help,
        "list" | "ls" => {
            let status = if rest.is_empty() {
                StatusFilter::All
            } else {
                rest.parse().map_err(|err| format!("{err}"))?
            };
            WatchInput::List(status)
        }
        "add" => WatchInput::Command(StoreCommand::Create(parse_new_task(rest))),
        "toggle" | "done" => WatchInput::Command(StoreCommand::ToggleDone(parse_id(rest)?)),
        "delete" | "rm" => WatchInput::Command(StoreCommand::Delete(parse_id(rest)?)),
        "edit" => parse_edit(rest)?,
        "sub" | "subtask" => parse_subtask(rest)?,
        other => return Err(format!("unknown command `{other}`; type `help`")),
    };
    Ok(Some(input))
}

fn parse_id(text: &str) -> Result<TaskId, String> {
    text.parse()
        .map_err(|_| format!("expected a task id, got `{text}`"))
}

/// `<id> <field> <value>`; one field per line.
fn parse_edit(rest: &str) -> Result<WatchInput, String> {
    const USAGE: &str = "usage: edit <id> title|desc|date|time <value>";
    let (id, rest) = split_word(rest);
    let (field, value) = split_word(rest);
    let id = parse_id(id)?;
    let cleared = value == "-";

    let patch = match field {
        "title" => TaskPatch::default().title(value),
        "desc" | "description" => {
            TaskPatch::default().description((!cleared).then(|| value.to_string()))
        }
        "date" if cleared => TaskPatch::default().date(None),
        "date" => TaskPatch::default().date(Some(
            parse_date(value).ok_or_else(|| format!("`{value}` is not a YYYY-MM-DD date"))?,
        )),
        "time" if cleared => TaskPatch::default().time(None),
        "time" => TaskPatch::default().time(Some(
            parse_time(value).ok_or_else(|| format!("`{value}` is not an HH:MM time"))?,
        )),
        _ => return Err(USAGE.to_string()),
    };
    Ok(WatchInput::Command(StoreCommand::Update(id, patch)))
}

/// `add <id> <title>` or `toggle|rm <id> <position|subtask-id>`.
fn parse_subtask(rest: &str) -> Result<WatchInput, String> {
    const USAGE: &str = "usage: sub add|toggle|rm <id> <title|position>";
    let (action, rest) = split_word(rest);
    let (id, tail) = split_word(rest);
    let task_id = parse_id(id)?;

    let action = match action {
        "add" => {
            return Ok(WatchInput::Command(StoreCommand::AddSubtask {
                task_id,
                title: tail.to_string(),
            }))
        }
        "toggle" | "done" => SubtaskAction::Toggle,
        "rm" | "remove" => SubtaskAction::Remove,
        _ => return Err(USAGE.to_string()),
    };
    if tail.is_empty() {
        return Err(USAGE.to_string());
    }
    Ok(WatchInput::Subtask {
        task_id,
        reference: tail.to_string(),
        action,
    })
}

/// First whitespace-separated word and the trimmed remainder.
fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

/// Leading date and time tokens schedule the task; the rest is the title.
fn parse_new_task(rest: &str) -> NewTask {
    let mut tokens = rest.split_whitespace().peekable();
    let date = tokens.peek().and_then(|token| parse_date(token));
    if date.is_some() {
        tokens.next();
    }
    let time = date.and(tokens.peek().and_then(|token| parse_time(token)));
    if time.is_some() {
        tokens.next();
    }

    let title = tokens.collect::<Vec<_>>().join(" ");
    let request = NewTask::new(title);
    match date {
        Some(date) => request.scheduled(date, time),
        None => request,
    }
}

#[cfg(test)]
mod tests {
    use super::{handle_line, parse_line, SubtaskAction, WatchInput};
    use chrono::{NaiveDate, NaiveTime};
    use neontask_core::{
        MemoryKeyValueStore, NewTask, StatusFilter, StoreCommand, TaskPatch, TaskStorage,
        TaskStore,
    };
    use std::ops::ControlFlow;

    #[test]
    fn add_with_schedule_prefix() {
        let parsed = parse_line("add 2030-05-01 10:00 Team  sync").unwrap();
        let expected = NewTask::new("Team sync").scheduled(
            NaiveDate::from_ymd_opt(2030, 5, 1).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0),
        );
        assert_eq!(
            parsed,
            Some(WatchInput::Command(StoreCommand::Create(expected)))
        );
    }

    #[test]
    fn time_without_date_stays_in_title() {
        let parsed = parse_line("add 10:00 standup").unwrap();
        assert_eq!(
            parsed,
            Some(WatchInput::Command(StoreCommand::Create(NewTask::new(
                "10:00 standup"
            ))))
        );
    }

    #[test]
    fn simple_verbs() {
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("quit").unwrap(), Some(WatchInput::Quit));
        assert_eq!(
            parse_line("toggle 42").unwrap(),
            Some(WatchInput::Command(StoreCommand::ToggleDone(42)))
        );
        assert_eq!(
            parse_line("list PENDING").unwrap(),
            Some(WatchInput::List(StatusFilter::Pending))
        );
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(parse_line("toggle abc").is_err());
        assert!(parse_line("list later").is_err());
        assert!(parse_line("fly away").is_err());
    }

    #[test]
    fn edit_sets_or_clears_one_field() {
        assert_eq!(
            parse_line("edit 7 title Call the  bank").unwrap(),
            Some(WatchInput::Command(StoreCommand::Update(
                7,
                TaskPatch::default().title("Call the  bank")
            )))
        );
        assert_eq!(
            parse_line("edit 7 date 2030-05-01").unwrap(),
            Some(WatchInput::Command(StoreCommand::Update(
                7,
                TaskPatch::default().date(NaiveDate::from_ymd_opt(2030, 5, 1))
            )))
        );
        assert_eq!(
            parse_line("edit 7 desc -").unwrap(),
            Some(WatchInput::Command(StoreCommand::Update(
                7,
                TaskPatch::default().description(None)
            )))
        );
        assert_eq!(
            parse_line("edit 7 time -").unwrap(),
            Some(WatchInput::Command(StoreCommand::Update(
                7,
                TaskPatch::default().time(None)
            )))
        );
        assert!(parse_line("edit 7 time noon").is_err());
        assert!(parse_line("edit 7 colour red").is_err());
        assert!(parse_line("edit seven title x").is_err());
    }

    #[test]
    fn subtask_verbs() {
        assert_eq!(
            parse_line("sub add 7 buy stamps").unwrap(),
            Some(WatchInput::Command(StoreCommand::AddSubtask {
                task_id: 7,
                title: "buy stamps".to_string(),
            }))
        );
        assert_eq!(
            parse_line("sub toggle 7 2").unwrap(),
            Some(WatchInput::Subtask {
                task_id: 7,
                reference: "2".to_string(),
                action: SubtaskAction::Toggle,
            })
        );
        assert_eq!(
            parse_line("sub rm 7 1").unwrap(),
            Some(WatchInput::Subtask {
                task_id: 7,
                reference: "1".to_string(),
                action: SubtaskAction::Remove,
            })
        );
        assert!(parse_line("sub rm 7").is_err());
        assert!(parse_line("sub move 7 1").is_err());
    }

    #[test]
    fn session_lines_edit_the_store_in_place() {
        let kv = MemoryKeyValueStore::new();
        let mut store = TaskStore::open(TaskStorage::new(&kv));
        let id = store.create(NewTask::new("draft")).unwrap().unwrap().id;

        for line in [
            format!("edit {id} title Final"),
            format!("edit {id} desc with notes"),
            format!("sub add {id} first"),
            format!("sub add {id} second"),
            format!("sub toggle {id} 2"),
            format!("sub rm {id} 1"),
            "sub toggle 404 1".to_string(),
        ] {
            assert_eq!(handle_line(&mut store, line), ControlFlow::Continue(()));
        }

        let task = store.get(id).unwrap();
        assert_eq!(task.title, "Final");
        assert_eq!(task.description.as_deref(), Some("with notes"));
        assert_eq!(task.subtasks.len(), 1);
        assert_eq!(task.subtasks[0].title, "second");
        assert!(task.subtasks[0].done);

        let reopened = TaskStore::open(TaskStorage::new(&kv));
        assert_eq!(reopened.tasks(), store.tasks());
        assert_eq!(
            handle_line(&mut store, "quit".to_string()),
            ControlFlow::Break(())
        );
    }
}

use neontask_core::Task;

/// One task per block: status box, id, title, schedule, then details.
pub fn task_block(task: &Task) -> String {
    let mut out = format!(
        "[{}] {}  {}",
        if task.done { 'x' } else { ' ' },
        task.id,
        task.title
    );
    if let Some(date) = task.date {
        out.push_str(&format!("  @ {}", date.format("%Y-%m-%d")));
        if let Some(time) = task.time {
            out.push_str(&format!(" {}", time.format("%H:%M")));
        }
    }
    if task.notified {
        out.push_str("  (notified)");
    }
    if let Some(description) = &task.description {
        out.push_str(&format!("\n      {description}"));
    }
    for (index, subtask) in task.subtasks.iter().enumerate() {
        out.push_str(&format!(
            "\n      {}. [{}] {}  ({})",
            index + 1,
            if subtask.done { 'x' } else { ' ' },
            subtask.title,
            subtask.id
        ));
    }
    out
}

pub fn print_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) {
    let mut empty = true;
    for task in tasks {
        empty = false;
        println!("{}", task_block(task));
    }
    if empty {
        println!("No tasks.");
    }
}

//! `neontask` command-line front end.
//!
//! # Responsibility
//! - Map subcommands onto `TaskStore` operations over the profile database.
//! - Host the interactive `watch` loop that polls reminders while reading
//!   commands from stdin.

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use neontask_core::{StatusFilter, TaskId, TaskPatch};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "neontask")]
#[command(about = "Personal task list with time-based reminders", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: <config_dir>/neontask/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file, overriding the configured one
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a task
    Add {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// YYYY-MM-DD
        #[arg(long, value_parser = commands::parse_date_arg)]
        date: Option<NaiveDate>,
        /// HH:MM
        #[arg(long, requires = "date", value_parser = commands::parse_time_arg)]
        time: Option<NaiveTime>,
    },
    /// Show tasks, scheduled first
    List {
        /// all | done | pending
        #[arg(short, long, default_value_t = StatusFilter::All)]
        status: StatusFilter,
        /// Case-insensitive text over title and description
        #[arg(short = 'q', long, default_value = "")]
        search: String,
    },
    /// Flip a task between open and done
    Toggle { id: TaskId },
    /// Change fields of a task
    Edit(EditArgs),
    /// Remove a task
    Delete { id: TaskId },
    /// Manage the checklist of a task
    Subtask {
        #[command(subcommand)]
        action: SubtaskAction,
    },
    /// Run a single reminder check and exit
    Check,
    /// Poll reminders continuously and accept commands on stdin
    Watch,
}

#[derive(Args)]
struct EditArgs {
    id: TaskId,
    #[arg(long)]
    title: Option<String>,
    #[arg(short, long, conflicts_with = "clear_description")]
    description: Option<String>,
    #[arg(long)]
    clear_description: bool,
    #[arg(long, value_parser = commands::parse_date_arg, conflicts_with = "clear_date")]
    date: Option<NaiveDate>,
    #[arg(long)]
    clear_date: bool,
    #[arg(long, value_parser = commands::parse_time_arg, conflicts_with = "clear_time")]
    time: Option<NaiveTime>,
    #[arg(long)]
    clear_time: bool,
}

#[derive(Subcommand)]
enum SubtaskAction {
    /// Append a subtask
    Add { task: TaskId, title: String },
    /// Flip a subtask; SUBTASK is its position (1-based) or id
    Toggle { task: TaskId, subtask: String },
    /// Remove a subtask; SUBTASK is its position (1-based) or id
    Remove { task: TaskId, subtask: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let session = commands::Session::start(cli.config.as_deref(), cli.db.as_deref())?;

    match cli.command {
        Commands::Add {
            title,
            description,
            date,
            time,
        } => commands::tasks::add(&session, title, description, date, time)?,
        Commands::List { status, search } => commands::tasks::list(&session, status, &search)?,
        Commands::Toggle { id } => commands::tasks::toggle(&session, id)?,
        Commands::Edit(args) => {
            let id = args.id;
            commands::tasks::edit(&session, id, args.into_patch())?
        }
        Commands::Delete { id } => commands::tasks::delete(&session, id)?,
        Commands::Subtask { action } => match action {
            SubtaskAction::Add { task, title } => {
                commands::tasks::add_subtask(&session, task, &title)?
            }
            SubtaskAction::Toggle { task, subtask } => {
                commands::tasks::toggle_subtask(&session, task, &subtask)?
            }
            SubtaskAction::Remove { task, subtask } => {
                commands::tasks::remove_subtask(&session, task, &subtask)?
            }
        },
        Commands::Check => commands::tasks::check(&session)?,
        Commands::Watch => commands::watch::run(&session)?,
    }

    Ok(())
}

impl EditArgs {
    fn into_patch(self) -> TaskPatch {
        TaskPatch {
            title: self.title,
            description: clearable(self.description, self.clear_description),
            date: clearable(self.date, self.clear_date),
            time: clearable(self.time, self.clear_time),
            ..TaskPatch::default()
        }
    }
}

/// `Some(None)` clears, `Some(Some(_))` sets, `None` leaves the field alone.
fn clearable<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

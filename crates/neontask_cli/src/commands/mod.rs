pub mod render;
pub mod tasks;
pub mod watch;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use neontask_core::db::open_db;
use neontask_core::model::task::{parse_date, parse_time};
use neontask_core::{
    init_logging, AppConfig, ReminderPoller, SoundPlayer, SqliteKeyValueStore, TaskStorage,
    TaskStore, TerminalNotifier,
};
use rusqlite::Connection;
use std::io::Stdout;
use std::path::Path;

/// Loaded configuration plus the open profile database.
pub struct Session {
    pub config: AppConfig,
    conn: Connection,
}

impl Session {
    pub fn start(config_path: Option<&Path>, db_override: Option<&Path>) -> Result<Self> {
        let config = AppConfig::load(config_path).context("Failed to load configuration")?;

        match config.log_dir() {
            Ok(log_dir) => {
                if let Err(err) = init_logging(config.log_level(), &log_dir) {
                    eprintln!("warning: file logging disabled: {err}");
                }
            }
            Err(err) => eprintln!("warning: file logging disabled: {err}"),
        }

        let db_path = match db_override {
            Some(path) => path.to_path_buf(),
            None => config.db_path()?,
        };
        let conn = open_db(&db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;

        Ok(Self { config, conn })
    }

    pub fn store(&self) -> TaskStore<SqliteKeyValueStore<'_>> {
        TaskStore::open(TaskStorage::new(SqliteKeyValueStore::new(&self.conn)))
    }

    pub fn poller(&self) -> ReminderPoller<TerminalNotifier<Stdout>> {
        let reminder = &self.config.reminder;
        let sound = SoundPlayer::new(reminder.sound_player.clone(), reminder.sound_path.clone());
        if !sound.asset().exists() {
            log::warn!(
                "event=sound_asset module=cli status=missing path={}",
                sound.asset().display()
            );
        }
        ReminderPoller::new(TerminalNotifier::new(sound, std::io::stdout()))
            .with_tolerance(reminder.tolerance())
    }
}

pub fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    parse_date(value).ok_or_else(|| format!("`{value}` is not a YYYY-MM-DD date"))
}

pub fn parse_time_arg(value: &str) -> Result<NaiveTime, String> {
    parse_time(value).ok_or_else(|| format!("`{value}` is not an HH:MM time"))
}

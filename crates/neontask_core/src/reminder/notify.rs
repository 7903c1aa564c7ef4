//! Reminder side effects: sound and user-facing alert.
//!
//! # Responsibility
//! - Render the reminder alert text.
//! - Play the reminder sound through an external player, best effort.
//!
//! # Invariants
//! - Alert text is `⏰ Lembrete: <title> — <DD/MM/YYYY, HH:MM:SS>`.
//! - Sound playback never blocks the caller on the player process.
//! - Finished player processes are reaped on the next play, so a long
//!   session does not accumulate zombies.

use crate::model::task::{Task, TaskId};
use chrono::NaiveDateTime;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

/// Localized date-time layout used in alerts.
pub const ALERT_DATE_TIME_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// A reminder ready to be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub task_id: TaskId,
    pub title: String,
    pub scheduled_at: NaiveDateTime,
}

impl Reminder {
    /// Builds a reminder for a scheduled task; `None` when undated.
    pub fn for_task(task: &Task) -> Option<Self> {
        task.scheduled_at().map(|scheduled_at| Self {
            task_id: task.id,
            title: task.title.clone(),
            scheduled_at,
        })
    }

    pub fn message(&self) -> String {
        format!(
            "⏰ Lembrete: {} — {}",
            self.title,
            self.scheduled_at.format(ALERT_DATE_TIME_FORMAT)
        )
    }
}

#[derive(Debug)]
pub enum NotifyError {
    /// No player command is configured and the platform has no default.
    NoPlayer,
    AssetMissing(PathBuf),
    Spawn {
        player: String,
        source: std::io::Error,
    },
    Alert(std::io::Error),
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPlayer => write!(f, "no sound player available"),
            Self::AssetMissing(path) => write!(f, "sound asset not found: {}", path.display()),
            Self::Spawn { player, source } => {
                write!(f, "failed to start sound player `{player}`: {source}")
            }
            Self::Alert(err) => write!(f, "failed to deliver alert: {err}"),
        }
    }
}

impl Error for NotifyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            Self::Alert(err) => Some(err),
            Self::NoPlayer | Self::AssetMissing(_) => None,
        }
    }
}

/// Reminder delivery channel used by the poller.
pub trait Notifier {
    /// Best-effort audio cue; callers ignore failures.
    fn play_sound(&mut self) -> Result<(), NotifyError>;
    /// User-facing alert for one reminder.
    fn alert(&mut self, reminder: &Reminder) -> Result<(), NotifyError>;
}

/// Plays an audio asset by spawning an external player command.
#[derive(Debug)]
pub struct SoundPlayer {
    player: Option<String>,
    asset: PathBuf,
    children: Vec<Child>,
}

impl SoundPlayer {
    /// `player` is a command line such as `afplay` or `mpv --no-video`;
    /// `None` picks the platform default.
    pub fn new(player: Option<String>, asset: impl Into<PathBuf>) -> Self {
        Self {
            player: player.filter(|value| !value.trim().is_empty()),
            asset: asset.into(),
            children: Vec::new(),
        }
    }

    pub fn asset(&self) -> &Path {
        &self.asset
    }

    /// Spawns the player and returns without waiting for it.
    pub fn play(&mut self) -> Result<(), NotifyError> {
        self.reap();
        if !self.asset.exists() {
            return Err(NotifyError::AssetMissing(self.asset.clone()));
        }

        let command_line = self
            .player
            .as_deref()
            .or_else(|| default_player())
            .ok_or(NotifyError::NoPlayer)?;
        let mut parts = command_line.split_whitespace();
        let program = parts.next().ok_or(NotifyError::NoPlayer)?;

        let child = Command::new(program)
            .args(parts)
            .arg(&self.asset)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| NotifyError::Spawn {
                player: command_line.to_string(),
                source,
            })?;
        self.children.push(child);
        Ok(())
    }

    /// Player processes spawned by `play` that have not exited yet.
    pub fn running(&mut self) -> usize {
        self.reap();
        self.children.len()
    }

    fn reap(&mut self) {
        // `try_wait` collects the exit status of finished children.
        self.children.retain_mut(|child| matches!(child.try_wait(), Ok(None)));
    }
}

fn default_player() -> Option<&'static str> {
    if cfg!(target_os = "macos") {
        Some("afplay")
    } else if cfg!(target_os = "linux") {
        Some("paplay")
    } else {
        None
    }
}

/// Writes alerts as lines (with a terminal bell) and plays a sound.
pub struct TerminalNotifier<W: Write> {
    sound: SoundPlayer,
    out: W,
}

impl<W: Write> TerminalNotifier<W> {
    pub fn new(sound: SoundPlayer, out: W) -> Self {
        Self { sound, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Notifier for TerminalNotifier<W> {
    fn play_sound(&mut self) -> Result<(), NotifyError> {
        self.sound.play()
    }

    fn alert(&mut self, reminder: &Reminder) -> Result<(), NotifyError> {
        writeln!(self.out, "\x07{}", reminder.message()).map_err(NotifyError::Alert)?;
        self.out.flush().map_err(NotifyError::Alert)
    }
}

#[cfg(test)]
mod tests {
    use super::{Notifier, NotifyError, Reminder, SoundPlayer, TerminalNotifier};
    use crate::model::task::{parse_date, parse_time, Task};

    fn reminder() -> Reminder {
        let mut task = Task::new(42, "Reunião");
        task.date = parse_date("2099-01-01");
        task.time = parse_time("09:00");
        Reminder::for_task(&task).expect("dated task yields a reminder")
    }

    #[test]
    fn message_uses_alert_template() {
        assert_eq!(
            reminder().message(),
            "⏰ Lembrete: Reunião — 01/01/2099, 09:00:00"
        );
    }

    #[test]
    fn undated_task_has_no_reminder() {
        assert!(Reminder::for_task(&Task::new(1, "someday")).is_none());
    }

    #[test]
    fn missing_asset_is_reported() {
        let mut player = SoundPlayer::new(Some("true".to_string()), "/definitely/missing.mp3");
        assert!(matches!(player.play(), Err(NotifyError::AssetMissing(_))));
        assert_eq!(player.running(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn finished_players_are_reaped() {
        let dir = tempfile::tempdir().unwrap();
        let asset = dir.path().join("notify.mp3");
        std::fs::write(&asset, b"").unwrap();
        let mut player = SoundPlayer::new(Some("true".to_string()), asset);

        player.play().unwrap();
        player.play().unwrap();

        let mut running = player.running();
        for _ in 0..100 {
            if running == 0 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
            running = player.running();
        }
        assert_eq!(running, 0);
    }

    #[test]
    fn terminal_alert_writes_one_line() {
        let player = SoundPlayer::new(None, "/definitely/missing.mp3");
        let mut notifier = TerminalNotifier::new(player, Vec::new());
        notifier.alert(&reminder()).unwrap();

        let written = String::from_utf8(notifier.into_inner()).unwrap();
        assert!(written.starts_with('\x07'));
        assert!(written.ends_with('\n'));
        assert_eq!(written.lines().count(), 1);
    }
}

//! Single-threaded event loop shared by front-end input and reminder polls.
//!
//! # Responsibility
//! - Poll for due reminders once immediately and then on a fixed interval.
//! - Interleave front-end inputs with polls as discrete turns.
//! - Release the interval when cancelled or when the front end quits.
//!
//! # Invariants
//! - The store is borrowed by exactly one turn at a time; no locking.
//! - Poll failures are logged and never end the loop.

use crate::clock::Clock;
use crate::reminder::notify::Notifier;
use crate::reminder::poller::ReminderPoller;
use crate::service::task_store::TaskStore;
use crate::storage::kv::KeyValueStore;
use log::{error, info};
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Why the event loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Cancelled,
    /// An input handler asked to stop.
    Quit,
}

/// Poll cadence and teardown handle for `run`.
#[derive(Debug, Clone)]
pub struct EventLoop {
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl EventLoop {
    pub fn new(poll_interval: Duration, cancel: CancellationToken) -> Self {
        Self {
            poll_interval,
            cancel,
        }
    }

    /// Runs until `cancel` fires or `on_input` returns `Break`.
    ///
    /// Inputs keep flowing until the sender side is dropped; after that only
    /// polling continues.
    pub async fn run<K, C, N, T, F>(
        &self,
        store: &mut TaskStore<K, C>,
        poller: &mut ReminderPoller<N>,
        mut inputs: mpsc::UnboundedReceiver<T>,
        mut on_input: F,
    ) -> LoopExit
    where
        K: KeyValueStore,
        C: Clock,
        N: Notifier,
        F: FnMut(&mut TaskStore<K, C>, T) -> ControlFlow<()>,
    {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut inputs_open = true;

        info!(
            "event=event_loop module=reminder status=start poll_interval_ms={}",
            self.poll_interval.as_millis()
        );

        // The first tick completes immediately: start-up check before any input.
        ticker.tick().await;
        poll_once(store, poller);

        let exit = loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break LoopExit::Cancelled,
                input = inputs.recv(), if inputs_open => match input {
                    Some(input) => {
                        if on_input(store, input).is_break() {
                            break LoopExit::Quit;
                        }
                    }
                    None => inputs_open = false,
                },
                _ = ticker.tick() => poll_once(store, poller),
            }
        };

        info!("event=event_loop module=reminder status=stop exit={:?}", exit);
        exit
    }
}

fn poll_once<K: KeyValueStore, C: Clock, N: Notifier>(
    store: &mut TaskStore<K, C>,
    poller: &mut ReminderPoller<N>,
) {
    if let Err(err) = poller.check(store) {
        error!("event=reminder_poll module=reminder status=error error={}", err);
    }
}

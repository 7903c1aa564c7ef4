use chrono::{Local, NaiveDate, NaiveTime, TimeZone};
use neontask_core::{
    EventLoop, LoopExit, ManualClock, MemoryKeyValueStore, NewTask, Notifier, NotifyError,
    Reminder, ReminderPoller, StoreCommand, TaskStorage, TaskStore,
};
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct CountingNotifier {
    alerts: usize,
}

impl Notifier for CountingNotifier {
    fn play_sound(&mut self) -> Result<(), NotifyError> {
        Err(NotifyError::NoPlayer)
    }

    fn alert(&mut self, _reminder: &Reminder) -> Result<(), NotifyError> {
        self.alerts += 1;
        Ok(())
    }
}

enum Input {
    Command(StoreCommand),
    Quit,
}

fn due_now() -> NewTask {
    NewTask::new("Stand up").scheduled(
        NaiveDate::from_ymd_opt(2030, 5, 1).unwrap(),
        NaiveTime::from_hms_opt(10, 0, 0),
    )
}

fn clock() -> ManualClock {
    ManualClock::new(Local.with_ymd_and_hms(2030, 5, 1, 10, 0, 0).unwrap())
}

fn handle<K, C>(store: &mut TaskStore<K, C>, input: Input) -> ControlFlow<()>
where
    K: neontask_core::KeyValueStore,
    C: neontask_core::Clock,
{
    match input {
        Input::Command(command) => {
            store.apply(command).unwrap();
            ControlFlow::Continue(())
        }
        Input::Quit => ControlFlow::Break(()),
    }
}

#[tokio::test(start_paused = true)]
async fn polls_repeatedly_but_fires_once_until_cancelled() {
    let kv = MemoryKeyValueStore::new();
    let mut store = TaskStore::with_clock(TaskStorage::new(&kv), clock());
    let task = store.create(due_now()).unwrap().unwrap();
    let mut poller = ReminderPoller::new(CountingNotifier::default());

    let (tx, rx) = mpsc::unbounded_channel::<Input>();
    drop(tx);
    let cancel = CancellationToken::new();
    let event_loop = EventLoop::new(Duration::from_secs(20), cancel.clone());

    let canceller = async {
        tokio::time::sleep(Duration::from_secs(65)).await;
        cancel.cancel();
    };
    let (exit, ()) = tokio::join!(event_loop.run(&mut store, &mut poller, rx, handle), canceller);

    assert_eq!(exit, LoopExit::Cancelled);
    assert_eq!(poller.notifier().alerts, 1);
    assert!(store.get(task.id).unwrap().notified);
}

#[tokio::test(start_paused = true)]
async fn startup_check_runs_before_queued_inputs() {
    let kv = MemoryKeyValueStore::new();
    let mut store = TaskStore::with_clock(TaskStorage::new(&kv), clock());
    store.create(due_now()).unwrap();
    let mut poller = ReminderPoller::new(CountingNotifier::default());

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(Input::Command(StoreCommand::Create(NewTask::new("later")))).unwrap();
    tx.send(Input::Quit).unwrap();

    let event_loop = EventLoop::new(Duration::from_secs(20), CancellationToken::new());
    let exit = event_loop.run(&mut store, &mut poller, rx, handle).await;

    assert_eq!(exit, LoopExit::Quit);
    assert_eq!(poller.notifier().alerts, 1);
    assert_eq!(store.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn task_created_through_inputs_is_caught_by_next_tick() {
    let kv = MemoryKeyValueStore::new();
    let mut store = TaskStore::with_clock(TaskStorage::new(&kv), clock());
    let mut poller = ReminderPoller::new(CountingNotifier::default());

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(Input::Command(StoreCommand::Create(due_now()))).unwrap();
    let cancel = CancellationToken::new();
    let event_loop = EventLoop::new(Duration::from_secs(20), cancel.clone());

    let canceller = async {
        tokio::time::sleep(Duration::from_secs(25)).await;
        cancel.cancel();
        drop(tx);
    };
    let (exit, ()) = tokio::join!(event_loop.run(&mut store, &mut poller, rx, handle), canceller);

    assert_eq!(exit, LoopExit::Cancelled);
    assert_eq!(poller.notifier().alerts, 1);
    assert!(store.tasks()[0].notified);
}

// Executors - serialized default queue and an explicit parallel pool
//
// The serial queue runs one task at a time in submission order so that
// administrative operations reach the server in the order they were issued.
// The parallel pool bypasses that ordering for independent work.

use crate::application::lifecycle::{run_task, TaskTracker};
use crate::domain::CommandResult;
use crate::error::{AdminError, Result};
use crate::port::{Runner, TaskStateListener, TimeProvider};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Handle to a submitted task
///
/// Dropping the handle or timing out abandons interest in the result; the
/// task itself keeps running to completion.
pub struct TaskHandle {
    command: String,
    rx: oneshot::Receiver<CommandResult>,
}

impl TaskHandle {
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Wait for the final result
    ///
    /// # Errors
    /// `AdminError::Internal` when the task died without producing a result
    pub async fn wait(self) -> Result<CommandResult> {
        let command = self.command;
        self.rx
            .await
            .map_err(|_| AdminError::Internal(format!("task for command {command} aborted")))
    }

    /// Wait for at most `timeout`
    ///
    /// # Errors
    /// `AdminError::Timeout` if the deadline passes first; the handle can be
    /// waited on again afterwards
    pub async fn wait_timeout(&mut self, timeout: Duration) -> Result<CommandResult> {
        match tokio::time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => Err(AdminError::Internal(format!(
                "task for command {} aborted",
                self.command
            ))),
            Err(_) => Err(AdminError::Timeout(timeout.as_millis() as u64)),
        }
    }
}

struct QueuedTask {
    runner: Box<dyn Runner>,
    tracker: TaskTracker,
    reply: oneshot::Sender<CommandResult>,
}

/// Prepare a tracker in READY state and announce it
fn schedule(
    runner: &dyn Runner,
    listeners: Vec<Arc<dyn TaskStateListener>>,
) -> (TaskTracker, String) {
    let command = runner.command().name().to_string();
    let tracker = TaskTracker::new(runner.server().name(), command.clone(), listeners);
    tracker.submitted();
    (tracker, command)
}

/// Run a task on its own tokio task so a panicking runner cannot take the
/// worker down with it
async fn run_isolated(task: QueuedTask, time_provider: Arc<dyn TimeProvider>) {
    let QueuedTask {
        runner,
        tracker,
        reply,
    } = task;
    let command = runner.command().name().to_string();
    let server = tracker.server().to_string();
    let listeners = tracker.listeners().to_vec();
    let handle = tokio::spawn(run_task(runner, tracker, time_provider));
    let result = match handle.await {
        Ok(result) => result,
        Err(join_err) => {
            let reason = if join_err.is_panic() { "panicked" } else { "was cancelled" };
            error!(server = %server, command = %command, "Runner {reason}: {:?}", join_err);
            TaskTracker::runner_died(server, command, listeners, format!("runner {reason}"))
        }
    };
    // Receiver may be gone: the caller stopped waiting
    let _ = reply.send(result);
}

/// Single-worker queue preserving submission order
pub struct SerialQueue {
    tx: Mutex<Option<mpsc::UnboundedSender<QueuedTask>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SerialQueue {
    /// Start the worker on the current tokio runtime
    pub fn start(time_provider: Arc<dyn TimeProvider>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<QueuedTask>();
        let worker = tokio::spawn(async move {
            info!("Serial command worker started");
            while let Some(task) = rx.recv().await {
                run_isolated(task, Arc::clone(&time_provider)).await;
            }
            info!("Serial command worker stopped");
        });
        Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Queue a runner behind everything already submitted
    ///
    /// # Errors
    /// `AdminError::InvalidState` after shutdown
    pub fn submit(
        &self,
        runner: Box<dyn Runner>,
        listeners: Vec<Arc<dyn TaskStateListener>>,
    ) -> Result<TaskHandle> {
        let guard = self
            .tx
            .lock()
            .map_err(|_| AdminError::Internal("serial queue lock poisoned".to_string()))?;
        let tx = guard
            .as_ref()
            .ok_or_else(|| AdminError::InvalidState("serial queue shut down".to_string()))?;

        let (tracker, command) = schedule(runner.as_ref(), listeners);
        let (reply, rx) = oneshot::channel();
        tx.send(QueuedTask {
            runner,
            tracker,
            reply,
        })
        .map_err(|_| AdminError::InvalidState("serial worker is gone".to_string()))?;
        Ok(TaskHandle { command, rx })
    }

    /// Stop accepting tasks and wait until queued ones have run
    pub async fn shutdown(&self) {
        let tx = self.tx.lock().ok().and_then(|mut g| g.take());
        drop(tx);
        let worker = self.worker.lock().ok().and_then(|mut g| g.take());
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                error!(error = ?e, "Serial worker ended abnormally");
            }
        }
    }
}

/// Fixed-size pool for explicitly parallel workloads, no ordering guarantee
#[derive(Clone)]
pub struct ParallelPool {
    permits: Arc<Semaphore>,
    time_provider: Arc<dyn TimeProvider>,
}

impl ParallelPool {
    pub fn new(size: usize, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(size.max(1))),
            time_provider,
        }
    }

    pub fn submit(
        &self,
        runner: Box<dyn Runner>,
        listeners: Vec<Arc<dyn TaskStateListener>>,
    ) -> TaskHandle {
        let (tracker, command) = schedule(runner.as_ref(), listeners);
        let (reply, rx) = oneshot::channel();
        let permits = Arc::clone(&self.permits);
        let time_provider = Arc::clone(&self.time_provider);
        tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            run_isolated(
                QueuedTask {
                    runner,
                    tracker,
                    reply,
                },
                time_provider,
            )
            .await;
        });
        TaskHandle { command, rx }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Command, ServerDescriptor, TaskEvent, TaskState};
    use crate::port::listener::mocks::RecordingListener;
    use crate::port::runner::mocks::{MockBehavior, MockRunner};
    use crate::port::{ServerEntity, SystemTimeProvider};

    fn runner(name: &str, behavior: MockBehavior) -> Box<dyn Runner> {
        let server: Arc<dyn ServerEntity> = Arc::new(ServerDescriptor::new("payara", "localhost", 4848));
        Box::new(MockRunner::new(server, Arc::new(Command::new(name)), behavior))
    }

    #[tokio::test]
    async fn test_serial_queue_runs_in_order() {
        let queue = SerialQueue::start(Arc::new(SystemTimeProvider));
        let listener = Arc::new(RecordingListener::new());
        let l: Arc<dyn TaskStateListener> = listener.clone();

        let first = queue
            .submit(
                runner("first", MockBehavior::Slow(Duration::from_millis(50), "1".into())),
                vec![l.clone()],
            )
            .unwrap();
        let second = queue
            .submit(runner("second", MockBehavior::Text("2".into())), vec![l])
            .unwrap();

        let r2 = second.wait().await.unwrap();
        let r1 = first.wait().await.unwrap();
        assert!(r1.is_success() && r2.is_success());

        let order: Vec<(TaskState, String)> = listener
            .notifications()
            .into_iter()
            .filter(|n| n.state != TaskState::Ready)
            .map(|n| (n.state, n.args[1].clone()))
            .collect();
        assert_eq!(
            order,
            vec![
                (TaskState::Running, "first".to_string()),
                (TaskState::Completed, "first".to_string()),
                (TaskState::Running, "second".to_string()),
                (TaskState::Completed, "second".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_ready_is_announced_at_submission() {
        let queue = SerialQueue::start(Arc::new(SystemTimeProvider));
        let listener = Arc::new(RecordingListener::new());
        let l: Arc<dyn TaskStateListener> = listener.clone();

        let handle = queue
            .submit(runner("version", MockBehavior::Text("5".into())), vec![l])
            .unwrap();
        assert_eq!(listener.states().first(), Some(&TaskState::Ready));
        handle.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_timeout_does_not_cancel_task() {
        let queue = SerialQueue::start(Arc::new(SystemTimeProvider));
        let mut handle = queue
            .submit(
                runner("slow", MockBehavior::Slow(Duration::from_millis(100), "done".into())),
                vec![],
            )
            .unwrap();

        let early = handle.wait_timeout(Duration::from_millis(5)).await;
        assert!(matches!(early, Err(AdminError::Timeout(5))));

        let result = handle.wait_timeout(Duration::from_secs(5)).await.unwrap();
        assert_eq!(result.value().and_then(|v| v.as_text()), Some("done"));
    }

    #[tokio::test]
    async fn test_panicking_runner_does_not_kill_worker() {
        let queue = SerialQueue::start(Arc::new(SystemTimeProvider));
        let bad = queue
            .submit(runner("bad", MockBehavior::Panic("boom".into())), vec![])
            .unwrap();
        let good = queue
            .submit(runner("good", MockBehavior::Text("ok".into())), vec![])
            .unwrap();

        let failed = bad.wait().await.unwrap();
        assert_eq!(failed.state(), TaskState::Failed);
        assert_eq!(failed.message(), Some("runner panicked"));
        assert!(good.wait().await.unwrap().is_success());
    }

    #[tokio::test]
    async fn test_panicking_runner_still_notifies_failed() {
        let listener = Arc::new(RecordingListener::new());
        let listeners: Vec<Arc<dyn TaskStateListener>> = vec![listener.clone()];
        let queue = SerialQueue::start(Arc::new(SystemTimeProvider));

        queue
            .submit(runner("bad", MockBehavior::Panic("boom".into())), listeners)
            .unwrap()
            .wait()
            .await
            .unwrap();

        assert_eq!(
            listener.states(),
            vec![TaskState::Ready, TaskState::Running, TaskState::Failed]
        );
        let last = listener.notifications().pop().unwrap();
        assert_eq!(last.event, TaskEvent::Exception);
        assert_eq!(last.args[1], "bad");
        assert_eq!(last.args[2], "runner panicked");
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_rejected() {
        let queue = SerialQueue::start(Arc::new(SystemTimeProvider));
        let handle = queue
            .submit(runner("version", MockBehavior::Text("5".into())), vec![])
            .unwrap();
        queue.shutdown().await;
        assert!(handle.wait().await.unwrap().is_success());

        let late = queue.submit(runner("version", MockBehavior::Text("5".into())), vec![]);
        assert!(matches!(late, Err(AdminError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_parallel_pool_runs_concurrently() {
        let pool = ParallelPool::new(2, Arc::new(SystemTimeProvider));
        let start = std::time::Instant::now();
        let a = pool.submit(
            runner("a", MockBehavior::Slow(Duration::from_millis(200), "a".into())),
            vec![],
        );
        let b = pool.submit(
            runner("b", MockBehavior::Slow(Duration::from_millis(200), "b".into())),
            vec![],
        );
        assert!(a.wait().await.unwrap().is_success());
        assert!(b.wait().await.unwrap().is_success());
        assert!(start.elapsed() < Duration::from_millis(390));
    }
}

// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialized write queue.
//!
//! Every write to a connection goes through one consumer thread that owns
//! the [`StorageHandle`] and applies transactions strictly in arrival order,
//! one at a time. Callers on any thread hand over a transaction plus a
//! one-shot reply slot and wait on the slot. A reset is queued the same way,
//! so it runs only after everything submitted before it.
//!
//! Lifecycle: `Unstarted -> Starting -> Ready -> Draining -> Stopped`.
//! Enqueueing while `Unstarted` or `Starting` waits for `Ready` up to the
//! readiness timeout; enqueueing while `Draining` or `Stopped` fails.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, mpsc as std_mpsc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use mnemo_config::WriteQueueConfig;
use mnemo_core::MnemoError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::handle::StorageHandle;
use crate::transaction::{Output, Transaction};

const COMPONENT: &str = "write queue";

/// Poll interval for async submitters waiting on startup.
const STARTUP_POLL: Duration = Duration::from_millis(5);

/// Default readiness wait for `enqueue`.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the consumer delivers a result. Blocking callers wait on a std
/// channel so they may sit on any thread, runtime workers included.
enum Reply<T> {
    Blocking(std_mpsc::SyncSender<Result<T, MnemoError>>),
    Async(oneshot::Sender<Result<T, MnemoError>>),
}

impl<T> Reply<T> {
    fn send(self, result: Result<T, MnemoError>) {
        let delivered = match self {
            Reply::Blocking(tx) => tx.send(result).is_ok(),
            Reply::Async(tx) => tx.send(result).is_ok(),
        };
        if !delivered {
            debug!("submitter went away before the result was delivered");
        }
    }
}

enum Message {
    Apply {
        transaction: Transaction,
        reply: Reply<Output>,
    },
    Reset {
        reply: Reply<()>,
    },
    Shutdown,
}

enum State {
    Unstarted(Option<StorageHandle>),
    Starting,
    Ready(mpsc::UnboundedSender<Message>),
    Draining,
    Stopped,
}

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Unstarted,
    Starting,
    Ready,
    Draining,
    Stopped,
}

struct Shared {
    state: Mutex<State>,
    changed: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, next: State) {
        *self.lock() = next;
        self.changed.notify_all();
    }
}

pub struct WriteQueue {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    ready_timeout: Duration,
}

fn stopped() -> MnemoError {
    MnemoError::Stopped {
        component: COMPONENT,
    }
}

impl WriteQueue {
    pub fn new(handle: StorageHandle) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::Unstarted(Some(handle))),
                changed: Condvar::new(),
            }),
            worker: Mutex::new(None),
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }

    pub fn from_config(handle: StorageHandle, config: &WriteQueueConfig) -> Self {
        Self::new(handle).with_ready_timeout(config.ready_timeout())
    }

    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    pub fn state(&self) -> QueueState {
        match &*self.shared.lock() {
            State::Unstarted(_) => QueueState::Unstarted,
            State::Starting => QueueState::Starting,
            State::Ready(_) => QueueState::Ready,
            State::Draining => QueueState::Draining,
            State::Stopped => QueueState::Stopped,
        }
    }

    /// Start the consumer thread. Calling again while running is a no-op;
    /// calling after `stop` fails.
    pub fn start(&self) -> Result<(), MnemoError> {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = {
            let mut state = self.shared.lock();
            let handle = match &mut *state {
                State::Unstarted(handle) => handle.take(),
                State::Starting | State::Ready(_) => return Ok(()),
                State::Draining | State::Stopped => return Err(stopped()),
            };
            *state = State::Starting;
            handle
        };
        let Some(handle) = handle else {
            self.shared.set(State::Stopped);
            return Err(MnemoError::Internal("write queue lost its storage handle".into()));
        };

        let shared = self.shared.clone();
        match thread::Builder::new()
            .name("mnemo-write-queue".into())
            .spawn(move || consume(shared, handle))
        {
            Ok(join) => {
                *worker = Some(join);
                Ok(())
            }
            Err(err) => {
                self.shared.set(State::Stopped);
                Err(MnemoError::Internal(format!(
                    "failed to spawn write queue consumer: {err}"
                )))
            }
        }
    }

    /// Apply `transaction` and block until it has been applied or failed.
    ///
    /// Returns the output of the last `execute` task, or [`Output::None`].
    /// Prefer [`enqueue_async`](Self::enqueue_async) inside an async runtime;
    /// this one parks the calling thread.
    pub fn enqueue(&self, transaction: Transaction) -> Result<Output, MnemoError> {
        self.wait(|reply| Message::Apply { transaction, reply })
    }

    /// Async counterpart of [`enqueue`](Self::enqueue).
    pub async fn enqueue_async(&self, transaction: Transaction) -> Result<Output, MnemoError> {
        self.wait_async(|reply| Message::Apply { transaction, reply }).await
    }

    /// Close the consumer's connection once every transaction submitted
    /// before this call has been applied. The next transaction reopens it
    /// through the factory.
    pub fn reset(&self) -> Result<(), MnemoError> {
        self.wait(|reply| Message::Reset { reply })
    }

    pub async fn reset_async(&self) -> Result<(), MnemoError> {
        self.wait_async(|reply| Message::Reset { reply }).await
    }

    fn wait<T>(&self, message: impl FnOnce(Reply<T>) -> Message) -> Result<T, MnemoError> {
        let (reply, result) = std_mpsc::sync_channel(1);
        self.submit(message(Reply::Blocking(reply)))?;
        result.recv().map_err(|_| stopped())?
    }

    async fn wait_async<T>(
        &self,
        message: impl FnOnce(Reply<T>) -> Message,
    ) -> Result<T, MnemoError> {
        let (reply, result) = oneshot::channel();
        let deadline = Instant::now() + self.ready_timeout;
        let mut message = message(Reply::Async(reply));
        while let Some(pending) = self.try_submit(message)? {
            if Instant::now() >= deadline {
                return Err(self.not_ready());
            }
            message = pending;
            tokio::time::sleep(STARTUP_POLL).await;
        }
        result.await.map_err(|_| stopped())?
    }

    fn not_ready(&self) -> MnemoError {
        MnemoError::NotReady {
            component: COMPONENT,
            timeout: self.ready_timeout,
        }
    }

    /// Send under the state lock, so nothing can slip in behind `Shutdown`.
    fn submit(&self, message: Message) -> Result<(), MnemoError> {
        let deadline = Instant::now() + self.ready_timeout;
        let mut state = self.shared.lock();
        loop {
            match &*state {
                State::Ready(tx) => return tx.send(message).map_err(|_| stopped()),
                State::Draining | State::Stopped => return Err(stopped()),
                State::Unstarted(_) | State::Starting => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(self.not_ready());
                    }
                    state = self
                        .shared
                        .changed
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
            }
        }
    }

    /// Non-blocking send; hands the message back while the queue is starting.
    fn try_submit(&self, message: Message) -> Result<Option<Message>, MnemoError> {
        match &*self.shared.lock() {
            State::Ready(tx) => tx.send(message).map(|()| None).map_err(|_| stopped()),
            State::Unstarted(_) | State::Starting => Ok(Some(message)),
            State::Draining | State::Stopped => Err(stopped()),
        }
    }

    /// Drain and stop the consumer. Transactions enqueued before `stop` are
    /// applied; later ones fail with `Stopped`. Safe to call repeatedly or on
    /// a queue that was never started.
    pub fn stop(&self) {
        {
            let mut state = self.shared.lock();
            loop {
                match &*state {
                    State::Unstarted(_) => {
                        *state = State::Stopped;
                        self.shared.changed.notify_all();
                        return;
                    }
                    State::Stopped => return,
                    State::Ready(tx) => {
                        if tx.send(Message::Shutdown).is_err() {
                            debug!("write queue consumer already gone");
                        }
                        *state = State::Draining;
                        self.shared.changed.notify_all();
                        break;
                    }
                    State::Starting | State::Draining => {
                        state = self
                            .shared
                            .changed
                            .wait(state)
                            .unwrap_or_else(PoisonError::into_inner);
                    }
                }
            }
        }

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker
            && worker.join().is_err()
        {
            error!("write queue consumer panicked");
        }
        self.shared.set(State::Stopped);
        info!("write queue stopped");
    }
}

impl Drop for WriteQueue {
    fn drop(&mut self) {
        self.stop();
    }
}

fn consume(shared: Arc<Shared>, mut handle: StorageHandle) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    shared.set(State::Ready(tx));
    info!(dialect = handle.driver().name, "write queue ready");

    while let Some(message) = rx.blocking_recv() {
        match message {
            Message::Shutdown => break,
            Message::Apply { transaction, reply } => {
                reply.send(apply(&mut handle, transaction));
            }
            Message::Reset { reply } => {
                let result = handle.reset().map_err(MnemoError::from);
                match &result {
                    Ok(()) => info!("write queue connection reset"),
                    Err(err) => warn!(error = %err, "write queue connection reset failed"),
                }
                reply.send(result);
            }
        }
    }

    if let Err(err) = handle.close() {
        warn!(error = %err, "error closing write queue connection");
    }
    debug!("write queue consumer exited");
}

fn apply(handle: &mut StorageHandle, transaction: Transaction) -> Result<Output, MnemoError> {
    debug!(tasks = transaction.tasks().len(), "applying transaction");
    transaction.apply(handle).map_err(|err| {
        warn!(error = %err, "transaction failed");
        // Uncommitted work from the failed transaction must not leak into
        // the next one's commit. Dialects that abort the transaction on
        // error cannot run anything else until this succeeds.
        if let Err(rollback_err) = handle.rollback() {
            if handle.driver().requires_rollback_on_error {
                error!(error = %rollback_err, "rollback failed, connection left aborted");
            } else {
                warn!(error = %rollback_err, "rollback after failed transaction failed");
            }
        }
        MnemoError::from(err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StorageRegistry;
    use crate::factory::ConnectionFactory;
    use crate::value::Statement;

    fn sqlite_queue() -> WriteQueue {
        let handle = StorageRegistry::default()
            .handle(&ConnectionFactory::sqlite(rusqlite::Connection::open_in_memory))
            .unwrap();
        WriteQueue::new(handle)
    }

    #[test]
    fn start_is_idempotent() {
        let queue = sqlite_queue();
        queue.start().unwrap();
        queue.start().unwrap();
        let out = queue
            .enqueue(Transaction::new().execute(Statement::new("SELECT 1 AS one")))
            .unwrap();
        assert_eq!(out.rows().unwrap().first_i64("one").unwrap(), Some(1));
    }

    #[test]
    fn stop_without_start_is_safe() {
        let queue = sqlite_queue();
        queue.stop();
        queue.stop();
        assert_eq!(queue.state(), QueueState::Stopped);
    }

    #[test]
    fn enqueue_after_stop_fails() {
        let queue = sqlite_queue();
        queue.start().unwrap();
        queue.stop();
        let err = queue.enqueue(Transaction::new().commit()).unwrap_err();
        assert!(matches!(err, MnemoError::Stopped { .. }));
        assert!(matches!(queue.start(), Err(MnemoError::Stopped { .. })));
    }

    #[test]
    fn enqueue_never_started_times_out() {
        let queue = sqlite_queue().with_ready_timeout(Duration::from_millis(30));
        let started = Instant::now();
        let err = queue.enqueue(Transaction::new().commit()).unwrap_err();
        assert!(matches!(err, MnemoError::NotReady { .. }));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn enqueue_waits_for_late_start() {
        let queue = Arc::new(sqlite_queue());
        let submitter = {
            let queue = queue.clone();
            thread::spawn(move || queue.enqueue(Transaction::new().commit()))
        };
        thread::sleep(Duration::from_millis(20));
        queue.start().unwrap();
        assert_eq!(submitter.join().unwrap().unwrap(), Output::None);
    }

    #[test]
    fn failed_transaction_does_not_stop_consumer() {
        let queue = sqlite_queue();
        queue.start().unwrap();
        let err = queue
            .enqueue(Transaction::new().execute(Statement::new("SELECT * FROM missing")))
            .unwrap_err();
        assert!(matches!(err, MnemoError::Storage { .. }));

        let out = queue
            .enqueue(Transaction::new().execute(Statement::new("SELECT 2 AS two")))
            .unwrap();
        assert_eq!(out.rows().unwrap().first_i64("two").unwrap(), Some(2));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn enqueue_async_delivers_result() {
        let queue = sqlite_queue();
        queue.start().unwrap();
        let out = queue
            .enqueue_async(Transaction::new().execute(Statement::new("SELECT 3 AS n")))
            .await
            .unwrap();
        assert_eq!(out.rows().unwrap().first_i64("n").unwrap(), Some(3));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn enqueue_async_waits_for_start() {
        let queue = Arc::new(sqlite_queue());
        let pending = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.enqueue_async(Transaction::new().flush()).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.start().unwrap();
        assert_eq!(pending.await.unwrap().unwrap(), Output::None);
    }

    #[tokio::test]
    async fn blocking_enqueue_on_a_runtime_thread_completes() {
        let queue = sqlite_queue();
        queue.start().unwrap();
        let out = queue
            .enqueue(Transaction::new().execute(Statement::new("SELECT 4 AS n")))
            .unwrap();
        assert_eq!(out.rows().unwrap().first_i64("n").unwrap(), Some(4));
        queue.reset().unwrap();
    }

    #[test]
    fn reset_drops_connection_state() {
        let queue = sqlite_queue();
        queue.start().unwrap();
        queue
            .enqueue(Transaction::new().execute(Statement::new("CREATE TEMP TABLE scratch (n)")))
            .unwrap();
        queue.reset().unwrap();

        // A fresh in-memory connection no longer has the temp table.
        let err = queue
            .enqueue(Transaction::new().execute(Statement::new("SELECT n FROM scratch")))
            .unwrap_err();
        assert!(matches!(err, MnemoError::Storage { .. }));
    }

    #[test]
    fn reset_after_stop_fails() {
        let queue = sqlite_queue();
        queue.start().unwrap();
        queue.stop();
        assert!(matches!(queue.reset(), Err(MnemoError::Stopped { .. })));
    }
}

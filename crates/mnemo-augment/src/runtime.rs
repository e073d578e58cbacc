// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background augmentation runtime.
//!
//! A dedicated thread drives a single-threaded tokio scheduler. Payloads
//! handed to [`AugmentationRuntime::enqueue`] become tasks on that
//! scheduler; a semaphore of `max_workers` permits bounds how many are
//! running plugins at once, the rest wait for a permit. Each task gets its
//! own storage handle, runs every enabled plugin in order and submits the
//! collected writes to the [`WriteQueue`] as one transaction.
//!
//! Submission is unbounded: payloads are never rejected for load, they only
//! wait for a permit.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use mnemo_config::AugmentationConfig;
use mnemo_core::{MnemoError, Payload};
use mnemo_storage::{ConnectionFactory, ReadHandle, StorageRegistry, Transaction, WriteQueue};
use tokio::runtime::Handle;
use tokio::sync::{Semaphore, oneshot};
use tokio_util::task::TaskTracker;
use tracing::{Instrument, Span, debug, error, info, warn};

use crate::context::AugmentationContext;
use crate::plugin::Augmentation;

const COMPONENT: &str = "augmentation runtime";

/// Everything a payload task needs, shared by all of them.
struct Pipeline {
    plugins: Vec<Arc<dyn Augmentation>>,
    registry: StorageRegistry,
    factory: ConnectionFactory,
    queue: Arc<WriteQueue>,
    permits: Arc<Semaphore>,
}

struct Active {
    handle: Handle,
    tracker: TaskTracker,
    pipeline: Arc<Pipeline>,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

enum State {
    Idle,
    Starting,
    Running(Active),
    Stopped,
}

pub struct AugmentationRuntime {
    plugins: Vec<Arc<dyn Augmentation>>,
    queue: Arc<WriteQueue>,
    max_workers: usize,
    ready_timeout: Duration,
    state: Mutex<State>,
    changed: Condvar,
}

impl AugmentationRuntime {
    pub fn new(
        plugins: Vec<Arc<dyn Augmentation>>,
        queue: Arc<WriteQueue>,
        config: &AugmentationConfig,
    ) -> Self {
        Self {
            plugins,
            queue,
            max_workers: config.max_workers.max(1),
            ready_timeout: config.ready_timeout(),
            state: Mutex::new(State::Idle),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, next: State) {
        *self.lock() = next;
        self.changed.notify_all();
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.lock(), State::Running(_))
    }

    /// Payload tasks accepted but not yet finished.
    pub fn in_flight(&self) -> usize {
        match &*self.lock() {
            State::Running(active) => active.tracker.len(),
            _ => 0,
        }
    }

    /// Start the scheduler thread with the factory used for per-payload
    /// storage handles.
    ///
    /// The factory is checked against `registry` up front, so an unusable
    /// backend fails here rather than inside every payload. Calling again
    /// while running is a no-op and keeps the first factory.
    pub fn start(
        &self,
        registry: &StorageRegistry,
        factory: ConnectionFactory,
    ) -> Result<(), MnemoError> {
        {
            let mut state = self.lock();
            match &*state {
                State::Idle => *state = State::Starting,
                State::Starting | State::Running(_) => {
                    debug!("augmentation runtime already started");
                    return Ok(());
                }
                State::Stopped => return Err(MnemoError::Stopped { component: COMPONENT }),
            }
        }

        match self.spawn(registry, factory) {
            Ok(active) => {
                info!(
                    max_workers = self.max_workers,
                    plugins = self.plugins.len(),
                    "augmentation runtime started"
                );
                self.set(State::Running(active));
                Ok(())
            }
            Err(err) => {
                self.set(State::Idle);
                Err(err)
            }
        }
    }

    fn spawn(
        &self,
        registry: &StorageRegistry,
        factory: ConnectionFactory,
    ) -> Result<Active, MnemoError> {
        // Resolves adapter and driver without opening a connection.
        registry.handle(&factory)?;

        let pipeline = Arc::new(Pipeline {
            plugins: self.plugins.clone(),
            registry: registry.clone(),
            factory,
            queue: self.queue.clone(),
            permits: Arc::new(Semaphore::new(self.max_workers)),
        });
        let tracker = TaskTracker::new();

        let (ready_tx, ready_rx) = std::sync::mpsc::channel();
        let drain = tracker.clone();
        let thread = thread::Builder::new()
            .name("mnemo-augment".into())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
                if ready_tx
                    .send(Ok((runtime.handle().clone(), shutdown_tx)))
                    .is_err()
                {
                    return;
                }
                runtime.block_on(async move {
                    let _ = shutdown_rx.await;
                    drain.close();
                    drain.wait().await;
                });
                debug!("augmentation scheduler exited");
            })
            .map_err(|e| MnemoError::Internal(format!("failed to spawn augmentation thread: {e}")))?;

        let (handle, shutdown) = match ready_rx.recv_timeout(self.ready_timeout) {
            Ok(Ok(ready)) => ready,
            Ok(Err(err)) => {
                return Err(MnemoError::Internal(format!(
                    "failed to build augmentation scheduler: {err}"
                )));
            }
            Err(_) => {
                return Err(MnemoError::NotReady {
                    component: COMPONENT,
                    timeout: self.ready_timeout,
                });
            }
        };

        Ok(Active {
            handle,
            tracker,
            pipeline,
            shutdown: Some(shutdown),
            thread: Some(thread),
        })
    }

    /// Hand a payload to the scheduler and return immediately.
    ///
    /// A runtime that was never started ignores payloads. While starting,
    /// waits up to the readiness timeout; after `stop` it fails.
    pub fn enqueue(&self, payload: Payload) -> Result<&Self, MnemoError> {
        let deadline = Instant::now() + self.ready_timeout;
        let mut state = self.lock();
        loop {
            match &*state {
                State::Idle => {
                    debug!("augmentation runtime not started, payload ignored");
                    return Ok(self);
                }
                State::Stopped => return Err(MnemoError::Stopped { component: COMPONENT }),
                State::Running(active) => {
                    let pipeline = active.pipeline.clone();
                    // Payload logs stay attached to the span that recorded it.
                    active.tracker.spawn_on(
                        process(pipeline, payload).instrument(Span::current()),
                        &active.handle,
                    );
                    return Ok(self);
                }
                State::Starting => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(MnemoError::NotReady {
                            component: COMPONENT,
                            timeout: self.ready_timeout,
                        });
                    }
                    state = self
                        .changed
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
            }
        }
    }

    /// Stop accepting payloads, let in-flight and waiting ones finish
    /// (their writes still reach the queue), then join the scheduler thread.
    pub fn stop(&self) {
        let previous = {
            let mut state = self.lock();
            while matches!(*state, State::Starting) {
                state = self
                    .changed
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            std::mem::replace(&mut *state, State::Stopped)
        };
        self.changed.notify_all();

        let State::Running(mut active) = previous else {
            return;
        };
        debug!(pending = active.tracker.len(), "draining augmentation runtime");
        if let Some(shutdown) = active.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = active.thread.take() {
            if thread.thread().id() == thread::current().id() {
                warn!("augmentation runtime stopped from its own thread, not joining");
            } else if thread.join().is_err() {
                error!("augmentation scheduler thread panicked");
            }
        }
        info!("augmentation runtime stopped");
    }
}

impl Drop for AugmentationRuntime {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Task boundary: failures are logged here and go no further.
async fn process(pipeline: Arc<Pipeline>, payload: Payload) {
    let Ok(_permit) = pipeline.permits.clone().acquire_owned().await else {
        return;
    };
    if let Err(err) = augment(&pipeline, payload).await {
        match &err {
            MnemoError::Augmentation { plugin, message } => {
                warn!(plugin = %plugin, error = %message, "augmentation failed, payload dropped");
            }
            other => warn!(error = %other, "augmentation failed, payload dropped"),
        }
    }
}

async fn augment(pipeline: &Pipeline, payload: Payload) -> Result<(), MnemoError> {
    let mut storage = ReadHandle::new(pipeline.registry.handle(&pipeline.factory)?);
    let result = run_plugins(&pipeline.plugins, AugmentationContext::new(payload), &mut storage).await;
    if let Err(err) = storage.close() {
        debug!(error = %err, "error closing augmentation read handle");
    }

    let writes = result?.into_writes();
    if writes.is_empty() {
        return Ok(());
    }
    debug!(writes = writes.len(), "submitting augmentation writes");
    pipeline
        .queue
        .enqueue_async(writes.into_iter().collect::<Transaction>())
        .await?;
    Ok(())
}

/// Fold the context through every plugin; the first failure ends the run.
async fn run_plugins(
    plugins: &[Arc<dyn Augmentation>],
    mut ctx: AugmentationContext,
    storage: &mut ReadHandle,
) -> Result<AugmentationContext, MnemoError> {
    for plugin in plugins {
        ctx = plugin
            .process(ctx, storage)
            .await
            .map_err(|err| MnemoError::Augmentation {
                plugin: plugin.name().to_string(),
                message: err.to_string(),
            })?;
    }
    Ok(ctx)
}

// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded fan-out of the augmentation runtime.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mnemo_augment::{Augmentation, AugmentationContext, AugmentationRuntime};
use mnemo_config::AugmentationConfig;
use mnemo_core::{Exchange, Message, MnemoError, Payload};
use mnemo_storage::{ReadHandle, StorageRegistry, WriteDescriptor, WriteQueue};
use mnemo_test_utils::{Call, MockBackend};

/// Sleeps while counted as running, then proposes one write.
#[derive(Default)]
struct Slow {
    running: AtomicUsize,
    peak: AtomicUsize,
    finished: AtomicUsize,
}

#[async_trait]
impl Augmentation for Slow {
    fn name(&self) -> &str {
        "slow"
    }

    async fn process(
        &self,
        mut ctx: AugmentationContext,
        _storage: &mut ReadHandle,
    ) -> Result<AugmentationContext, MnemoError> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.running.fetch_sub(1, Ordering::SeqCst);

        let external_id = ctx.payload().process_id().unwrap_or("p").to_string();
        ctx.add_write(WriteDescriptor::ProcessAttributes {
            external_id,
            attributes: vec!["patient".into()],
        });
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(ctx)
    }
}

fn payload(n: usize) -> Payload {
    Payload::new(
        Some(format!("user-{n}")),
        Some(format!("proc-{n}")),
        Some(n as i64),
        Exchange::new(vec![Message::user("q")], vec![Message::assistant("a")]),
    )
}

fn setup(max_workers: usize) -> (MockBackend, Arc<Slow>, AugmentationRuntime) {
    let backend = MockBackend::new("sqlite");
    let registry = StorageRegistry::default();
    let queue = Arc::new(WriteQueue::new(registry.handle(&backend.factory()).unwrap()));
    queue.start().unwrap();

    let slow = Arc::new(Slow::default());
    let config = AugmentationConfig {
        max_workers,
        ..AugmentationConfig::default()
    };
    let runtime = AugmentationRuntime::new(vec![slow.clone()], queue, &config);
    runtime.start(&registry, backend.factory()).unwrap();
    (backend, slow, runtime)
}

#[test]
fn single_worker_processes_payloads_one_at_a_time() {
    let (backend, slow, runtime) = setup(1);
    for n in 0..5 {
        runtime.enqueue(payload(n)).unwrap();
    }
    runtime.stop();

    assert_eq!(slow.finished.load(Ordering::SeqCst), 5);
    assert_eq!(slow.peak.load(Ordering::SeqCst), 1);
    assert_eq!(backend.log().count(&Call::Commit), 5);
}

#[test]
fn several_workers_run_concurrently_within_bound() {
    let (backend, slow, runtime) = setup(3);
    for n in 0..9 {
        runtime.enqueue(payload(n)).unwrap();
    }
    runtime.stop();

    assert_eq!(slow.finished.load(Ordering::SeqCst), 9);
    let peak = slow.peak.load(Ordering::SeqCst);
    assert!((1..=3).contains(&peak), "peak concurrency {peak}");
    assert_eq!(backend.log().count(&Call::Commit), 9);
}

#[test]
fn enqueue_returns_before_processing_finishes() {
    let (_backend, slow, runtime) = setup(1);
    runtime.enqueue(payload(0)).unwrap();
    assert_eq!(slow.finished.load(Ordering::SeqCst), 0);
    runtime.stop();
    assert_eq!(slow.finished.load(Ordering::SeqCst), 1);
}

// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Write queue behaviour against a recording mock connection.

use std::sync::Arc;
use std::thread;

use mnemo_core::MnemoError;
use mnemo_storage::{
    Output, QueueState, Statement, StorageRegistry, Transaction, WriteDescriptor, WriteQueue,
};
use mnemo_test_utils::{Call, MockBackend};

fn queue_for(backend: &MockBackend) -> WriteQueue {
    let handle = StorageRegistry::default()
        .handle(&backend.factory())
        .unwrap();
    let queue = WriteQueue::new(handle);
    queue.start().unwrap();
    queue
}

#[test]
fn transactions_from_many_threads_never_interleave() {
    let backend = MockBackend::new("sqlite");
    let queue = Arc::new(queue_for(&backend));

    let workers: Vec<_> = (0..3)
        .map(|t| {
            let queue = queue.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    queue
                        .enqueue(
                            Transaction::new()
                                .execute(Statement::new(format!("INSERT t{t} a{i}")))
                                .execute(Statement::new(format!("INSERT t{t} b{i}")))
                                .commit(),
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let calls = backend.log().calls();
    assert_eq!(calls.len(), 3 * 25 * 3);
    for chunk in calls.chunks(3) {
        let (Call::Execute(a), Call::Execute(b), Call::Commit) = (&chunk[0], &chunk[1], &chunk[2])
        else {
            panic!("interleaved transaction: {chunk:?}");
        };
        assert_eq!(a.replace(" a", " b"), *b);
    }

    // Per-thread order is preserved.
    for t in 0..3 {
        let prefix = format!("INSERT t{t} a");
        let seen: Vec<usize> = backend
            .log()
            .executed()
            .iter()
            .filter_map(|sql| sql.strip_prefix(&prefix)?.parse().ok())
            .collect();
        assert_eq!(seen, (0..25).collect::<Vec<_>>());
    }
}

#[test]
fn commit_only_transaction_returns_none() {
    let backend = MockBackend::new("sqlite");
    let queue = queue_for(&backend);
    queue
        .enqueue(Transaction::new().execute(Statement::new("SELECT 1")))
        .unwrap();
    backend.log().clear();

    let out = queue.enqueue(Transaction::new().commit()).unwrap();
    assert_eq!(out, Output::None);
    assert_eq!(backend.log().calls(), vec![Call::Commit]);
}

#[test]
fn tasks_run_in_declared_order() {
    let backend = MockBackend::new("sqlite");
    let queue = queue_for(&backend);
    queue
        .enqueue(
            Transaction::new()
                .execute(Statement::new("INSERT x"))
                .commit()
                .flush(),
        )
        .unwrap();
    assert_eq!(
        backend.log().calls(),
        vec![Call::Execute("INSERT x".into()), Call::Commit, Call::Flush]
    );
}

#[test]
fn failure_is_delivered_and_consumer_continues() {
    let backend = MockBackend::new("sqlite");
    backend.fail_on("boom");
    let queue = queue_for(&backend);

    let err = queue
        .enqueue(
            Transaction::new()
                .execute(Statement::new("INSERT boom"))
                .execute(Statement::new("INSERT never"))
                .commit(),
        )
        .unwrap_err();
    assert!(matches!(err, MnemoError::Storage { .. }));
    assert!(err.to_string().contains("scripted failure"));

    queue
        .enqueue(Transaction::new().execute(Statement::new("INSERT ok")).commit())
        .unwrap();

    let executed = backend.log().executed();
    assert_eq!(executed, vec!["INSERT boom", "INSERT ok"]);
    assert_eq!(backend.log().count(&Call::Commit), 1);
}

#[test]
fn aborting_dialect_rolls_back_before_next_transaction() {
    let backend = MockBackend::new("postgresql");
    backend.fail_on("boom");
    let queue = queue_for(&backend);

    assert!(
        queue
            .enqueue(Transaction::new().execute(Statement::new("INSERT boom")))
            .is_err()
    );
    queue
        .enqueue(Transaction::new().execute(Statement::new("INSERT after")))
        .unwrap();

    assert_eq!(
        backend.log().calls(),
        vec![
            Call::Execute("INSERT boom".into()),
            Call::Rollback,
            Call::Execute("INSERT after".into()),
        ]
    );
}

#[test]
fn stop_drains_then_closes_connection() {
    let backend = MockBackend::new("mysql");
    let queue = queue_for(&backend);
    queue
        .enqueue(Transaction::new().execute(Statement::new("INSERT last")).commit())
        .unwrap();
    queue.stop();

    assert_eq!(queue.state(), QueueState::Stopped);
    assert_eq!(backend.log().calls().last(), Some(&Call::Close));

    let err = queue.enqueue(Transaction::new().commit()).unwrap_err();
    assert!(matches!(err, MnemoError::Stopped { .. }));
}

#[test]
fn write_descriptor_resolves_external_id_before_insert() {
    let backend = MockBackend::new("postgresql");
    let queue = queue_for(&backend);

    let tx: Transaction = [WriteDescriptor::EntityFacts {
        external_id: "user-1".into(),
        facts: vec!["likes tea".into()],
        embeddings: None,
    }]
    .into_iter()
    .collect();
    queue.enqueue(tx).unwrap();

    let executed = backend.log().executed();
    assert_eq!(executed.len(), 3);
    assert!(executed[0].contains("mnemo_entity ") && executed[0].contains("DO NOTHING"));
    assert!(executed[1].starts_with("SELECT id FROM mnemo_entity WHERE external_id = $1"));
    assert!(executed[2].contains("mnemo_entity_fact"));
    assert_eq!(backend.log().calls().last(), Some(&Call::Commit));
}

#[tokio::test(flavor = "multi_thread")]
async fn async_submitters_share_the_consumer() {
    let backend = MockBackend::new("sqlite");
    let queue = Arc::new(queue_for(&backend));

    let tasks: Vec<_> = (0..10)
        .map(|i| {
            let queue = queue.clone();
            tokio::spawn(async move {
                queue
                    .enqueue_async(
                        Transaction::new()
                            .execute(Statement::new(format!("INSERT {i}")))
                            .commit(),
                    )
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    assert_eq!(backend.log().count(&Call::Commit), 10);
    assert_eq!(backend.opened(), 1);
}

#[test]
fn reset_reopens_a_lost_connection() {
    let backend = MockBackend::new("postgresql");
    let queue = queue_for(&backend);
    queue
        .enqueue(Transaction::new().execute(Statement::new("INSERT first")).commit())
        .unwrap();
    assert_eq!(backend.opened(), 1);

    backend.lose_connections();
    for _ in 0..2 {
        let err = queue
            .enqueue(Transaction::new().execute(Statement::new("INSERT dropped")).commit())
            .unwrap_err();
        assert!(err.to_string().contains("connection lost"));
    }
    assert_eq!(backend.opened(), 1);

    queue.reset().unwrap();
    backend.log().clear();
    queue
        .enqueue(Transaction::new().execute(Statement::new("INSERT second")).commit())
        .unwrap();

    assert_eq!(backend.opened(), 2);
    assert_eq!(
        backend.log().calls(),
        vec![Call::Execute("INSERT second".into()), Call::Commit]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn reset_runs_after_earlier_submissions() {
    let backend = MockBackend::new("sqlite");
    let queue = queue_for(&backend);

    let (written, reset) = tokio::join!(
        queue.enqueue_async(Transaction::new().execute(Statement::new("INSERT before")).commit()),
        queue.reset_async(),
    );
    written.unwrap();
    reset.unwrap();

    assert_eq!(
        backend.log().calls(),
        vec![Call::Execute("INSERT before".into()), Call::Commit, Call::Close]
    );
    assert_eq!(queue.state(), QueueState::Ready);
}

//! Quorum specs
//!
//! Acquisition needs N/2+1 grants and blocks, never fails, below that.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::prelude::*;
use dsync_core::LockMode;

#[tokio::test(flavor = "multi_thread")]
async fn lock_unlock_lock_round_trip() {
    let cluster = TestCluster::start(4).await;
    let dsync = cluster.coordinator();
    let mut mutex = dsync.new_mutex("x");

    mutex.lock().await;
    mutex.unlock().await;
    dsync.flush_releases().await;
    assert!(cluster.holders("x", LockMode::Exclusive).await.is_empty());

    mutex.lock().await;
    assert_eq!(cluster.holders("x", LockMode::Exclusive).await, vec![0, 1, 2, 3]);
    mutex.unlock().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn second_unlock_is_a_no_op() {
    let cluster = TestCluster::start(3).await;
    let dsync = cluster.coordinator();
    let mut first = dsync.new_mutex("x");
    first.lock().await;
    first.unlock().await;

    let mut second = dsync.new_mutex("x");
    second.lock().await;
    first.unlock().await;

    assert!(second.is_locked());
    assert_eq!(cluster.holders("x", LockMode::Exclusive).await, vec![0, 1, 2]);
}

#[tokio::test(flavor = "multi_thread")]
async fn two_of_four_down_blocks_until_third_returns() {
    let mut cluster = TestCluster::start(4).await;
    cluster.kill(2).await;
    cluster.kill(3).await;

    let dsync = cluster.coordinator();
    let mut mutex = dsync.new_mutex("x");
    let mut waiter = tokio::spawn(async move {
        mutex.lock().await;
        mutex
    });
    assert!(still_blocked(&mut waiter, BLOCKED).await);

    cluster.restart(2).await;
    let mut mutex = waiter.await.unwrap();
    assert_eq!(mutex.exclusive_grant().unwrap().nodes, vec![0, 1, 2]);
    mutex.unlock().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn five_nodes_tolerate_two_failures() {
    let mut cluster = TestCluster::start(5).await;
    cluster.kill(0).await;
    cluster.kill(4).await;

    let dsync = cluster.coordinator();
    let mut mutex = dsync.new_mutex("x");
    mutex.lock().await;
    assert_eq!(mutex.exclusive_grant().unwrap().nodes, vec![1, 2, 3]);
    mutex.unlock().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn held_lock_survives_quorum_loss_and_blocks_competitor() {
    let mut cluster = TestCluster::start(4).await;
    let holder = cluster.coordinator();
    let mut held = holder.new_mutex("x");
    held.lock().await;

    cluster.kill(2).await;
    cluster.kill(3).await;

    let competitor = cluster.coordinator();
    let mut other = competitor.new_mutex("x");
    let mut waiter = tokio::spawn(async move {
        other.lock().await;
        other
    });
    assert!(still_blocked(&mut waiter, BLOCKED).await);
    assert!(held.is_locked());

    cluster.restart(2).await;
    cluster.restart(3).await;
    assert!(still_blocked(&mut waiter, BLOCKED).await);

    held.unlock().await;
    let mut other = waiter.await.unwrap();
    assert!(other.is_locked());
    other.unlock().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn restarting_a_majority_lets_a_second_writer_in() {
    let mut cluster = TestCluster::start(4).await;
    let holder = cluster.coordinator();
    let mut first = holder.new_mutex("x");
    first.lock().await;

    for i in 1..4 {
        cluster.kill(i).await;
    }
    for i in 1..4 {
        cluster.restart(i).await;
    }

    // Both handles now believe they hold the lock
    let competitor = cluster.coordinator();
    let mut second = competitor.new_mutex("x");
    second.lock().await;
    assert!(first.is_locked());
    assert_eq!(second.exclusive_grant().unwrap().nodes, vec![1, 2, 3]);

    first.unlock().await;
    second.unlock().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn writers_on_separate_coordinators_never_overlap() {
    let cluster = TestCluster::start(3).await;
    let inside = Arc::new(AtomicUsize::new(0));
    let max_inside = Arc::new(AtomicUsize::new(0));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let dsync = cluster.coordinator();
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            tokio::spawn(async move {
                let mut mutex = dsync.new_mutex("counter");
                for _ in 0..3 {
                    mutex.lock().await;
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                    mutex.unlock().await;
                }
            })
        })
        .collect();

    for worker in workers {
        worker.await.unwrap();
    }
    assert_eq!(max_inside.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn readers_share_and_writer_waits() {
    let cluster = TestCluster::start(3).await;
    let a = cluster.coordinator();
    let b = cluster.coordinator();

    let mut reader_a = a.new_mutex("x");
    let mut reader_b = b.new_mutex("x");
    reader_a.rlock().await;
    reader_b.rlock().await;
    assert_eq!(cluster.holders("x", LockMode::Shared).await, vec![0, 1, 2]);

    let writer_dsync = cluster.coordinator();
    let mut writer = writer_dsync.new_mutex("x");
    let mut waiter = tokio::spawn(async move {
        writer.lock().await;
        writer
    });
    assert!(still_blocked(&mut waiter, Duration::from_secs(1)).await);

    reader_a.runlock().await;
    assert!(still_blocked(&mut waiter, Duration::from_secs(1)).await);
    reader_b.runlock().await;

    let mut writer = waiter.await.unwrap();
    assert!(writer.is_locked());
    writer.unlock().await;
}

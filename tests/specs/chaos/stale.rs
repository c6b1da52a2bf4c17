//! Stale grant specs
//!
//! Nodes have no leases: grants nobody releases stay until force-unlocked.

use crate::prelude::*;
use dsync_core::LockMode;

#[tokio::test(flavor = "multi_thread")]
async fn single_stale_node_is_tolerated() {
    let cluster = TestCluster::start(4).await;
    cluster.plant_stale(2, "test").await;

    let dsync = cluster.coordinator();
    let mut mutex = dsync.new_mutex("test");
    mutex.lock().await;
    assert_eq!(mutex.exclusive_grant().unwrap().nodes, vec![0, 1, 3]);
    mutex.unlock().await;
    dsync.flush_releases().await;

    // The stale entry is still there afterwards
    assert_eq!(cluster.holders("test", LockMode::Exclusive).await, vec![2]);
}

#[tokio::test(flavor = "multi_thread")]
async fn stale_grants_beyond_tolerance_block() {
    let cluster = TestCluster::start(4).await;
    cluster.plant_stale(0, "test").await;
    cluster.plant_stale(3, "test").await;

    let dsync = cluster.coordinator();
    let mut mutex = dsync.new_mutex("test");
    assert!(still_blocked(mutex.lock(), BLOCKED).await);
}

#[tokio::test(flavor = "multi_thread")]
async fn crashed_client_locks_resource_until_force_unlock() {
    let cluster = TestCluster::start(4).await;
    {
        let crashed = cluster.coordinator();
        let mut reader = crashed.new_mutex("test-stale");
        reader.rlock().await;
        crashed.shutdown();
        // Dropped without runlock
    }

    let dsync = cluster.coordinator();
    let mut mutex = dsync.new_mutex("test-stale");
    assert!(still_blocked(mutex.lock(), BLOCKED).await);

    for i in 0..4 {
        assert!(cluster.locker(i).force_unlock("test-stale").await.unwrap());
    }
    mutex.lock().await;
    mutex.unlock().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn release_to_dead_node_finishes_after_restart() {
    let mut cluster = TestCluster::start(3).await;
    let dsync = cluster.coordinator();
    let mut mutex = dsync.new_mutex("x");
    mutex.lock().await;

    cluster.kill(1).await;
    mutex.unlock().await;
    dsync.flush_releases().await;
    assert_eq!(dsync.pending_releases(), 1);

    cluster.restart(1).await;
    let deadline = tokio::time::Instant::now() + BLOCKED;
    while dsync.pending_releases() > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(dsync.pending_releases(), 0);
}

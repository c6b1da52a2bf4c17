//! End-to-end failure scenario on four nodes (quorum 3)

use crate::prelude::*;

#[tokio::test(flavor = "multi_thread")]
async fn kill_restart_scenario() {
    let mut cluster = TestCluster::start(4).await;
    let dsync = cluster.coordinator();

    // Two nodes down: below quorum
    cluster.kill(2).await;
    cluster.kill(3).await;
    let mut mutex = dsync.new_mutex("x");
    let mut waiter = tokio::spawn(async move {
        mutex.lock().await;
        mutex
    });
    assert!(still_blocked(&mut waiter, BLOCKED).await);

    // One node back: quorum again
    cluster.restart(3).await;
    let mut mutex = tokio::time::timeout(BLOCKED, waiter)
        .await
        .expect("lock not granted after quorum returned")
        .unwrap();
    assert_eq!(mutex.exclusive_grant().unwrap().nodes, vec![0, 1, 3]);

    // Lose it again while held, then release
    cluster.kill(3).await;
    mutex.unlock().await;

    let mut waiter = tokio::spawn(async move {
        mutex.lock().await;
        mutex
    });
    assert!(still_blocked(&mut waiter, BLOCKED).await);

    cluster.restart(3).await;
    let mut mutex = tokio::time::timeout(BLOCKED, waiter)
        .await
        .expect("lock not granted after node relaunch")
        .unwrap();
    assert_eq!(mutex.exclusive_grant().unwrap().nodes, vec![0, 1, 3]);
    mutex.unlock().await;
}

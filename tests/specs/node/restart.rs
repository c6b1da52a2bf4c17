//! Node restart specs
//!
//! A node keeps its table only in memory.

use crate::prelude::*;
use dsync_core::{LockArgs, LockerError, NetLocker, Uid};

#[tokio::test]
async fn killed_node_refuses_calls() {
    let mut cluster = TestCluster::start(1).await;
    cluster.kill(0).await;

    let args = LockArgs::new("x", Uid::new("a"), "spec");
    let err = cluster.locker(0).lock(&args).await.unwrap_err();
    assert!(matches!(err, LockerError::Unreachable(..)));
}

#[tokio::test]
async fn restarted_node_forgets_grants() {
    let mut cluster = TestCluster::start(1).await;
    let args = LockArgs::new("x", Uid::new("a"), "spec");
    assert!(cluster.locker(0).lock(&args).await.unwrap());

    cluster.kill(0).await;
    cluster.restart(0).await;

    let (_, locks) = cluster.locker(0).status().await.unwrap();
    assert!(locks.is_empty());
    assert!(!cluster.locker(0).unlock(&args).await.unwrap());
}

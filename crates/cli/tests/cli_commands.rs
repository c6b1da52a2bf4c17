// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests against in-process lock nodes
//!
//! Nodes run on a background tokio runtime while the `dsync` binary is
//! driven synchronously through assert_cmd.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(deprecated)]

use assert_cmd::Command;
use dsync_core::{LockArgs, NetLocker, Uid};
use dsync_node::{startup, NodeConfig, RemoteLocker};
use predicates::prelude::*;
use tokio::runtime::Runtime;

struct Cluster {
    runtime: Runtime,
    endpoints: Vec<String>,
}

impl Cluster {
    fn start(n: usize) -> Self {
        let runtime = Runtime::new().unwrap();
        let endpoints = runtime.block_on(async {
            let mut endpoints = Vec::new();
            for _ in 0..n {
                let state = startup(&NodeConfig::new("127.0.0.1:0")).await.unwrap();
                endpoints.push(state.local_addr().unwrap().to_string());
                tokio::spawn(state.run(std::future::pending()));
            }
            endpoints
        });
        Self { runtime, endpoints }
    }

    fn nodes_arg(&self) -> String {
        self.endpoints.join(",")
    }

    fn lock_directly(&self, index: usize, resource: &str) {
        let locker = RemoteLocker::new(&self.endpoints[index]);
        let args = LockArgs::new(resource, Uid::new("stale"), "gone");
        assert!(self.runtime.block_on(locker.lock(&args)).unwrap());
    }

    fn is_free(&self, index: usize, resource: &str) -> bool {
        let locker = RemoteLocker::new(&self.endpoints[index]);
        let (_, locks) = self.runtime.block_on(locker.status()).unwrap();
        !locks.iter().any(|l| l.resource == resource)
    }
}

fn dsync() -> Command {
    let mut cmd = Command::cargo_bin("dsync").unwrap();
    cmd.env_remove("DSYNC_NODES").env_remove("RUST_LOG");
    cmd
}

#[test]
fn run_executes_command_under_lock_and_releases() {
    let cluster = Cluster::start(3);

    dsync()
        .args(["--nodes", &cluster.nodes_arg(), "run", "build", "--", "echo", "inside"])
        .assert()
        .success()
        .stdout(predicate::str::contains("inside"));

    for i in 0..3 {
        assert!(cluster.is_free(i, "build"));
    }
}

#[test]
fn run_propagates_exit_code() {
    let cluster = Cluster::start(3);

    dsync()
        .args(["--nodes", &cluster.nodes_arg(), "run", "build", "--", "sh", "-c", "exit 7"])
        .assert()
        .code(7);

    assert!(cluster.is_free(0, "build"));
}

#[test]
fn run_reads_nodes_from_environment() {
    let cluster = Cluster::start(3);

    dsync()
        .env("DSYNC_NODES", cluster.nodes_arg())
        .args(["run", "--shared", "reports", "--", "true"])
        .assert()
        .success();
}

#[test]
fn status_lists_held_locks() {
    let cluster = Cluster::start(3);
    cluster.lock_directly(1, "jobs/42");

    dsync()
        .args(["--nodes", &cluster.nodes_arg(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("jobs/42"))
        .stdout(predicate::str::contains("stale"))
        .stdout(predicate::str::contains("3/3 nodes reachable (quorum 2)"));
}

#[test]
fn status_json_reports_unreachable_node() {
    let cluster = Cluster::start(2);
    let nodes = format!("{},127.0.0.1:1", cluster.nodes_arg());

    let output = dsync()
        .args(["--nodes", &nodes, "--output", "json", "status"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let statuses: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(statuses.as_array().unwrap().len(), 3);
    assert_eq!(statuses[0]["reachable"], true);
    assert_eq!(statuses[2]["reachable"], false);
}

#[test]
fn force_unlock_clears_stale_entries() {
    let cluster = Cluster::start(3);
    cluster.lock_directly(0, "jobs/42");
    cluster.lock_directly(2, "jobs/42");

    dsync()
        .args(["--nodes", &cluster.nodes_arg(), "force-unlock", "jobs/42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed"))
        .stdout(predicate::str::contains("not held"));

    for i in 0..3 {
        assert!(cluster.is_free(i, "jobs/42"));
    }
}

#[test]
fn missing_nodes_is_an_error() {
    dsync()
        .args(["status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no lock nodes given"));
}

#[test]
fn run_requires_a_command() {
    dsync()
        .args(["--nodes", "127.0.0.1:1", "run", "build"])
        .assert()
        .failure();
}

//! CLI help specs
//!
//! Verify both binaries describe their surface.

use crate::prelude::*;

#[test]
fn dsync_help_lists_commands() {
    dsync()
        .args(&["--help"])
        .passes()
        .stdout_has("hold")
        .stdout_has("run")
        .stdout_has("status")
        .stdout_has("force-unlock")
        .stdout_has("--nodes");
}

#[test]
fn dsync_run_help_mentions_shared_mode() {
    dsync()
        .args(&["run", "--help"])
        .passes()
        .stdout_has("--shared");
}

#[test]
fn dsync_without_command_fails() {
    dsync().args(&[]).fails().stderr_has("Usage");
}

#[test]
fn lockd_help_lists_options() {
    lockd()
        .args(&["--help"])
        .passes()
        .stdout_has("--listen")
        .stdout_has("--port")
        .stdout_has("--log-file");
}

#[test]
fn lockd_rejects_listen_and_port_together() {
    lockd()
        .args(&["--listen", "127.0.0.1:0", "--port", "1"])
        .fails();
}

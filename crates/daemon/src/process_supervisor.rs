// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawns and signals agent processes.
//!
//! Deliberately uses `std::process::Command` rather than
//! `tokio::process::Command`: reaping is owned entirely by the
//! [`crate::signal_bridge`]'s `waitpid(-1, WNOHANG)` loop, and mixing
//! that with tokio's own SIGCHLD-driven child reaper would race two
//! reapers over the same pids.

use std::path::Path;
use std::process::Command;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use sched_core::LaunchError;

/// Spawns the meta-agent's command rooted at `agent_dir`. Remote-host
/// transport for a non-local host address is not implemented; execution
/// is always local to the scheduler's own machine (see the component
/// design's launch contract).
pub fn spawn(command: &str, agent_dir: &Path) -> Result<u32, LaunchError> {
    let child = Command::new(command)
        .current_dir(agent_dir)
        .spawn()
        .map_err(|source| LaunchError::SpawnFailed(source.to_string()))?;
    Ok(child.id())
}

/// Sends graceful termination. Failure (e.g. the pid is already gone) is
/// not surfaced — a SIGCHLD reaping it out from under us is the expected
/// race, not an error.
pub fn send_terminate(pid: u32) {
    let _ = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
}

#[cfg(test)]
#[path = "process_supervisor_tests.rs"]
mod tests;

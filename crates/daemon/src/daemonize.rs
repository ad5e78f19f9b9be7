// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Detaches into the background for `-d`/`--daemon-mode` without `fork`:
//! re-exec the same binary (dropping the flag so the child doesn't loop),
//! with stdio sent to `/dev/null` and placed in its own process group so
//! closing the invoking terminal can't signal it. The original process
//! then exits, handing the foreground back immediately.
//!
//! This trades the textbook double-fork for a strategy that needs no
//! `unsafe` — the workspace forbids it outright.

use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};

use crate::error::DaemonizeError;

const DAEMON_MODE_FLAGS: [&str; 2] = ["-d", "--daemon-mode"];

/// Re-execs the current binary, stripped of the daemon-mode flag, as a
/// detached child, then exits the calling process. Never returns on
/// success; the exit happens inside this function.
pub fn daemonize() -> Result<(), DaemonizeError> {
    let exe = std::env::current_exe().map_err(DaemonizeError::CurrentExe)?;
    let args = std::env::args_os().skip(1).filter(|arg| !DAEMON_MODE_FLAGS.iter().any(|flag| arg == flag));

    Command::new(exe)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0)
        .spawn()
        .map_err(DaemonizeError::Spawn)?;

    std::process::exit(0);
}

// No test module: the only behavior to exercise is re-exec-then-exit,
// which would replace the test binary's own process.

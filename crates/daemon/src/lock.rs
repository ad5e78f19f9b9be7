// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Singleton instance lock.
//!
//! A regular file under the state directory, advisory-locked with
//! `fs2`, stands in for the original implementation's POSIX shared
//! memory object. Its contents are the owning pid, written as a
//! 9-character zero-padded decimal (matching the original's `%-9.9d`
//! sprintf format) so a stale read is unambiguous.
//!
//! `acquire` returns a tagged [`LockOutcome`] distinguishing "I am now
//! the owner" from "another live owner exists" — the original's
//! `lock_scheduler` conflated these into a single return value, which
//! this implementation fixes (see the design notes' open questions).

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use fs2::FileExt;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::error::LifecycleError;

/// Outcome of [`acquire`]. The `File` inside `Owner` must be kept alive
/// for the lifetime of the lock; dropping it releases the OS lock.
pub enum LockOutcome {
    Owner(File),
    AlreadyRunning(u32),
}

pub fn acquire(lock_path: &Path) -> Result<LockOutcome, LifecycleError> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .map_err(LifecycleError::LockFailed)?;

    match file.try_lock_exclusive() {
        Ok(()) => {
            write_pid(&mut file, std::process::id())?;
            Ok(LockOutcome::Owner(file))
        }
        Err(_) => {
            let pid = read_pid(&mut file).unwrap_or(0);
            if pid != 0 && is_alive(pid) {
                Ok(LockOutcome::AlreadyRunning(pid))
            } else {
                // Stale lock from a dead owner; the OS already released
                // its advisory lock along with the process, so retry
                // once, now that we know the original holder is gone.
                file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;
                write_pid(&mut file, std::process::id())?;
                Ok(LockOutcome::Owner(file))
            }
        }
    }
}

fn write_pid(file: &mut File, pid: u32) -> Result<(), LifecycleError> {
    file.set_len(0).map_err(LifecycleError::Io)?;
    file.seek(SeekFrom::Start(0)).map_err(LifecycleError::Io)?;
    write!(file, "{pid:09}").map_err(LifecycleError::Io)?;
    file.flush().map_err(LifecycleError::Io)?;
    Ok(())
}

fn read_pid(file: &mut File) -> Option<u32> {
    file.seek(SeekFrom::Start(0)).ok()?;
    let mut buf = String::new();
    file.read_to_string(&mut buf).ok()?;
    buf.trim().parse().ok()
}

fn is_alive(pid: u32) -> bool {
    signal::kill(Pid::from_raw(pid as i32), None).is_ok()
}

/// Sends graceful termination to the locked instance, mirroring
/// `kill_scheduler`'s SIGQUIT. Does not unlink the lock file; the owner
/// removes it on clean exit.
pub fn kill_running(lock_path: &Path) -> Result<(), LifecycleError> {
    let mut file = OpenOptions::new().read(true).open(lock_path).map_err(|_| LifecycleError::NotRunning)?;
    let pid = read_pid(&mut file).ok_or(LifecycleError::NotRunning)?;
    signal::kill(Pid::from_raw(pid as i32), Signal::SIGQUIT).map_err(|_| LifecycleError::NotRunning)?;
    Ok(())
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;

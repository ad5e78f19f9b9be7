// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed error hierarchy: one focused enum per fallible subsystem rather
//! than a single crate-wide error type.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A single bad config entry. Logged and skipped; never fatal on its
/// own (see [`LifecycleError`] for what *is* fatal).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, #[source] source: io::Error },

    #[error("failed to parse {path} as TOML: {source}")]
    Parse { path: PathBuf, #[source] source: toml::de::Error },

    #[error("{path}: missing required key {key:?} in [default]")]
    MissingKey { path: PathBuf, key: &'static str },

    #[error("{path}: entry name or command is empty")]
    EmptyField { path: PathBuf },
}

/// Startup/shutdown failures that prevent the scheduler from running at
/// all.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine or create the state directory")]
    NoStateDir,

    #[error("failed to acquire the singleton instance lock")]
    LockFailed(#[source] io::Error),

    #[error("failed to bind control listener on {0}: {1}")]
    BindFailed(String, io::Error),

    #[error("failed to load config: {0}")]
    ConfigLoad(#[source] ConfigError),

    #[error("no hosts were loaded from config; refusing to start")]
    NoHosts,

    #[error("no meta-agents were loaded from config; refusing to start")]
    NoMetaAgents,

    #[error("no instance appears to be running")]
    NotRunning,

    #[error("failed to drop privileges: {0}")]
    PrivilegeDrop(#[source] PrivilegeError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failure during the `-d`/`--daemon-mode` re-exec-and-detach sequence.
/// Always fatal; there is no well-defined process state to recover into.
#[derive(Debug, Error)]
pub enum DaemonizeError {
    #[error("could not determine the path to the running executable: {0}")]
    CurrentExe(#[source] io::Error),

    #[error("failed to spawn the detached child: {0}")]
    Spawn(#[source] io::Error),
}

/// Failure dropping from root to the configured unprivileged user/group.
/// Always fatal; see the concurrency model's privilege-drop requirement.
#[derive(Debug, Error)]
pub enum PrivilegeError {
    #[error("unknown group {0:?}")]
    UnknownGroup(String),

    #[error("unknown user {0:?}")]
    UnknownUser(String),

    #[error("setgid failed: {0}")]
    SetGid(#[source] nix::Error),

    #[error("initgroups failed: {0}")]
    InitGroups(#[source] nix::Error),

    #[error("setuid failed: {0}")]
    SetUid(#[source] nix::Error),
}

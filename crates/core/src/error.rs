// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the scheduling engine.

use thiserror::Error;

/// Failure modes of [`crate::supervisor::AgentSupervisor::launch`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("host has no free capacity")]
    NoHostCapacity,

    #[error("no meta-agent registered for job type {0:?}")]
    NoMetaAgent(String),

    #[error("failed to spawn agent process: {0}")]
    SpawnFailed(String),
}

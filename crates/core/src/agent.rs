// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agents: worker processes executing one job to completion.

use crate::host::HostId;
use crate::job::JobId;

crate::define_id! {
    /// Identifies a live or recently-dead agent process.
    pub struct AgentId("agt-");
}

/// Lifecycle state of an [`Agent`]. Bounded by its OS process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Spawning,
    Ready,
    Working,
    Dying,
    Dead,
}

crate::simple_display! {
    AgentState {
        Spawning => "spawning",
        Ready => "ready",
        Working => "working",
        Dying => "dying",
        Dead => "dead",
    }
}

/// A worker process executing one job to completion.
///
/// `pid` is `None` until the daemon's process spawn completes and calls
/// back with the real OS pid (see `AgentSupervisor::attach_pid`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub id: AgentId,
    pub pid: Option<u32>,
    pub host: HostId,
    pub meta_agent: String,
    pub job: JobId,
    pub state: AgentState,
    pub started_at_ms: u64,
}

impl Agent {
    pub fn new(host: HostId, meta_agent: impl Into<String>, job: JobId, started_at_ms: u64) -> Self {
        Self {
            id: AgentId::new(),
            pid: None,
            host,
            meta_agent: meta_agent.into(),
            job,
            state: AgentState::Spawning,
            started_at_ms,
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;

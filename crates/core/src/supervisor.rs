// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracks spawned agent processes and routes their status back to jobs.
//!
//! This module owns no process I/O. The daemon crate performs the actual
//! `fork`/`exec`, calls [`AgentSupervisor::launch`] to reserve host
//! capacity and link the job before spawning, then [`AgentSupervisor::attach_pid`]
//! once the real OS pid is known.

use std::collections::HashMap;

use crate::agent::{Agent, AgentId, AgentState};
use crate::clock::{Clock, SystemClock};
use crate::error::LaunchError;
use crate::host::{HostId, HostRegistry};
use crate::job::{Job, JobState};
use crate::meta_agent::MetaAgentRegistry;

/// Resolved outcome of an agent's death, handed back to the caller so it
/// can update the job and release any queue bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentDeath {
    pub agent_id: AgentId,
    pub job_id: crate::job::JobId,
    pub resolved_state: JobState,
}

#[derive(Debug)]
pub struct AgentSupervisor<C: Clock = SystemClock> {
    clock: C,
    agents: HashMap<AgentId, Agent>,
    by_pid: HashMap<u32, AgentId>,
}

impl Default for AgentSupervisor<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> AgentSupervisor<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            agents: HashMap::new(),
            by_pid: HashMap::new(),
        }
    }

    /// Reserves a host slot, links `job` to a new agent, and transitions
    /// the job PENDING -> RUNNING. Does not spawn an OS process; the
    /// caller spawns the process and calls [`Self::attach_pid`].
    pub fn launch(
        &mut self,
        hosts: &mut HostRegistry,
        meta_agents: &MetaAgentRegistry,
        host_id: &HostId,
        job: &mut Job,
    ) -> Result<AgentId, LaunchError> {
        let meta = meta_agents
            .get(&job.type_name)
            .ok_or_else(|| LaunchError::NoMetaAgent(job.type_name.clone()))?;
        let host = hosts.get_mut(host_id).ok_or(LaunchError::NoHostCapacity)?;
        if host.free_capacity() == 0 {
            return Err(LaunchError::NoHostCapacity);
        }
        host.running_agents += 1;

        let agent = Agent::new(host_id.clone(), meta.name.clone(), job.id, self.clock.epoch_ms());
        let agent_id = agent.id;
        job.state = JobState::Running;
        job.assigned_agent = Some(agent_id);
        self.agents.insert(agent_id, agent);
        Ok(agent_id)
    }

    /// Records the real OS pid once the daemon has spawned the process.
    pub fn attach_pid(&mut self, agent_id: &AgentId, pid: u32) {
        if let Some(agent) = self.agents.get_mut(agent_id) {
            agent.pid = Some(pid);
            self.by_pid.insert(pid, *agent_id);
        }
    }

    pub fn notify_ready(&mut self, pid: u32) -> Option<AgentId> {
        let id = *self.by_pid.get(&pid)?;
        if let Some(agent) = self.agents.get_mut(&id) {
            if agent.state == AgentState::Spawning {
                agent.state = AgentState::Ready;
            }
        }
        Some(id)
    }

    pub fn notify_working(&mut self, pid: u32) -> Option<AgentId> {
        let id = *self.by_pid.get(&pid)?;
        if let Some(agent) = self.agents.get_mut(&id) {
            agent.state = AgentState::Working;
        }
        Some(id)
    }

    /// Retires an agent that never made it past [`Self::launch`] (the OS
    /// spawn itself failed, so [`Self::attach_pid`] was never called).
    /// Releases the host slot `launch` reserved and drops the agent
    /// record; a no-op for an unknown id or one that already has a pid
    /// (that case is a real process and belongs to [`Self::notify_death`]).
    pub fn retire_spawn_failure(&mut self, agent_id: &AgentId, hosts: &mut HostRegistry) {
        let Some(agent) = self.agents.get(agent_id) else { return };
        if agent.pid.is_some() {
            return;
        }
        if let Some(host) = hosts.get_mut(&agent.host) {
            host.running_agents = host.running_agents.saturating_sub(1);
        }
        self.agents.remove(agent_id);
    }

    /// Retires a dead process. Returns `None` for an unknown pid (a death
    /// notification racing an already-retired record is ignored, not an
    /// error — see the signal-race handling in the error design).
    pub fn notify_death(&mut self, pid: u32, exit_status: i32, hosts: &mut HostRegistry) -> Option<AgentDeath> {
        let id = self.by_pid.remove(&pid)?;
        let agent = self.agents.remove(&id)?;
        if let Some(host) = hosts.get_mut(&agent.host) {
            host.running_agents = host.running_agents.saturating_sub(1);
        }
        let resolved_state = if exit_status == 0 { JobState::Complete } else { JobState::Failed };
        Some(AgentDeath {
            agent_id: id,
            job_id: agent.job,
            resolved_state,
        })
    }

    /// Pids of every agent that is not yet DEAD, for the caller to send a
    /// graceful termination signal to. Does not mutate state itself.
    pub fn kill_all(&self) -> Vec<u32> {
        self.agents.values().filter_map(|a| a.pid).collect()
    }

    pub fn live_count(&self) -> usize {
        self.agents.values().filter(|a| a.state != AgentState::Dead).count()
    }

    pub fn get(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;

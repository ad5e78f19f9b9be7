// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduler's tick algorithm: which (job, host, agent-type) triples
//! to launch this turn, and the exclusivity lockout that keeps an
//! EXCLUSIVE job's run free of concurrent mutators.

use crate::agent::AgentId;
use crate::clock::Clock;
use crate::error::LaunchError;
use crate::host::HostRegistry;
use crate::job::{Job, JobQueue};
use crate::meta_agent::MetaAgentRegistry;
use crate::supervisor::AgentSupervisor;

/// A side effect the caller must carry out: spawn a process, or stop the
/// event loop. The policy itself never touches the OS.
#[derive(Debug, Clone)]
pub enum TickEffect {
    Launch {
        agent_id: AgentId,
        job: Job,
        host_id: crate::host::HostId,
        command: String,
        agent_dir: std::path::PathBuf,
    },
    Terminate,
}

/// Borrowed collaborators a tick needs. Bundled so `tick`'s signature
/// doesn't grow every time a new collaborator joins.
pub struct PolicyCtx<'a, C: Clock> {
    pub queue: &'a mut dyn JobQueue,
    pub hosts: &'a mut HostRegistry,
    pub meta_agents: &'a MetaAgentRegistry,
    pub supervisor: &'a mut AgentSupervisor<C>,
}

/// Tick state: the job deferred pending a drained system, and whether
/// the system is currently locked out for an exclusive run.
#[derive(Debug)]
pub struct SchedulerPolicy {
    deferred_job: Option<Job>,
    lockout: bool,
    closing: bool,
}

impl SchedulerPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_lockout(&self) -> bool {
        self.lockout
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    /// Requests a graceful shutdown. The policy stops admitting new
    /// agents; the loop terminates once the system drains.
    pub fn begin_close(&mut self) {
        self.closing = true;
    }

    /// Runs one tick. See the module doc for the algorithm; step numbers
    /// below match the design notes this implements.
    pub fn tick<C: Clock>(&mut self, ctx: PolicyCtx<'_, C>) -> Vec<TickEffect> {
        let PolicyCtx {
            queue,
            hosts,
            meta_agents,
            supervisor,
        } = ctx;

        let mut effects = Vec::new();
        let live_agents = supervisor.live_count();
        let active_jobs = queue.active_count();

        // 1. Fully drained and closing: stop the loop.
        if self.closing && live_agents == 0 && active_jobs == 0 {
            effects.push(TickEffect::Terminate);
            return effects;
        }

        // 2. Drained and no longer need the lockout: clear it.
        if self.lockout && live_agents == 0 && active_jobs == 0 {
            self.lockout = false;
        }

        // 3. Pull and launch non-exclusive jobs until one is exclusive,
        //    capacity runs out, or the queue is empty.
        if self.deferred_job.is_none() && !self.lockout {
            let host_count = hosts.len() as u32;
            let global_capacity = |type_name: &str| meta_agents.global_capacity(type_name, host_count);

            loop {
                let Some(mut job) = queue.next_job(&global_capacity) else {
                    break;
                };
                if meta_agents.is_exclusive(&job.type_name) {
                    self.deferred_job = Some(job);
                    break;
                }
                match hosts.get_host(1) {
                    Some(host_id) => match launch(supervisor, hosts, meta_agents, &host_id, &mut job) {
                        Ok(agent_id) => effects.push(make_launch_effect(agent_id, job, host_id, meta_agents, hosts)),
                        Err(_) => {
                            queue.release(job);
                            break;
                        }
                    },
                    None => {
                        queue.release(job);
                        break;
                    }
                }
            }
        }

        // 4. The system has drained for a deferred exclusive job: launch
        //    it alone and enter lockout.
        if self.deferred_job.is_some() && supervisor.live_count() == 0 && queue.active_count() == 0 {
            if let Some(host_id) = hosts.get_host(1) {
                let mut job = self.deferred_job.take().expect("checked is_some above");
                match launch(supervisor, hosts, meta_agents, &host_id, &mut job) {
                    Ok(agent_id) => {
                        self.lockout = true;
                        effects.push(make_launch_effect(agent_id, job, host_id, meta_agents, hosts));
                    }
                    Err(_) => {
                        // No host capacity even with the system drained
                        // (e.g. an empty host registry). Keep the job
                        // deferred and retry next tick.
                        self.deferred_job = Some(job);
                    }
                }
            }
        }

        effects
    }
}

fn launch<C: Clock>(
    supervisor: &mut AgentSupervisor<C>,
    hosts: &mut HostRegistry,
    meta_agents: &MetaAgentRegistry,
    host_id: &crate::host::HostId,
    job: &mut Job,
) -> Result<AgentId, LaunchError> {
    supervisor.launch(hosts, meta_agents, host_id, job)
}

fn make_launch_effect(
    agent_id: AgentId,
    job: Job,
    host_id: crate::host::HostId,
    meta_agents: &MetaAgentRegistry,
    hosts: &HostRegistry,
) -> TickEffect {
    let meta = meta_agents.get(&job.type_name).expect("launch already validated the meta-agent");
    let host = hosts.get(&host_id).expect("launch already validated the host");
    TickEffect::Launch {
        agent_id,
        job,
        host_id,
        command: meta.command.clone(),
        agent_dir: host.agent_dir.clone(),
    }
}

impl Default for SchedulerPolicy {
    #[allow(clippy::derivable_impls)]
    fn default() -> Self {
        Self {
            deferred_job: None,
            lockout: false,
            closing: false,
        }
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;

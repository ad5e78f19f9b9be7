// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The event loop: drains [`Event`]s fed by [`crate::signal_bridge`] and
//! [`crate::listener`], applies them to [`DaemonState`], and runs one
//! [`SchedulerPolicy`] tick after each. `TickEffect::Launch` is carried
//! out here (the only place the loop calls into the OS); everything
//! before that is pure bookkeeping against core's types.

use tokio::sync::mpsc::UnboundedReceiver;

use sched_core::{Event, JobState, PolicyCtx, TickEffect};

use crate::config::{load_agent_configs, load_main_config};
use crate::lifecycle::{Config, DaemonState};
use crate::process_supervisor;

/// Runs until a tick produces [`TickEffect::Terminate`] or the channel
/// closes, then releases the singleton lock. Consumes `state`, since
/// nothing outside the loop needs it once this returns.
pub async fn run(mut state: DaemonState, mut events: UnboundedReceiver<Event>, config: &Config) {
    apply_tick(&mut state);

    while let Some(event) = events.recv().await {
        apply_event(&mut state, event, config);
        if apply_tick(&mut state) {
            break;
        }
    }

    state.shutdown(config);
}

fn apply_event(state: &mut DaemonState, event: Event, config: &Config) {
    match event {
        Event::AgentDeath(deaths) => {
            for (pid, exit_status) in deaths {
                let Some(death) = state.supervisor.notify_death(pid, exit_status, &mut state.hosts) else {
                    tracing::debug!(pid, "death notification for an untracked pid, ignoring");
                    continue;
                };
                let Some(mut job) = state.queue.take_active(&death.job_id) else {
                    tracing::warn!(job_id = %death.job_id, "agent death for a job missing from the active set");
                    continue;
                };
                job.state = death.resolved_state;
                job.assigned_agent = None;
                tracing::info!(job_id = %job.id, state = %job.state, "job reached a terminal state");
                state.job_store.persist(&job);
            }
        }
        Event::AgentUpdate => {
            // Nothing to poll beyond the SIGCHLD-driven reap; this tick
            // mainly exists to refresh the status snapshot below.
        }
        Event::DatabaseUpdate => {
            for job in state.job_store.load_pending() {
                if job.state == JobState::Pending {
                    state.queue.enqueue(job);
                }
            }
        }
        Event::ConfigReload => reload_config(state, config),
        Event::SchedulerClose => {
            tracing::info!("graceful shutdown requested");
            state.policy.begin_close();
            for pid in state.supervisor.kill_all() {
                process_supervisor::send_terminate(pid);
            }
        }
        Event::Tick => {}
    }
}

/// Re-reads the main config and the `mods-enabled` tree and swaps the
/// registries in place. Hosts are reconciled rather than replaced
/// wholesale so an in-flight agent on a host dropped from config is
/// allowed to finish (see [`sched_core::HostRegistry::reconcile`]);
/// meta-agents are replaced outright, per their own "immutable after
/// registration" contract. A failed reload is logged and leaves the
/// running registries untouched — the same non-fatal treatment config
/// errors get at startup.
fn reload_config(state: &mut DaemonState, config: &Config) {
    let (_port, hosts) = match load_main_config(&config.main_config_path, &config.agent_dir) {
        Ok(loaded) => loaded,
        Err(err) => {
            tracing::error!(error = %err, "config reload: failed to load main config, keeping the current registry");
            return;
        }
    };
    if hosts.is_empty() {
        tracing::warn!("config reload: no hosts in the reloaded config, keeping the current registry");
        return;
    }

    let meta_agents = match load_agent_configs(&config.mods_dir) {
        Ok(registry) => registry,
        Err(err) => {
            tracing::error!(error = %err, "config reload: failed to read mods-enabled, keeping the current registry");
            return;
        }
    };
    if meta_agents.is_empty() {
        tracing::warn!("config reload: no meta-agents in the reloaded config, keeping the current registry");
        return;
    }

    state.hosts.reconcile(hosts);
    state.meta_agents = meta_agents;
    tracing::info!("config reloaded");
}

/// Runs one policy tick, carries out its effects, and refreshes the
/// status snapshot. Returns `true` if the loop should terminate.
fn apply_tick(state: &mut DaemonState) -> bool {
    let effects = state.policy.tick(PolicyCtx {
        queue: &mut state.queue,
        hosts: &mut state.hosts,
        meta_agents: &state.meta_agents,
        supervisor: &mut state.supervisor,
    });

    let mut terminate = false;
    for effect in effects {
        match effect {
            TickEffect::Launch {
                agent_id,
                mut job,
                host_id: _,
                command,
                agent_dir,
            } => match process_supervisor::spawn(&command, &agent_dir) {
                Ok(pid) => {
                    state.supervisor.attach_pid(&agent_id, pid);
                    state.job_store.persist(&job);
                    tracing::info!(job_id = %job.id, pid, "launched agent");
                }
                Err(err) => {
                    tracing::error!(job_id = %job.id, reason = %err, "SPAWN_FAILED: failed to exec agent command");
                    state.supervisor.retire_spawn_failure(&agent_id, &mut state.hosts);
                    state.queue.take_active(&job.id);
                    job.state = JobState::Failed;
                    job.assigned_agent = None;
                    state.job_store.persist(&job);
                }
            },
            TickEffect::Terminate => terminate = true,
        }
    }

    let mut snapshot = state.status.lock();
    snapshot.jobs_active = state.queue.active_count();
    snapshot.agents_live = state.supervisor.live_count();
    snapshot.lockout = state.policy.is_lockout();
    snapshot.closing = state.policy.is_closing();
    drop(snapshot);

    terminate
}

#[cfg(test)]
#[path = "event_loop_tests.rs"]
mod tests;

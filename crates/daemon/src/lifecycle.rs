// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup and shutdown sequencing: state directory, singleton lock,
//! config load, control listener bind. Binding the listener happens
//! last, only after every earlier step has validated successfully.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use sched_core::{AgentSupervisor, HostRegistry, InMemoryJobQueue, InMemoryJobStore, JobQueue, JobStore, MetaAgentRegistry, SchedulerPolicy, SystemClock};

use crate::config::{load_agent_configs, load_main_config};
use crate::error::LifecycleError;
use crate::listener::{Listener, StatusSnapshot};
use crate::lock::{self, LockOutcome};

/// Resolved paths and flags a single run needs. Built once in `main` from
/// CLI flags and, where unset, XDG-style defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub main_config_path: PathBuf,
    pub mods_dir: PathBuf,
    pub agent_dir: PathBuf,
    pub lock_path: PathBuf,
    pub port_override: Option<u16>,
    pub reset: bool,
    pub run_as: Option<(String, String)>,
    pub check_interval: std::time::Duration,
}

impl Config {
    pub fn lock_path_for(state_dir: &std::path::Path) -> PathBuf {
        state_dir.join("scheduler.lock")
    }
}

/// Live state a successful [`startup`] hands back to the caller (the
/// event loop). Holds the lock file for its `Drop` to keep it open, and
/// hence the advisory lock held, for as long as the daemon runs.
pub struct DaemonState {
    #[allow(dead_code)] // kept alive only for its Drop; never read
    lock_file: fs::File,
    pub hosts: HostRegistry,
    pub meta_agents: MetaAgentRegistry,
    pub policy: SchedulerPolicy,
    pub queue: InMemoryJobQueue,
    pub supervisor: AgentSupervisor<SystemClock>,
    pub job_store: Box<dyn JobStore>,
    pub status: Arc<Mutex<StatusSnapshot>>,
}

pub enum StartupOutcome {
    /// Another live instance holds the lock; this process should exit
    /// without installing signal handlers.
    AlreadyRunning(u32),
    /// The bound control listener is handed back separately from
    /// `DaemonState` since it is consumed by its own task while the
    /// event loop keeps the rest of the state.
    Started(DaemonState, Listener),
}

pub async fn startup(config: &Config) -> Result<StartupOutcome, LifecycleError> {
    fs::create_dir_all(&config.state_dir).map_err(|_| LifecycleError::NoStateDir)?;

    let lock_file = match lock::acquire(&config.lock_path)? {
        LockOutcome::AlreadyRunning(pid) => return Ok(StartupOutcome::AlreadyRunning(pid)),
        LockOutcome::Owner(file) => file,
    };

    if let Some((user, group)) = &config.run_as {
        if let Err(err) = crate::privilege::drop_privileges(user, group) {
            cleanup_on_failure(config);
            return Err(LifecycleError::PrivilegeDrop(err));
        }
    }

    let (main_port, hosts) = match load_main_config(&config.main_config_path, &config.agent_dir) {
        Ok(loaded) => loaded,
        Err(err) => {
            tracing::error!(error = %err, "fatal: could not load main config");
            cleanup_on_failure(config);
            return Err(LifecycleError::ConfigLoad(err));
        }
    };
    if hosts.is_empty() {
        cleanup_on_failure(config);
        return Err(LifecycleError::NoHosts);
    }

    let meta_agents = match load_agent_configs(&config.mods_dir) {
        Ok(registry) => registry,
        Err(err) => {
            tracing::error!(error = %err, "fatal: could not read mods-enabled directory");
            cleanup_on_failure(config);
            return Err(LifecycleError::ConfigLoad(err));
        }
    };
    if meta_agents.is_empty() {
        cleanup_on_failure(config);
        return Err(LifecycleError::NoMetaAgents);
    }

    let mut job_store: Box<dyn JobStore> = Box::new(InMemoryJobStore::new());
    if config.reset {
        job_store.reset();
    }
    let mut queue = InMemoryJobQueue::new();
    for job in job_store.load_pending() {
        queue.enqueue(job);
    }

    let port = config.port_override.unwrap_or(main_port);
    let listener = match Listener::bind(port).await {
        Ok(listener) => listener,
        Err(err) => {
            cleanup_on_failure(config);
            return Err(err);
        }
    };

    Ok(StartupOutcome::Started(
        DaemonState {
            lock_file,
            hosts,
            meta_agents,
            policy: SchedulerPolicy::new(),
            queue,
            supervisor: AgentSupervisor::new(SystemClock),
            job_store,
            status: Arc::new(Mutex::new(StatusSnapshot::default())),
        },
        listener,
    ))
}

/// Removes anything this attempt created so a retry starts clean.
/// Never called for the case where another instance already owns the
/// lock — that lock file belongs to the running instance.
fn cleanup_on_failure(config: &Config) {
    let _ = fs::remove_file(&config.lock_path);
}

impl DaemonState {
    /// Releases the singleton lock. Jobs are persisted as they reach a
    /// terminal state rather than in a final batch, so there is nothing
    /// left to flush here.
    pub fn shutdown(self, config: &Config) {
        drop(self.lock_file);
        let _ = fs::remove_file(&config.lock_path);
    }

    /// Builds a `DaemonState` without going through [`startup`], for
    /// tests that exercise the event loop directly.
    #[cfg(test)]
    pub fn for_test(hosts: HostRegistry, meta_agents: MetaAgentRegistry, queue: InMemoryJobQueue, job_store: Box<dyn JobStore>) -> Self {
        Self {
            lock_file: tempfile::tempfile().expect("tempfile"),
            hosts,
            meta_agents,
            policy: SchedulerPolicy::new(),
            queue,
            supervisor: AgentSupervisor::new(SystemClock),
            job_store,
            status: Arc::new(Mutex::new(StatusSnapshot::default())),
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

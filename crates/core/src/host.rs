// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution hosts and the host registry.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Identifies a configured execution host. Assigned by the operator at
/// config time (e.g. `"localhost"`, `"worker-1"`), not generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostId(pub String);

impl std::fmt::Display for HostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for HostId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for HostId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A machine (local or remote) on which agents may be launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub id: HostId,
    pub address: String,
    pub agent_dir: PathBuf,
    pub max_agents: u32,
    pub running_agents: u32,
}

impl Host {
    pub fn new(id: impl Into<HostId>, address: impl Into<String>, agent_dir: PathBuf, max_agents: u32) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            agent_dir,
            max_agents,
            running_agents: 0,
        }
    }

    pub fn free_capacity(&self) -> u32 {
        self.max_agents.saturating_sub(self.running_agents)
    }
}

/// Tracks configured execution hosts in registration order.
///
/// `get_host` selects first-fit in registration order, which keeps host
/// selection deterministic for tests rather than load-balancing.
#[derive(Debug, Default)]
pub struct HostRegistry {
    hosts: Vec<Host>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a host. Returns `false` if a host with the same id is
    /// already registered.
    pub fn add(&mut self, host: Host) -> bool {
        if self.hosts.iter().any(|h| h.id == host.id) {
            return false;
        }
        self.hosts.push(host);
        true
    }

    pub fn clear(&mut self) {
        self.hosts.clear();
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn get(&self, id: &HostId) -> Option<&Host> {
        self.hosts.iter().find(|h| &h.id == id)
    }

    pub fn get_mut(&mut self, id: &HostId) -> Option<&mut Host> {
        self.hosts.iter_mut().find(|h| &h.id == id)
    }

    /// Returns the id of the first host (in registration order) with at
    /// least `slots_needed` free capacity.
    pub fn get_host(&self, slots_needed: u32) -> Option<HostId> {
        self.hosts
            .iter()
            .find(|h| h.free_capacity() >= slots_needed)
            .map(|h| h.id.clone())
    }

    /// Replaces the registry with freshly loaded config, carrying over
    /// each surviving host's `running_agents` count so in-flight agents
    /// aren't orphaned mid-reload. A host dropped from config is kept
    /// around — with `max_agents` clamped to its current
    /// `running_agents` so it accepts no new work — for as long as it
    /// still has agents live, so the eventual death notification has a
    /// host record to decrement; it disappears on the reload after it
    /// drains.
    pub fn reconcile(&mut self, loaded: HostRegistry) {
        let mut next = loaded.hosts;
        for host in next.iter_mut() {
            if let Some(existing) = self.hosts.iter().find(|h| h.id == host.id) {
                host.running_agents = existing.running_agents;
            }
        }
        for existing in self.hosts.drain(..) {
            let still_configured = next.iter().any(|h| h.id == existing.id);
            if !still_configured && existing.running_agents > 0 {
                let mut draining = existing;
                draining.max_agents = draining.running_agents;
                next.push(draining);
            }
        }
        self.hosts = next;
    }

    pub fn for_each(&self, mut f: impl FnMut(&Host)) {
        for host in &self.hosts {
            f(host);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Host> {
        self.hosts.iter()
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;

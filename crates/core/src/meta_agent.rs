// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent type templates ("meta-agents") and their registry.

use std::collections::HashMap;

/// Configuration template describing how to launch agents of one type.
///
/// Immutable after registration; a config reload replaces the whole
/// registry rather than mutating entries in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaAgent {
    pub name: String,
    pub command: String,
    pub max_per_host: u32,
    pub exclusive: bool,
}

impl MetaAgent {
    pub fn new(name: impl Into<String>, command: impl Into<String>, max_per_host: u32, exclusive: bool) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            max_per_host,
            exclusive,
        }
    }
}

/// Catalogs agent types by name.
#[derive(Debug, Default)]
pub struct MetaAgentRegistry {
    agents: HashMap<String, MetaAgent>,
}

impl MetaAgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a meta-agent. Rejects duplicate names and empty
    /// name/command, returning `false` in either case.
    pub fn add(&mut self, meta: MetaAgent) -> bool {
        if meta.name.is_empty() || meta.command.is_empty() {
            return false;
        }
        if self.agents.contains_key(&meta.name) {
            return false;
        }
        self.agents.insert(meta.name.clone(), meta);
        true
    }

    pub fn clear(&mut self) {
        self.agents.clear();
    }

    pub fn get(&self, name: &str) -> Option<&MetaAgent> {
        self.agents.get(name)
    }

    pub fn is_exclusive(&self, name: &str) -> bool {
        self.agents.get(name).map(|m| m.exclusive).unwrap_or(false)
    }

    /// A type's global run capacity across the whole fleet:
    /// `max_per_host * registered_host_count`.
    pub fn global_capacity(&self, name: &str, host_count: u32) -> u32 {
        self.agents
            .get(name)
            .map(|m| m.max_per_host.saturating_mul(host_count))
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
#[path = "meta_agent_tests.rs"]
mod tests;

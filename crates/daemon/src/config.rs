// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config loading: the main scheduler file and the per-agent `mods-enabled`
//! directory. Bad entries are logged and skipped rather than failing the
//! whole load (see the error design's "config errors" category).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use sched_core::{Host, HostRegistry, MetaAgent, MetaAgentRegistry};

use crate::error::ConfigError;

#[derive(Debug, Deserialize)]
struct RawMainConfig {
    fossology: RawFossology,
    #[serde(default)]
    hosts: HashMap<String, RawHost>,
}

#[derive(Debug, Deserialize)]
struct RawFossology {
    port: u16,
}

#[derive(Debug, Deserialize)]
struct RawHost {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    agent_dir: Option<PathBuf>,
    max_agents: u32,
}

/// Parses the main `scheduler.toml`. `default_agent_dir` backs the
/// `localhost` directory override described in the config schema: a
/// host entry literally named `localhost` takes its directory from the
/// scheduler's own configured agent directory rather than its own
/// `agent_dir` key, which may be omitted.
pub fn load_main_config(path: &Path, default_agent_dir: &Path) -> Result<(u16, HostRegistry), ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    let raw: RawMainConfig =
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;

    let mut hosts = HostRegistry::new();
    for (id, raw_host) in raw.hosts {
        let agent_dir = if id == "localhost" {
            default_agent_dir.to_path_buf()
        } else {
            match raw_host.agent_dir {
                Some(dir) => dir,
                None => {
                    tracing::warn!(host = %id, "skipping host with no agent_dir");
                    continue;
                }
            }
        };
        let address = raw_host.address.unwrap_or_else(|| id.clone());
        if !hosts.add(Host::new(id.clone(), address, agent_dir, raw_host.max_agents)) {
            tracing::warn!(host = %id, "duplicate host id in config, ignoring");
        }
    }

    Ok((raw.fossology.port, hosts))
}

#[derive(Debug, Deserialize)]
struct RawAgentConfig {
    default: RawAgentDefault,
}

#[derive(Debug, Deserialize)]
struct RawAgentDefault {
    name: String,
    command: String,
    max: u32,
    #[serde(default)]
    special: Vec<String>,
}

fn parse_agent_config(path: &Path) -> Result<MetaAgent, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    let raw: RawAgentConfig =
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;

    if raw.default.name.is_empty() || raw.default.command.is_empty() {
        return Err(ConfigError::EmptyField { path: path.to_path_buf() });
    }

    let exclusive = raw.default.special.iter().any(|flag| flag == "EXCLUSIVE");
    Ok(MetaAgent::new(raw.default.name, raw.default.command, raw.default.max, exclusive))
}

/// Scans `mods_dir` for `<name>/<name>.conf` entries (mirroring the
/// `mods-enabled` directory-scan layout), parsing each into a
/// [`MetaAgent`]. Entries that fail to parse are logged and skipped;
/// the registry reflects whatever did load.
pub fn load_agent_configs(mods_dir: &Path) -> Result<MetaAgentRegistry, ConfigError> {
    let mut registry = MetaAgentRegistry::new();

    let entries = match fs::read_dir(mods_dir) {
        Ok(entries) => entries,
        Err(source) => return Err(ConfigError::Read { path: mods_dir.to_path_buf(), source }),
    };

    for entry in entries.flatten() {
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let conf_path = dir.join(format!("{name}.conf"));
        if !conf_path.exists() {
            continue;
        }
        match parse_agent_config(&conf_path) {
            Ok(meta) => {
                if !registry.add(meta) {
                    tracing::warn!(path = %conf_path.display(), "duplicate or invalid meta-agent entry, ignoring");
                }
            }
            Err(err) => {
                tracing::error!(path = %conf_path.display(), error = %err, "skipping invalid agent config");
            }
        }
    }

    Ok(registry)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

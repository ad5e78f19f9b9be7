// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed event set the event loop dispatches on.

/// A signal, a control-interface request, or a tick, lowered to a tagged
/// variant so handlers dispatch on the tag instead of inspecting an
/// opaque payload.
#[derive(Debug, Clone)]
pub enum Event {
    /// One or more child processes have exited; `(pid, exit_status)` pairs
    /// batched from a single non-blocking reap loop.
    AgentDeath(Vec<(u32, i32)>),
    /// Periodic prompt to poll live agents for progress.
    AgentUpdate,
    /// Periodic prompt to reconcile in-memory state against the job
    /// store (fired alongside `AgentUpdate` on the same interval).
    DatabaseUpdate,
    /// Operator requested shutdown (SIGTERM/SIGQUIT/SIGINT, or the
    /// control interface's `SHUTDOWN` command).
    SchedulerClose,
    /// Operator requested a config reload (SIGHUP, or `RELOAD`).
    ConfigReload,
    /// Drives the policy tick; fired once at startup and after every
    /// other event.
    Tick,
}

crate::simple_display! {
    Event {
        AgentDeath(..) => "agent_death",
        AgentUpdate => "agent_update",
        DatabaseUpdate => "database_update",
        SchedulerClose => "scheduler_close",
        ConfigReload => "config_reload",
        Tick => "tick",
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;

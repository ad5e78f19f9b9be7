// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Translates OS signals (and the periodic poll the original scheduler
//! drove with `alarm(2)`) into [`Event`]s on the loop's queue.
//!
//! No work happens here beyond reaping and enqueuing: the actual state
//! mutation happens on the event loop task, which is what keeps the
//! handlers safe to write without signal-safety constraints.

use std::time::Duration;

use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc::UnboundedSender;

use sched_core::Event;

/// Runs until the sender's receiver is dropped (i.e. the event loop has
/// shut down). Intended to be spawned as its own task.
pub async fn run(tx: UnboundedSender<Event>, check_interval: Duration) -> std::io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigchld = signal(SignalKind::child())?;
    let mut ticker = tokio::time::interval(check_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM");
                if tx.send(Event::SchedulerClose).is_err() { return Ok(()); }
            }
            _ = sigquit.recv() => {
                tracing::info!("received SIGQUIT");
                if tx.send(Event::SchedulerClose).is_err() { return Ok(()); }
            }
            _ = sigint.recv() => {
                tracing::info!("received SIGINT");
                if tx.send(Event::SchedulerClose).is_err() { return Ok(()); }
            }
            _ = sighup.recv() => {
                tracing::info!("received SIGHUP");
                if tx.send(Event::ConfigReload).is_err() { return Ok(()); }
            }
            _ = sigchld.recv() => {
                let deaths = reap_all();
                if !deaths.is_empty() {
                    tracing::debug!(count = deaths.len(), "reaped agent processes");
                    if tx.send(Event::AgentDeath(deaths)).is_err() { return Ok(()); }
                }
            }
            _ = ticker.tick() => {
                if tx.send(Event::AgentUpdate).is_err() { return Ok(()); }
                if tx.send(Event::DatabaseUpdate).is_err() { return Ok(()); }
            }
        }
    }
}

/// Non-blocking batch reap: drains every currently-exited child without
/// waiting, so a burst of SIGCHLD collapses into one `AgentDeath` event.
fn reap_all() -> Vec<(u32, i32)> {
    let mut deaths = Vec::new();
    loop {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::Exited(pid, status)) => deaths.push((pid.as_raw() as u32, status)),
            Ok(WaitStatus::Signaled(pid, sig, _)) => deaths.push((pid.as_raw() as u32, -(sig as i32))),
            Ok(WaitStatus::StillAlive) => break,
            Ok(_) => continue,
            Err(_) => break,
        }
    }
    deaths
}

#[cfg(test)]
#[path = "signal_bridge_tests.rs"]
mod tests;

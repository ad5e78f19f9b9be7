// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The TCP control interface: a minimal newline-delimited line protocol
//! (`STATUS`, `RELOAD`, `SHUTDOWN`) sufficient to exercise the event
//! loop's admission points from outside the process. Authentication of
//! operator commands is out of scope; every command is logged with the
//! peer address for audit purposes.

use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedSender;

use sched_core::Event;

use crate::error::LifecycleError;

/// Snapshot of loop state the `STATUS` command reports. Updated by the
/// event loop after every tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub jobs_active: usize,
    pub agents_live: usize,
    pub lockout: bool,
    pub closing: bool,
}

pub struct ListenCtx {
    pub tx: UnboundedSender<Event>,
    pub status: Arc<Mutex<StatusSnapshot>>,
}

pub struct Listener {
    tcp: TcpListener,
}

impl Listener {
    pub async fn bind(port: u16) -> Result<Self, LifecycleError> {
        let addr = format!("0.0.0.0:{port}");
        let tcp = TcpListener::bind(&addr)
            .await
            .map_err(|e| LifecycleError::BindFailed(addr, e))?;
        Ok(Self { tcp })
    }

    pub async fn run(self, ctx: Arc<ListenCtx>) {
        loop {
            match self.tcp.accept().await {
                Ok((stream, peer)) => {
                    let ctx = Arc::clone(&ctx);
                    tokio::spawn(async move {
                        handle_connection(stream, peer, ctx).await;
                    });
                }
                Err(err) => {
                    tracing::warn!(error = %err, "control listener accept failed");
                }
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, ctx: Arc<ListenCtx>) {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(%peer, error = %err, "control connection read failed");
                return;
            }
        };

        tracing::info!(%peer, command = %line, "control command received");
        let reply = match line.trim() {
            "STATUS" => serde_json::to_string(&*ctx.status.lock()).unwrap_or_else(|_| "{}".to_string()) + "\n",
            "RELOAD" => {
                let _ = ctx.tx.send(Event::ConfigReload);
                "OK\n".to_string()
            }
            "SHUTDOWN" => {
                let _ = ctx.tx.send(Event::SchedulerClose);
                "OK\n".to_string()
            }
            _ => "ERR unknown command\n".to_string(),
        };
        let close_after = !matches!(line.trim(), "STATUS" | "RELOAD" | "SHUTDOWN");

        if writer.write_all(reply.as_bytes()).await.is_err() {
            return;
        }
        if close_after {
            return;
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;

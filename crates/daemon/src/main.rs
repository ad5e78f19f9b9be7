// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `schedulerd`: the scheduling daemon's entry point. Parses CLI flags,
//! wires up logging, runs startup, and hands control to the event loop.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tokio::sync::mpsc;

use sched_daemon::lifecycle::{self, Config, StartupOutcome};
use sched_daemon::{daemonize, event_loop, listener, lock, signal_bridge};

/// FOSSology-style job scheduler daemon.
#[derive(Debug, Parser)]
#[command(name = "schedulerd")]
struct Cli {
    /// Detach and run in the background.
    #[arg(short = 'd', long = "daemon-mode")]
    daemon_mode: bool,

    /// Open the database, verify it, and exit.
    #[arg(short = 'i', long = "db-init")]
    db_init: bool,

    /// Send graceful termination to the locked instance and exit.
    #[arg(short = 'k', long = "kill")]
    kill: bool,

    /// Redirect log output to this file instead of stderr.
    #[arg(short = 'L', long = "log")]
    log: Option<PathBuf>,

    /// Override the control-interface port from config.
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,

    /// Reset the persistent job queue at startup.
    #[arg(short = 'R', long = "reset")]
    reset: bool,

    /// Run initializations then immediately begin shutdown.
    #[arg(short = 't', long = "test")]
    test: bool,

    /// Diagnostic verbosity level; repeatable (-vv, -vvv).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory holding the lock file, main config, and mods-enabled tree.
    /// Defaults to the platform's state directory (`$XDG_STATE_HOME/schedulerd`
    /// or equivalent) when not given.
    #[arg(long = "state-dir")]
    state_dir: Option<PathBuf>,

    /// Directory agent commands are spawned from on the local host.
    #[arg(long = "agent-dir", default_value = "/srv/scheduler/agents")]
    agent_dir: PathBuf,

    /// Unprivileged user to drop to after binding the lock.
    #[arg(long = "run-as-user")]
    run_as_user: Option<String>,

    /// Unprivileged group to drop to after binding the lock.
    #[arg(long = "run-as-group")]
    run_as_group: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli);

    let state_dir = cli.state_dir.clone().unwrap_or_else(default_state_dir);

    let config = Config {
        main_config_path: state_dir.join("scheduler.toml"),
        mods_dir: state_dir.join("mods-enabled"),
        lock_path: Config::lock_path_for(&state_dir),
        state_dir,
        agent_dir: cli.agent_dir.clone(),
        port_override: cli.port,
        reset: cli.reset,
        run_as: cli.run_as_user.clone().zip(cli.run_as_group.clone()),
        check_interval: std::time::Duration::from_secs(5),
    };

    if cli.kill {
        return match lock::kill_running(&config.lock_path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                tracing::error!(error = %err, "kill failed");
                ExitCode::FAILURE
            }
        };
    }

    if cli.daemon_mode {
        if let Err(err) = daemonize::daemonize() {
            tracing::error!(error = %err, "failed to detach into the background");
            return ExitCode::FAILURE;
        }
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            tracing::error!(error = %err, "failed to start the async runtime");
            return ExitCode::FAILURE;
        }
    };

    rt.block_on(async_main(config, cli.db_init, cli.test))
}

async fn async_main(config: Config, db_init: bool, test_mode: bool) -> ExitCode {
    let (state, control_listener) = match lifecycle::startup(&config).await {
        Ok(StartupOutcome::AlreadyRunning(pid)) => {
            tracing::error!(pid, "another instance is already running");
            return ExitCode::FAILURE;
        }
        Ok(StartupOutcome::Started(state, listener)) => (state, listener),
        Err(err) => {
            tracing::error!(error = %err, "fatal startup failure");
            return ExitCode::FAILURE;
        }
    };

    if db_init {
        tracing::info!("database initialized");
        state.shutdown(&config);
        return ExitCode::SUCCESS;
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let listen_ctx = std::sync::Arc::new(listener::ListenCtx {
        tx: tx.clone(),
        status: state.status.clone(),
    });

    let listener_handle = tokio::spawn(control_listener.run(listen_ctx));
    let signal_handle = tokio::spawn(signal_bridge::run(tx.clone(), config.check_interval));

    if test_mode {
        let _ = tx.send(sched_core::Event::SchedulerClose);
    }

    event_loop::run(state, rx, &config).await;

    listener_handle.abort();
    signal_handle.abort();

    ExitCode::SUCCESS
}

/// `$XDG_STATE_HOME/schedulerd`, or the nearest platform equivalent;
/// falls back to the teacher's own FHS-style path when neither is set
/// (e.g. a minimal container with no `HOME`).
fn default_state_dir() -> PathBuf {
    dirs::state_dir().map(|dir| dir.join("schedulerd")).unwrap_or_else(|| PathBuf::from("/srv/scheduler"))
}

/// Sets up the global tracing subscriber. Returns the non-blocking
/// writer's flush guard when logging to a file; the caller must hold
/// onto it for the life of the process or buffered lines are lost.
fn init_logging(cli: &Cli) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::filter::LevelFilter;

    let level = match cli.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let Some(path) = &cli.log else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return None;
    };

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let Some(file_name) = path.file_name() else {
        eprintln!("log path {} has no file name", path.display());
        return None;
    };
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).init();
    Some(guard)
}

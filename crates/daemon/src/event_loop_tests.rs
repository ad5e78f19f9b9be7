use super::*;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use sched_core::{Host, HostId, HostRegistry, InMemoryJobQueue, InMemoryJobStore, Job, MetaAgent, MetaAgentRegistry};
use tempfile::tempdir;
use tokio::sync::mpsc;

fn test_config() -> Config {
    Config {
        state_dir: PathBuf::from("/nonexistent"),
        main_config_path: PathBuf::from("/nonexistent/scheduler.toml"),
        mods_dir: PathBuf::from("/nonexistent/mods-enabled"),
        agent_dir: PathBuf::from("/tmp"),
        lock_path: PathBuf::from("/nonexistent/scheduler.lock"),
        port_override: Some(0),
        reset: false,
        run_as: None,
        check_interval: Duration::from_secs(5),
    }
}

fn test_state() -> DaemonState {
    let mut hosts = HostRegistry::new();
    hosts.add(Host::new("localhost", "localhost", PathBuf::from("/tmp"), 4));
    let mut meta_agents = MetaAgentRegistry::new();
    meta_agents.add(MetaAgent::new("copyright", "true", 4, false));

    DaemonState::for_test(hosts, meta_agents, InMemoryJobQueue::new(), Box::new(InMemoryJobStore::new()))
}

#[tokio::test]
async fn startup_tick_launches_a_pending_job() {
    let mut state = test_state();
    state.queue.enqueue(Job::builder().type_name("copyright").build());

    assert!(!apply_tick(&mut state));
    assert_eq!(state.status.lock().agents_live, 1);
    assert_eq!(state.queue.active_count(), 1);
}

#[tokio::test]
async fn scheduler_close_with_nothing_running_terminates_on_next_tick() {
    let mut state = test_state();
    apply_event(&mut state, Event::SchedulerClose, &test_config());

    assert!(apply_tick(&mut state));
    assert!(state.status.lock().closing);
}

#[tokio::test]
async fn full_loop_processes_one_job_to_completion() {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut state = test_state();
    state.queue.enqueue(Job::builder().type_name("copyright").build());

    // Drive one tick by hand to learn the pid `true` was launched under.
    apply_tick(&mut state);
    let agent_id = state.supervisor.kill_all();
    assert_eq!(agent_id.len(), 1);
    let pid = agent_id[0];

    // Wait for the short-lived child to actually exit before reaping it,
    // mirroring what a real SIGCHLD-driven reap would observe.
    std::thread::sleep(Duration::from_millis(50));
    tx.send(Event::AgentDeath(vec![(pid, 0)])).unwrap();
    tx.send(Event::SchedulerClose).unwrap();
    drop(tx);

    run(state, rx, &test_config()).await;
}

fn write_config(dir: &std::path::Path, hosts_toml: &str) {
    fs::write(dir.join("scheduler.toml"), format!("[fossology]\nport = 0\n\n{hosts_toml}")).unwrap();
    let mods = dir.join("mods-enabled").join("copyright");
    fs::create_dir_all(&mods).unwrap();
    fs::write(mods.join("copyright.conf"), "[default]\nname = \"copyright\"\ncommand = \"true\"\nmax = 4\n").unwrap();
}

#[tokio::test]
async fn config_reload_picks_up_a_newly_added_host() {
    let dir = tempdir().unwrap();
    write_config(dir.path(), "[hosts.localhost]\nmax_agents = 4\n");
    let mut config = test_config();
    config.main_config_path = dir.path().join("scheduler.toml");
    config.mods_dir = dir.path().join("mods-enabled");

    let mut state = test_state();
    state.hosts = HostRegistry::new();
    state.hosts.add(Host::new("localhost", "localhost", PathBuf::from("/tmp"), 4));

    write_config(dir.path(), "[hosts.localhost]\nmax_agents = 4\n\n[hosts.worker-1]\nmax_agents = 2\n");
    reload_config(&mut state, &config);

    assert_eq!(state.hosts.len(), 2);
    assert!(state.hosts.get(&HostId::from("worker-1")).is_some());
}

#[tokio::test]
async fn config_reload_retains_a_removed_host_until_its_agent_drains() {
    let dir = tempdir().unwrap();
    write_config(dir.path(), "[hosts.localhost]\nmax_agents = 4\n\n[hosts.worker-1]\nmax_agents = 2\n");
    let mut config = test_config();
    config.main_config_path = dir.path().join("scheduler.toml");
    config.mods_dir = dir.path().join("mods-enabled");

    let mut state = test_state();
    state.hosts = HostRegistry::new();
    state.hosts.add(Host::new("localhost", "localhost", PathBuf::from("/tmp"), 4));
    state.hosts.add(Host::new("worker-1", "worker-1", PathBuf::from("/tmp"), 2));
    state.hosts.get_mut(&HostId::from("worker-1")).unwrap().running_agents = 1;

    // worker-1 is removed from config while it still has a live agent.
    write_config(dir.path(), "[hosts.localhost]\nmax_agents = 4\n");
    reload_config(&mut state, &config);

    let worker = state.hosts.get(&HostId::from("worker-1")).expect("retained until drain");
    assert_eq!(worker.running_agents, 1);
    assert_eq!(worker.free_capacity(), 0);
}

#[tokio::test]
async fn config_reload_with_an_unreadable_config_keeps_the_current_registry() {
    let mut state = test_state();
    let before = state.hosts.len();

    reload_config(&mut state, &test_config());

    assert_eq!(state.hosts.len(), before);
}

use super::*;
use std::fs;
use tempfile::tempdir;

fn write_fixture(dir: &std::path::Path) -> Config {
    let main_config = dir.join("scheduler.toml");
    fs::write(
        &main_config,
        r#"
[fossology]
port = 0

[hosts.localhost]
max_agents = 2
"#,
    )
    .unwrap();

    let mods_dir = dir.join("mods-enabled");
    fs::create_dir_all(mods_dir.join("copyright")).unwrap();
    fs::write(
        mods_dir.join("copyright/copyright.conf"),
        r#"
[default]
name = "copyright"
command = "agent_copyright"
max = 2
"#,
    )
    .unwrap();

    Config {
        state_dir: dir.to_path_buf(),
        main_config_path: main_config,
        mods_dir,
        agent_dir: dir.join("agents"),
        lock_path: Config::lock_path_for(dir),
        port_override: Some(0),
        reset: false,
        run_as: None,
        check_interval: std::time::Duration::from_secs(5),
    }
}

#[tokio::test]
async fn startup_succeeds_with_a_complete_config() {
    let dir = tempdir().unwrap();
    let config = write_fixture(dir.path());

    match startup(&config).await.unwrap() {
        StartupOutcome::Started(state, _listener) => {
            assert_eq!(state.hosts.len(), 1);
            assert_eq!(state.meta_agents.len(), 1);
            state.shutdown(&config);
        }
        StartupOutcome::AlreadyRunning(_) => panic!("first startup must succeed"),
    }

    assert!(!config.lock_path.exists(), "shutdown must remove the lock file");
}

#[tokio::test]
async fn startup_fails_fatally_with_no_hosts() {
    let dir = tempdir().unwrap();
    let mut config = write_fixture(dir.path());
    fs::write(
        &config.main_config_path,
        r#"
[fossology]
port = 0
"#,
    )
    .unwrap();
    config.port_override = Some(0);

    let err = startup(&config).await.unwrap_err();
    assert!(matches!(err, LifecycleError::NoHosts));
    assert!(!config.lock_path.exists(), "a failed startup cleans up its own lock");
}

#[tokio::test]
async fn a_second_startup_observes_the_first_as_already_running() {
    let dir = tempdir().unwrap();
    let config = write_fixture(dir.path());

    let first = startup(&config).await.unwrap();
    let StartupOutcome::Started(state, _listener) = first else { panic!("expected Started") };

    let second = startup(&config).await.unwrap();
    assert!(matches!(second, StartupOutcome::AlreadyRunning(_)));

    state.shutdown(&config);
}

use super::*;
use std::process::Command;
use std::thread;

#[test]
fn reap_all_collects_a_batch_of_exited_children() {
    let mut children: Vec<_> = (0..3)
        .map(|_| Command::new("true").spawn().expect("spawn true(1)"))
        .collect();
    // Give every child a moment to run to completion before reaping.
    thread::sleep(Duration::from_millis(100));

    let deaths = reap_all();
    let pids: Vec<u32> = children.iter().map(|c| c.id()).collect();
    assert!(pids.iter().all(|pid| deaths.iter().any(|(p, status)| p == pid && *status == 0)));

    for child in &mut children {
        let _ = child.try_wait();
    }
}

#[test]
fn reap_all_returns_empty_when_nothing_has_exited() {
    assert!(reap_all().is_empty());
}

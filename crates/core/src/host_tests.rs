use super::*;

fn host(id: &str, max: u32) -> Host {
    Host::new(id, "localhost", PathBuf::from("/tmp"), max)
}

#[test]
fn rejects_duplicate_host_ids() {
    let mut reg = HostRegistry::new();
    assert!(reg.add(host("a", 2)));
    assert!(!reg.add(host("a", 4)));
    assert_eq!(reg.len(), 1);
}

#[test]
fn get_host_is_first_fit_in_registration_order() {
    let mut reg = HostRegistry::new();
    reg.add(host("a", 1));
    reg.add(host("b", 4));
    reg.get_mut(&HostId::from("a")).unwrap().running_agents = 1;

    let picked = reg.get_host(1).expect("b has free capacity");
    assert_eq!(picked, HostId::from("b"));
}

#[test]
fn get_host_returns_none_when_nobody_has_room() {
    let mut reg = HostRegistry::new();
    let mut h = host("a", 1);
    h.running_agents = 1;
    reg.add(h);

    assert!(reg.get_host(1).is_none());
}

#[test]
fn free_capacity_never_underflows() {
    let mut h = host("a", 1);
    h.running_agents = 5;
    assert_eq!(h.free_capacity(), 0);
}

#[test]
fn reconcile_carries_over_running_agents_for_a_surviving_host() {
    let mut reg = HostRegistry::new();
    reg.add(host("a", 2));
    reg.get_mut(&HostId::from("a")).unwrap().running_agents = 1;

    let mut loaded = HostRegistry::new();
    loaded.add(host("a", 4));
    reg.reconcile(loaded);

    let a = reg.get(&HostId::from("a")).unwrap();
    assert_eq!(a.max_agents, 4);
    assert_eq!(a.running_agents, 1);
}

#[test]
fn reconcile_retains_a_departed_host_until_it_drains() {
    let mut reg = HostRegistry::new();
    reg.add(host("a", 2));
    reg.get_mut(&HostId::from("a")).unwrap().running_agents = 1;

    reg.reconcile(HostRegistry::new());

    let a = reg.get(&HostId::from("a")).expect("still running, must be retained");
    assert_eq!(a.running_agents, 1);
    assert_eq!(a.max_agents, 1, "clamped so it accepts no new work");
    assert_eq!(a.free_capacity(), 0);
}

#[test]
fn reconcile_drops_a_departed_host_once_idle() {
    let mut reg = HostRegistry::new();
    reg.add(host("a", 2));

    reg.reconcile(HostRegistry::new());

    assert!(reg.get(&HostId::from("a")).is_none());
}

use super::*;

#[test]
fn new_agent_starts_in_spawning_state() {
    let agent = Agent::new(HostId::from("localhost"), "copyright", JobId::new(), 1_000);
    assert_eq!(agent.state, AgentState::Spawning);
    assert!(agent.pid.is_none());
}

#[test]
fn state_display_matches_expected_labels() {
    assert_eq!(AgentState::Working.to_string(), "working");
    assert_eq!(AgentState::Dead.to_string(), "dead");
}

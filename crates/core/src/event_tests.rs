use super::*;

#[test]
fn display_labels_are_stable_identifiers() {
    assert_eq!(Event::SchedulerClose.to_string(), "scheduler_close");
    assert_eq!(Event::AgentDeath(vec![(1, 0)]).to_string(), "agent_death");
    assert_eq!(Event::AgentUpdate.to_string(), "agent_update");
}

//! Property-based checks of the global invariants from the data model:
//! running-agent accounting never drifts from the live agent set,
//! regardless of how jobs are interleaved with completions.

use proptest::prelude::*;
use std::path::PathBuf;

use crate::clock::FakeClock;
use crate::host::{Host, HostId, HostRegistry};
use crate::job::{InMemoryJobQueue, Job, JobQueue};
use crate::meta_agent::{MetaAgent, MetaAgentRegistry};
use crate::policy::{PolicyCtx, SchedulerPolicy, TickEffect};
use crate::supervisor::AgentSupervisor;

#[derive(Debug, Clone)]
enum Op {
    Enqueue { priority: i32 },
    Tick,
    CompleteOldest { exit_status: i32 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0i32..5).prop_map(|priority| Op::Enqueue { priority }),
        Just(Op::Tick),
        prop_oneof![Just(0i32), Just(1i32)].prop_map(|exit_status| Op::CompleteOldest { exit_status }),
    ]
}

proptest! {
    #[test]
    fn running_agents_never_exceeds_host_capacity_or_drifts_from_live_count(
        ops in prop::collection::vec(op_strategy(), 0..40)
    ) {
        let mut policy = SchedulerPolicy::new();
        let mut queue = InMemoryJobQueue::new();
        let mut hosts = HostRegistry::new();
        hosts.add(Host::new("localhost", "localhost", PathBuf::from("/tmp"), 3));
        let mut meta_agents = MetaAgentRegistry::new();
        meta_agents.add(MetaAgent::new("copyright", "agent_copyright", 3, false));
        let mut supervisor = AgentSupervisor::new(FakeClock::new());
        let mut live_pids: Vec<u32> = Vec::new();
        let mut next_pid = 1u32;

        for op in ops {
            match op {
                Op::Enqueue { priority } => {
                    queue.enqueue(Job::builder().type_name("copyright").priority(priority).build());
                }
                Op::Tick => {
                    let effects = policy.tick(PolicyCtx {
                        queue: &mut queue,
                        hosts: &mut hosts,
                        meta_agents: &meta_agents,
                        supervisor: &mut supervisor,
                    });
                    for effect in effects {
                        if let TickEffect::Launch { agent_id, .. } = effect {
                            let pid = next_pid;
                            next_pid += 1;
                            supervisor.attach_pid(&agent_id, pid);
                            live_pids.push(pid);
                        }
                    }
                }
                Op::CompleteOldest { exit_status } => {
                    if let Some(pid) = live_pids.pop() {
                        if let Some(death) = supervisor.notify_death(pid, exit_status, &mut hosts) {
                            queue.take_active(&death.job_id);
                        }
                    }
                }
            }

            let host = hosts.get(&HostId::from("localhost")).unwrap();
            prop_assert!(host.running_agents <= host.max_agents);
            prop_assert_eq!(host.running_agents as usize, supervisor.live_count());
        }
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jobs and the job queue.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::agent::AgentId;

crate::define_id! {
    /// Identifies a unit of work pulled from persistent storage.
    pub struct JobId("job-");
}

/// Lifecycle state of a [`Job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Complete,
    Failed,
}

crate::simple_display! {
    JobState {
        Pending => "pending",
        Running => "running",
        Complete => "complete",
        Failed => "failed",
    }
}

/// A unit of work pulled from the job store.
///
/// `seq` is assigned by the queue on enqueue and breaks priority ties by
/// age (lower `seq` is older), standing in for the wall-clock enqueue
/// time so ordering stays deterministic in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub type_name: String,
    pub payload_reference: String,
    pub state: JobState,
    pub assigned_agent: Option<AgentId>,
    pub priority: i32,
    pub(crate) seq: u64,
}

impl Job {
    pub fn new(type_name: impl Into<String>, payload_reference: impl Into<String>, priority: i32) -> Self {
        Self {
            id: JobId::new(),
            type_name: type_name.into(),
            payload_reference: payload_reference.into(),
            state: JobState::Pending,
            assigned_agent: None,
            priority,
            seq: 0,
        }
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into { type_name: String = "copyright" }
        into { payload_reference: String = "upload-1" }
        set { priority: i32 = 0 }
        computed { id: JobId = JobId::new() }
        computed { state: JobState = JobState::Pending }
        computed { assigned_agent: Option<AgentId> = None }
        computed { seq: u64 = 0 }
    }
}

/// Persistence collaborator behind the job queue. A real implementation
/// is a database-backed repository; out of scope here beyond this
/// contract (see `InMemoryJobStore` for the reference implementation
/// used by tests).
pub trait JobStore: Send {
    fn load_pending(&self) -> Vec<Job>;
    fn persist(&mut self, job: &Job);
    fn reset(&mut self);
}

/// In-memory reference `JobStore`, used by tests and as a starting point
/// for a real repository-backed implementation.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: HashMap<JobId, Job>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&mut self, job: Job) {
        self.jobs.insert(job.id, job);
    }
}

impl JobStore for InMemoryJobStore {
    fn load_pending(&self) -> Vec<Job> {
        self.jobs
            .values()
            .filter(|j| j.state == JobState::Pending)
            .cloned()
            .collect()
    }

    fn persist(&mut self, job: &Job) {
        self.jobs.insert(job.id, job.clone());
    }

    fn reset(&mut self) {
        self.jobs.clear();
    }
}

/// Max-heap ordering: higher priority first, then older (`seq`) first.
#[derive(Debug, Clone, PartialEq, Eq)]
struct QueuedJob(Job);

impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedJob {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .priority
            .cmp(&other.0.priority)
            .then_with(|| other.0.seq.cmp(&self.0.seq))
    }
}

/// Delivers ready jobs in priority order, honoring per-type global
/// capacity. See [`MetaAgentRegistry::global_capacity`] for how that
/// capacity is computed.
///
/// [`MetaAgentRegistry::global_capacity`]: crate::meta_agent::MetaAgentRegistry::global_capacity
pub trait JobQueue: Send {
    fn enqueue(&mut self, job: Job);

    /// Returns the highest-priority pending job whose type has spare
    /// capacity under `global_capacity`, or `None` if no job qualifies.
    /// Must not mutate queue state when it returns `None`.
    fn next_job(&mut self, global_capacity: &dyn Fn(&str) -> u32) -> Option<Job>;

    /// Returns a claimed job to pending (used after a failed launch).
    fn release(&mut self, job: Job);

    /// Removes a job from the active set once it reaches a terminal
    /// state, handing it back so the caller can stamp COMPLETE/FAILED
    /// and persist it.
    fn take_active(&mut self, id: &JobId) -> Option<Job>;

    fn active_count(&self) -> usize;

    fn active_count_for_type(&self, type_name: &str) -> u32;
}

/// In-memory job queue: a priority heap of pending jobs plus a map of
/// claimed-or-running ("active") jobs.
#[derive(Debug, Default)]
pub struct InMemoryJobQueue {
    pending: BinaryHeap<QueuedJob>,
    active: HashMap<JobId, Job>,
    next_seq: u64,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

impl JobQueue for InMemoryJobQueue {
    fn enqueue(&mut self, mut job: Job) {
        job.seq = self.next_seq();
        self.pending.push(QueuedJob(job));
    }

    fn next_job(&mut self, global_capacity: &dyn Fn(&str) -> u32) -> Option<Job> {
        let mut skipped = Vec::new();
        let result = loop {
            let Some(QueuedJob(candidate)) = self.pending.pop() else {
                break None;
            };
            let cap = global_capacity(&candidate.type_name);
            let active = self.active_count_for_type(&candidate.type_name);
            if active < cap {
                break Some(candidate);
            }
            skipped.push(QueuedJob(candidate));
        };
        for job in skipped {
            self.pending.push(job);
        }
        if let Some(job) = &result {
            self.active.insert(job.id, job.clone());
        }
        result
    }

    fn release(&mut self, job: Job) {
        self.active.remove(&job.id);
        self.pending.push(QueuedJob(job));
    }

    fn take_active(&mut self, id: &JobId) -> Option<Job> {
        self.active.remove(id)
    }

    fn active_count(&self) -> usize {
        self.active.len()
    }

    fn active_count_for_type(&self, type_name: &str) -> u32 {
        self.active.values().filter(|j| j.type_name == type_name).count() as u32
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;

use crate::job::{JobId, JobKind, RegistryError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::Instant;

struct PendingJob<S> {
    kind: JobKind,
    sink: S,
    deadline: Option<Instant>,
}

/// A pending job removed from the registry, together with its completion sink.
pub struct EvictedJob<S> {
    pub job_id: JobId,
    pub kind: JobKind,
    pub sink: S,
}

/// In-flight calls awaiting a response, keyed by job id and tagged with the
/// kind whose body contract their response uses.
///
/// A record is owned by the registry from registration until exactly one of
/// these removes it: a matching response, cancellation, deadline expiry, or
/// [`drain`](Self::drain) on disconnect. All operations take the same lock;
/// sinks are handed back to the caller and never invoked while it is held.
pub struct PendingJobRegistry<S> {
    jobs: Mutex<HashMap<JobId, PendingJob<S>>>,
}

impl<S> PendingJobRegistry<S> {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Starts tracking `job_id` under `kind`.
    ///
    /// Registering an id that is already pending fails and leaves the existing
    /// record untouched.
    pub fn register(
        &self,
        kind: JobKind,
        job_id: JobId,
        sink: S,
        deadline: Option<Instant>,
    ) -> Result<(), RegistryError> {
        if !job_id.is_valid() {
            return Err(RegistryError::InvalidJobId);
        }

        let mut jobs = self.jobs.lock();
        match jobs.entry(job_id) {
            Entry::Occupied(existing) => {
                let existing = existing.get().kind;
                tracing::error!(
                    "Job {} registered as {} is already pending as {}",
                    job_id,
                    kind,
                    existing
                );
                Err(RegistryError::DuplicateJob { job_id, existing })
            }
            Entry::Vacant(slot) => {
                slot.insert(PendingJob {
                    kind,
                    sink,
                    deadline,
                });
                Ok(())
            }
        }
    }

    /// Removes and returns the sink for `job_id` if it is pending as `kind`.
    ///
    /// A record tagged with a different kind stays where it is.
    pub fn try_resolve(&self, kind: JobKind, job_id: JobId) -> Option<S> {
        let mut jobs = self.jobs.lock();
        match jobs.entry(job_id) {
            Entry::Occupied(record) if record.get().kind == kind => Some(record.remove().sink),
            _ => None,
        }
    }

    /// Probes `kinds` in order and removes `job_id` under the first one it is
    /// pending as.
    ///
    /// This is how a response whose message type is shared by several kinds
    /// finds the contract to decode with. Returns `None`, leaving the registry
    /// unchanged, if the id is unknown or pending under a kind not in `kinds`.
    pub fn try_resolve_any(&self, kinds: &[JobKind], job_id: JobId) -> Option<(JobKind, S)> {
        let mut jobs = self.jobs.lock();
        let Entry::Occupied(record) = jobs.entry(job_id) else {
            return None;
        };

        let kind = kinds.iter().copied().find(|k| *k == record.get().kind)?;
        Some((kind, record.remove().sink))
    }

    pub fn cancel(&self, job_id: JobId) -> Option<(JobKind, S)> {
        self.jobs
            .lock()
            .remove(&job_id)
            .map(|record| (record.kind, record.sink))
    }

    /// Removes every job whose deadline is at or before `now`.
    pub fn evict_expired(&self, now: Instant) -> Vec<EvictedJob<S>> {
        let mut jobs = self.jobs.lock();

        let expired: Vec<JobId> = jobs
            .iter()
            .filter(|(_, record)| record.deadline.is_some_and(|deadline| deadline <= now))
            .map(|(job_id, _)| *job_id)
            .collect();

        expired
            .into_iter()
            .filter_map(|job_id| {
                jobs.remove(&job_id).map(|record| EvictedJob {
                    job_id,
                    kind: record.kind,
                    sink: record.sink,
                })
            })
            .collect()
    }

    /// Removes every pending job.
    pub fn drain(&self) -> Vec<EvictedJob<S>> {
        self.jobs
            .lock()
            .drain()
            .map(|(job_id, record)| EvictedJob {
                job_id,
                kind: record.kind,
                sink: record.sink,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    pub fn contains(&self, job_id: JobId) -> bool {
        self.jobs.lock().contains_key(&job_id)
    }

    pub fn kind_of(&self, job_id: JobId) -> Option<JobKind> {
        self.jobs.lock().get(&job_id).map(|record| record.kind)
    }

    /// Number of jobs pending under `kind`.
    pub fn pending_for(&self, kind: JobKind) -> usize {
        self.jobs
            .lock()
            .values()
            .filter(|record| record.kind == kind)
            .count()
    }
}

impl<S> Default for PendingJobRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

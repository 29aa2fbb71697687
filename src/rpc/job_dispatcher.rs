use crate::envelope::{BodyContract, Envelope, InboundEnvelope, InboundPacket, MessageType};
use crate::job::{EvictedJob, JobId, JobKind, PendingJobRegistry};
use crate::rpc::{JobError, JobSink};
use std::collections::HashMap;
use std::error::Error;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;

pub type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Handler for unsolicited messages of one type.
pub type JobHandler = Box<dyn FnMut(&InboundEnvelope) -> HandlerResult + Send>;

/// What happened to one inbound packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A registered handler processed the message.
    Handled { msg_type: MessageType },
    /// The handler returned an error or panicked.
    HandlerFailed { msg_type: MessageType },
    /// A pending job was found and its sink completed.
    Resolved { job_id: JobId, kind: JobKind },
    /// A pending job was found but its sink panicked.
    SinkFailed { job_id: JobId, kind: JobKind },
    /// A response nobody is waiting for; discarded.
    Unmatched { msg_type: MessageType, job_id: JobId },
    /// The header could not be parsed; discarded.
    Dropped,
    /// No route for this message type.
    Ignored { msg_type: MessageType },
}

/// Counters over everything the dispatcher has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub dispatched: u64,
    pub handled: u64,
    pub resolved: u64,
    pub unmatched: u64,
    pub dropped: u64,
    pub ignored: u64,
    pub handler_failures: u64,
    pub timed_out: u64,
}

/// Routes inbound envelopes to handlers and pending jobs.
///
/// For each packet, in order:
///
/// 1. parse the header; unparseable packets are dropped;
/// 2. a handler registered for the message type takes it;
/// 3. a message type bound to a response kind resolves the pending job of
///    that kind targeted by the header;
/// 4. the generic service-method response resolves against the service kinds,
///    probed in registration order; no match discards it;
/// 5. anything else is ignored.
///
/// Handlers and sinks that fail are isolated: the failure is logged and
/// counted and dispatch continues with the next packet.
pub struct JobDispatcher {
    registry: Arc<PendingJobRegistry<JobSink>>,
    handlers: HashMap<MessageType, JobHandler>,
    response_bindings: HashMap<MessageType, JobKind>,
    service_kinds: Vec<JobKind>,
    stats: DispatchStats,
}

impl JobDispatcher {
    pub fn new(registry: Arc<PendingJobRegistry<JobSink>>) -> Self {
        Self {
            registry,
            handlers: HashMap::new(),
            response_bindings: HashMap::new(),
            service_kinds: Vec::new(),
            stats: DispatchStats::default(),
        }
    }

    pub fn registry(&self) -> &Arc<PendingJobRegistry<JobSink>> {
        &self.registry
    }

    /// Installs `handler` for `msg_type`, replacing any previous one.
    pub fn register_handler<F>(&mut self, msg_type: MessageType, handler: F)
    where
        F: FnMut(&InboundEnvelope) -> HandlerResult + Send + 'static,
    {
        if self.handlers.insert(msg_type, Box::new(handler)).is_some() {
            tracing::warn!("Replaced existing handler for {:?}", msg_type);
        }
    }

    /// Installs a handler receiving the message decoded as `B`. A body that
    /// fails to decode counts as a handler failure.
    pub fn register_typed_handler<B, F>(&mut self, msg_type: MessageType, mut handler: F)
    where
        B: BodyContract + 'static,
        F: FnMut(Envelope<B>) + Send + 'static,
    {
        self.register_handler(msg_type, move |inbound| {
            handler(inbound.decode::<B>()?);
            Ok(())
        });
    }

    pub fn remove_handler(&mut self, msg_type: MessageType) -> bool {
        self.handlers.remove(&msg_type).is_some()
    }

    /// Binds a uniquely typed response message to the kind of job awaiting it.
    ///
    /// Returns the kind previously bound to `msg_type`, if any.
    pub fn bind_response(&mut self, msg_type: MessageType, kind: JobKind) -> Option<JobKind> {
        if msg_type.is_generic_response() {
            tracing::warn!(
                "{:?} bound to {}; it will bypass service kind probing",
                msg_type,
                kind
            );
        }
        self.response_bindings.insert(msg_type, kind)
    }

    /// Adds a kind whose jobs are answered by the generic service-method
    /// response. Kinds are probed in the order they were added; adding a kind
    /// twice keeps its original position.
    pub fn register_service_kind(&mut self, kind: JobKind) {
        if !self.service_kinds.contains(&kind) {
            self.service_kinds.push(kind);
        }
    }

    pub fn service_kinds(&self) -> &[JobKind] {
        &self.service_kinds
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Dispatches one raw packet from the transport.
    pub fn dispatch(&mut self, packet: InboundPacket) -> DispatchOutcome {
        self.stats.dispatched += 1;

        match InboundEnvelope::parse(packet) {
            Ok(envelope) => self.route(envelope),
            Err(err) => {
                self.stats.dropped += 1;
                tracing::warn!("Dropping malformed envelope: {}", err);
                DispatchOutcome::Dropped
            }
        }
    }

    fn route(&mut self, envelope: InboundEnvelope) -> DispatchOutcome {
        let msg_type = envelope.msg_type();
        let job_id = envelope.target_job_id();

        tracing::trace!("Dispatching {:?} targeting job {}", msg_type, job_id);

        if let Some(handler) = self.handlers.get_mut(&msg_type) {
            let result = catch_unwind(AssertUnwindSafe(|| handler(&envelope)));
            return match result {
                Ok(Ok(())) => {
                    self.stats.handled += 1;
                    DispatchOutcome::Handled { msg_type }
                }
                Ok(Err(err)) => {
                    self.stats.handler_failures += 1;
                    tracing::error!("Handler for {:?} failed: {}", msg_type, err);
                    DispatchOutcome::HandlerFailed { msg_type }
                }
                Err(_) => {
                    self.stats.handler_failures += 1;
                    tracing::error!("Handler for {:?} panicked", msg_type);
                    DispatchOutcome::HandlerFailed { msg_type }
                }
            };
        }

        let resolved = if let Some(kind) = self.response_bindings.get(&msg_type).copied() {
            self.registry
                .try_resolve(kind, job_id)
                .map(|sink| (kind, sink))
        } else if msg_type.is_generic_response() {
            self.registry.try_resolve_any(&self.service_kinds, job_id)
        } else {
            self.stats.ignored += 1;
            tracing::trace!("No route for {:?}", msg_type);
            return DispatchOutcome::Ignored { msg_type };
        };

        let Some((kind, sink)) = resolved else {
            self.stats.unmatched += 1;
            tracing::debug!(
                "Discarding {:?} for job {}, nothing pending",
                msg_type,
                job_id
            );
            return DispatchOutcome::Unmatched { msg_type, job_id };
        };

        tracing::debug!("Resolved job {} as {}", job_id, kind);

        if self.complete(job_id, kind, sink, Ok(envelope)) {
            self.stats.resolved += 1;
            DispatchOutcome::Resolved { job_id, kind }
        } else {
            DispatchOutcome::SinkFailed { job_id, kind }
        }
    }

    /// Rejects every job whose deadline has passed with
    /// [`JobError::TimedOut`]. Returns how many were rejected.
    pub fn sweep_expired(&mut self, now: Instant) -> usize {
        let expired = self.registry.evict_expired(now);
        let count = expired.len();

        for EvictedJob { job_id, kind, sink } in expired {
            tracing::warn!("Job {} ({}) timed out", job_id, kind);
            self.stats.timed_out += 1;
            self.complete(job_id, kind, sink, Err(JobError::TimedOut));
        }

        count
    }

    /// Rejects every pending job with `error`. Returns how many were rejected.
    pub fn reject_all(&mut self, error: JobError) -> usize {
        let pending = self.registry.drain();
        let count = pending.len();

        if count > 0 {
            tracing::debug!("Rejecting {} pending job(s): {}", count, error);
        }

        for EvictedJob { job_id, kind, sink } in pending {
            self.complete(job_id, kind, sink, Err(error.clone()));
        }

        count
    }

    fn complete(
        &mut self,
        job_id: JobId,
        kind: JobKind,
        sink: JobSink,
        outcome: Result<InboundEnvelope, JobError>,
    ) -> bool {
        match catch_unwind(AssertUnwindSafe(move || sink(outcome))) {
            Ok(()) => true,
            Err(_) => {
                self.stats.handler_failures += 1;
                tracing::error!("Sink for job {} ({}) panicked", job_id, kind);
                false
            }
        }
    }
}

use jobmux::envelope::InboundPacket;
use jobmux::job::{JobIdAllocator, PendingJobRegistry};
use jobmux::rpc::{DispatchStats, JobDispatcher, JobError, JobSession};
use jobmux_service::constants::{
    DEFAULT_INBOUND_BUFFER_SIZE, DEFAULT_JOB_TIMEOUT, DEFAULT_SWEEP_INTERVAL,
};
use jobmux_service_caller::{JobCallerInterface, WithDispatcher};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Lower bound applied to [`JobClientConfig::sweep_interval`]; a zero period
/// is not a valid timer interval.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct JobClientConfig {
    /// `None` lets jobs wait for their response indefinitely.
    pub job_timeout: Option<Duration>,
    /// Clamped to at least [`MIN_SWEEP_INTERVAL`].
    pub sweep_interval: Duration,
    pub inbound_buffer_size: usize,
    pub box_id: u16,
    pub process_id: u8,
}

impl Default for JobClientConfig {
    fn default() -> Self {
        Self {
            job_timeout: Some(DEFAULT_JOB_TIMEOUT),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            inbound_buffer_size: DEFAULT_INBOUND_BUFFER_SIZE,
            box_id: 0,
            process_id: 0,
        }
    }
}

/// Client side of one connection.
///
/// Owns the dispatch loop: a single task draining inbound packets in arrival
/// order and periodically sweeping expired jobs. When the inbound sender is
/// dropped, or the client itself, the loop stops and every pending job is
/// rejected with [`JobError::Disconnected`].
pub struct JobClient {
    session: Arc<JobSession>,
    dispatcher: Arc<Mutex<JobDispatcher>>,
    emit_fn: Arc<dyn Fn(Vec<u8>) + Send + Sync>,
    is_connected: Arc<AtomicBool>,
    shutdown_tx: parking_lot::Mutex<Option<oneshot::Sender<()>>>,
    dispatch_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl JobClient {
    /// Starts the dispatch loop. Must be called within a Tokio runtime.
    ///
    /// Outbound envelopes are passed to `emit`; the returned sender is where
    /// the transport delivers inbound packets.
    pub fn new<F>(config: JobClientConfig, emit: F) -> (Self, mpsc::Sender<InboundPacket>)
    where
        F: Fn(Vec<u8>) + Send + Sync + 'static,
    {
        let registry = Arc::new(PendingJobRegistry::new());
        let allocator = JobIdAllocator::with_ids(config.box_id, config.process_id);
        let session = Arc::new(
            JobSession::with_allocator(allocator, registry.clone())
                .with_job_timeout(config.job_timeout),
        );
        let dispatcher = Arc::new(Mutex::new(JobDispatcher::new(registry)));

        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_buffer_size.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let is_connected = Arc::new(AtomicBool::new(true));

        let dispatch_loop = run_dispatch_loop(
            dispatcher.clone(),
            inbound_rx,
            shutdown_rx,
            config.sweep_interval.max(MIN_SWEEP_INTERVAL),
        );
        let dispatch_task = tokio::spawn(supervise_dispatch_loop(
            dispatcher.clone(),
            is_connected.clone(),
            dispatch_loop,
        ));

        let client = JobClient {
            session,
            dispatcher,
            emit_fn: Arc::new(emit),
            is_connected,
            shutdown_tx: parking_lot::Mutex::new(Some(shutdown_tx)),
            dispatch_task: parking_lot::Mutex::new(Some(dispatch_task)),
        };

        (client, inbound_tx)
    }

    pub fn session(&self) -> &Arc<JobSession> {
        &self.session
    }

    pub fn dispatcher(&self) -> &Arc<Mutex<JobDispatcher>> {
        &self.dispatcher
    }

    pub async fn stats(&self) -> DispatchStats {
        self.dispatcher.with_dispatcher(|d| d.stats()).await
    }

    /// Stops the dispatch loop and rejects all pending jobs. Returns once the
    /// loop has finished.
    pub async fn disconnect(&self) {
        if let Some(tx) = self.shutdown_tx.lock().take() {
            let _ = tx.send(());
        }

        let dispatch_task = self.dispatch_task.lock().take();
        if let Some(dispatch_task) = dispatch_task {
            if let Err(err) = dispatch_task.await {
                tracing::error!("Dispatch loop failed: {}", err);
            }
        }
    }
}

/// Runs the dispatch loop in its own task and disconnects the client once it
/// ends, including when it ends by panicking.
async fn supervise_dispatch_loop<L>(
    dispatcher: Arc<Mutex<JobDispatcher>>,
    is_connected: Arc<AtomicBool>,
    dispatch_loop: L,
) where
    L: Future<Output = ()> + Send + 'static,
{
    if let Err(err) = tokio::spawn(dispatch_loop).await {
        tracing::error!("Dispatch loop failed: {}", err);
    }

    is_connected.store(false, Ordering::SeqCst);

    let rejected = dispatcher.lock().await.reject_all(JobError::Disconnected);
    if rejected > 0 {
        tracing::warn!("Disconnected with {} job(s) pending", rejected);
    }
}

async fn run_dispatch_loop(
    dispatcher: Arc<Mutex<JobDispatcher>>,
    mut inbound_rx: mpsc::Receiver<InboundPacket>,
    mut shutdown_rx: oneshot::Receiver<()>,
    sweep_interval: Duration,
) {
    let mut sweep = tokio::time::interval(sweep_interval);
    sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            packet = inbound_rx.recv() => match packet {
                Some(packet) => {
                    dispatcher.lock().await.dispatch(packet);
                }
                None => {
                    tracing::debug!("Inbound stream ended");
                    break;
                }
            },
            _ = sweep.tick() => {
                dispatcher.lock().await.sweep_expired(Instant::now());
            }
            _ = &mut shutdown_rx => {
                tracing::debug!("Dispatch loop shut down");
                break;
            }
        }
    }
}

#[async_trait::async_trait]
impl JobCallerInterface for JobClient {
    type DispatcherLock = Mutex<JobDispatcher>;

    fn get_session(&self) -> Arc<JobSession> {
        self.session.clone()
    }

    fn get_dispatcher(&self) -> Arc<Self::DispatcherLock> {
        self.dispatcher.clone()
    }

    fn get_emit_fn(&self) -> Arc<dyn Fn(Vec<u8>) + Send + Sync> {
        self.emit_fn.clone()
    }

    fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::SeqCst)
    }
}

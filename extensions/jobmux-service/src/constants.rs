use std::time::Duration;

/// How long an issued job waits for its response before it is rejected as
/// timed out.
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(30);

/// How often the dispatch loop looks for expired jobs. Bounds how late a
/// timeout can be reported.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// The default buffer size for the channel carrying inbound packets from the
/// transport to the dispatch loop.
///
/// Counted in packets, not bytes. A full buffer applies backpressure to the
/// transport's read side.
pub const DEFAULT_INBOUND_BUFFER_SIZE: usize = 64;

use crate::envelope::{EnvelopeDecodeError, EnvelopeEncodeError};
use crate::job::RegistryError;
use thiserror::Error;

/// Why an issued job did not produce a response.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JobError {
    #[error("request could not be encoded: {0}")]
    Encode(#[from] EnvelopeEncodeError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("response could not be decoded: {0}")]
    Decode(#[from] EnvelopeDecodeError),

    #[error("job timed out waiting for a response")]
    TimedOut,

    #[error("job was cancelled")]
    Cancelled,

    #[error("connection closed before the job completed")]
    Disconnected,
}

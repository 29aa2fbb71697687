use crate::envelope::{EnvelopeFlavor, MessageType};
use thiserror::Error;

/// Malformed envelope or header. Inbound envelopes failing with this error are
/// dropped; the connection carries on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvelopeDecodeError {
    #[error("incomplete header: needed {needed} bytes, got {actual}")]
    IncompleteHeader { needed: usize, actual: usize },

    #[error("corrupt header: {reason}")]
    CorruptHeader { reason: String },

    #[error("expected a {expected:?} envelope, got {actual:?}")]
    FlavorMismatch {
        expected: EnvelopeFlavor,
        actual: EnvelopeFlavor,
    },

    #[error("incomplete body: needed {needed} bytes, got {actual}")]
    IncompleteBody { needed: usize, actual: usize },

    #[error("corrupt body: {reason}")]
    CorruptBody { reason: String },
}

impl EnvelopeDecodeError {
    pub(crate) fn corrupt_header(reason: impl Into<String>) -> Self {
        EnvelopeDecodeError::CorruptHeader {
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt_body(reason: impl Into<String>) -> Self {
        EnvelopeDecodeError::CorruptBody {
            reason: reason.into(),
        }
    }
}

impl From<prost::DecodeError> for EnvelopeDecodeError {
    fn from(err: prost::DecodeError) -> Self {
        EnvelopeDecodeError::corrupt_body(err.to_string())
    }
}

/// Rejected encode input. Fails the specific call only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvelopeEncodeError {
    #[error("{flavor:?} body cannot be sent as {msg_type:?}")]
    FlavorNotAllowed {
        msg_type: MessageType,
        flavor: EnvelopeFlavor,
    },

    #[error("{msg_type:?} cannot carry a target job name")]
    JobNameNotAllowed { msg_type: MessageType },

    #[error("target job name must not be empty")]
    EmptyJobName,

    #[error("message type {value:#x} collides with the protobuf flag")]
    MessageTypeOutOfRange { value: u32 },

    #[error("message type {value} is declared and must not be sent as Unknown")]
    NonCanonicalMessageType { value: u32 },

    #[error("{field} is {len} bytes, exceeding the maximum of {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("body encode failed: {reason}")]
    Body { reason: String },
}

impl From<prost::EncodeError> for EnvelopeEncodeError {
    fn from(err: prost::EncodeError) -> Self {
        EnvelopeEncodeError::Body {
            reason: err.to_string(),
        }
    }
}

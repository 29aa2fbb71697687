mod body_contract;
mod envelope_codec;
mod envelope_error;
mod envelope_header;
pub mod fixed_layout;
mod inbound_envelope;
mod message_type;

pub use body_contract::{BodyContract, EnvelopeFlavor, Proto};
pub use envelope_codec::{Envelope, EnvelopeCodec};
pub use envelope_error::{EnvelopeDecodeError, EnvelopeEncodeError};
pub use envelope_header::{EnvelopeHeader, ProtoHeader};
pub use inbound_envelope::{InboundEnvelope, InboundPacket};
pub use message_type::{MessageFamily, MessageType};

use crate::envelope::{
    BodyContract, Envelope, EnvelopeCodec, EnvelopeDecodeError, EnvelopeFlavor, EnvelopeHeader,
    MessageType,
};
use crate::job::JobId;
use bytes::Bytes;

/// A raw buffer as delivered by the transport.
///
/// The transport knows whether a buffer is schema-driven from the protobuf
/// flag it already inspected to frame the message, and passes that along.
#[derive(Debug, Clone)]
pub struct InboundPacket {
    pub is_proto: bool,
    pub data: Bytes,
}

impl InboundPacket {
    pub fn new(is_proto: bool, data: impl Into<Bytes>) -> Self {
        Self {
            is_proto,
            data: data.into(),
        }
    }

    pub fn proto(data: impl Into<Bytes>) -> Self {
        Self::new(true, data)
    }

    pub fn fixed(data: impl Into<Bytes>) -> Self {
        Self::new(false, data)
    }

    #[inline]
    pub fn flavor(&self) -> EnvelopeFlavor {
        if self.is_proto {
            EnvelopeFlavor::Proto
        } else {
            EnvelopeFlavor::Struct
        }
    }
}

/// Read-only envelope with only its header decoded.
///
/// Used for cheap type introspection before the body contract is known. It
/// has no encode path: an inbound envelope is never re-serialized.
#[derive(Debug, Clone)]
pub struct InboundEnvelope {
    header: EnvelopeHeader,
    flavor: EnvelopeFlavor,
    data: Bytes,
    body_offset: usize,
}

impl InboundEnvelope {
    pub fn parse(packet: InboundPacket) -> Result<Self, EnvelopeDecodeError> {
        let flavor = packet.flavor();
        let (header, body_offset) = EnvelopeHeader::decode(flavor, &packet.data)?;

        Ok(Self {
            header,
            flavor,
            data: packet.data,
            body_offset,
        })
    }

    pub fn header(&self) -> &EnvelopeHeader {
        &self.header
    }

    pub fn msg_type(&self) -> MessageType {
        self.header.msg_type
    }

    pub fn target_job_id(&self) -> JobId {
        self.header.target_job_id
    }

    pub fn flavor(&self) -> EnvelopeFlavor {
        self.flavor
    }

    /// Everything after the header: the encoded body followed by the payload.
    pub fn body_bytes(&self) -> &[u8] {
        &self.data[self.body_offset..]
    }

    /// Completes the decode using the body contract `B`.
    pub fn decode<B: BodyContract>(&self) -> Result<Envelope<B>, EnvelopeDecodeError> {
        if B::FLAVOR != self.flavor {
            return Err(EnvelopeDecodeError::FlavorMismatch {
                expected: B::FLAVOR,
                actual: self.flavor,
            });
        }

        EnvelopeCodec::decode_body(self.header.clone(), self.body_bytes())
    }
}

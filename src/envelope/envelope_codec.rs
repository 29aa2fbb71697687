use crate::envelope::{
    BodyContract, EnvelopeDecodeError, EnvelopeEncodeError, EnvelopeHeader,
};
use bytes::BytesMut;

/// Initial buffer headroom for header and body, on top of the payload length.
const ENCODE_HEADROOM: usize = 64;

/// A header, a typed body and the raw trailing payload: the unit of wire
/// transmission.
///
/// The payload is opaque; its length on the wire is whatever follows the body
/// and is never stored explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<B> {
    pub header: EnvelopeHeader,
    pub body: B,
    pub payload: Vec<u8>,
}

impl<B> Envelope<B> {
    pub fn new(header: EnvelopeHeader, body: B) -> Self {
        Self {
            header,
            body,
            payload: Vec::new(),
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }
}

/// Serializes envelopes to bytes and back.
///
/// The flavor is taken from the body contract `B`, never sniffed from the
/// bytes: a caller decoding a schema-driven envelope names a schema-driven
/// body type.
pub struct EnvelopeCodec;

impl EnvelopeCodec {
    /// Encodes an `Envelope` into a byte vector laid out as
    /// `[header][body][payload]`.
    pub fn encode<B: BodyContract>(envelope: &Envelope<B>) -> Result<Vec<u8>, EnvelopeEncodeError> {
        Self::encode_parts(&envelope.header, &envelope.body, &envelope.payload)
    }

    /// Same as [`EnvelopeCodec::encode`] without requiring ownership of the parts.
    pub fn encode_parts<B: BodyContract>(
        header: &EnvelopeHeader,
        body: &B,
        payload: &[u8],
    ) -> Result<Vec<u8>, EnvelopeEncodeError> {
        let mut buf = BytesMut::with_capacity(ENCODE_HEADROOM + payload.len());

        header.encode_into(B::FLAVOR, &mut buf)?;
        body.encode_body(&mut buf)?;
        buf.extend_from_slice(payload);

        Ok(buf.to_vec())
    }

    /// Decodes a byte slice into an `Envelope`.
    ///
    /// Fails if the buffer is shorter than the flavor's minimum header, if the
    /// header is malformed, or if the body does not satisfy `B`. Whatever
    /// follows the body becomes the payload, byte for byte.
    pub fn decode<B: BodyContract>(bytes: &[u8]) -> Result<Envelope<B>, EnvelopeDecodeError> {
        let (header, header_len) = EnvelopeHeader::decode(B::FLAVOR, bytes)?;
        Self::decode_body(header, &bytes[header_len..])
    }

    pub(crate) fn decode_body<B: BodyContract>(
        header: EnvelopeHeader,
        bytes: &[u8],
    ) -> Result<Envelope<B>, EnvelopeDecodeError> {
        let mut cursor = bytes;
        let body = B::decode_body(&mut cursor)?;

        Ok(Envelope {
            header,
            body,
            payload: cursor.to_vec(),
        })
    }
}

use crate::envelope::{EnvelopeDecodeError, EnvelopeEncodeError, MessageFamily, MessageType};
use bytes::BytesMut;
use std::ops::{Deref, DerefMut};

/// Body encoding of an envelope. Both flavors share the logical header but
/// lay it out differently on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeFlavor {
    /// Schema-driven protobuf body; tagged fields, forward/backward compatible.
    Proto,
    /// Positional fixed-layout body; no tags, strict field order.
    Struct,
}

impl EnvelopeFlavor {
    /// Whether a body of this flavor may travel under `msg_type`.
    pub fn is_allowed_for(self, msg_type: MessageType) -> bool {
        match msg_type.family() {
            MessageFamily::Legacy => self == EnvelopeFlavor::Struct,
            MessageFamily::Client => self == EnvelopeFlavor::Proto,
            MessageFamily::ServiceMethod | MessageFamily::Undeclared => true,
        }
    }
}

/// A versioned data contract for the typed body of an envelope.
///
/// `decode_body` must consume exactly the bytes `encode_body` produced and
/// leave the cursor at the first payload byte; anything after the body is the
/// raw trailing payload and is never looked at.
pub trait BodyContract: Sized {
    const FLAVOR: EnvelopeFlavor;

    fn encode_body(&self, buf: &mut BytesMut) -> Result<(), EnvelopeEncodeError>;

    fn decode_body(buf: &mut &[u8]) -> Result<Self, EnvelopeDecodeError>;
}

/// Wraps a protobuf message so it can be used as a schema-driven body.
///
/// Inside an envelope the message is length-delimited (varint prefix) so the
/// trailing payload can follow it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Proto<T>(pub T);

impl<T> Proto<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Proto<T> {
    fn from(message: T) -> Self {
        Proto(message)
    }
}

impl<T> Deref for Proto<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Proto<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T> BodyContract for Proto<T>
where
    T: prost::Message + Default,
{
    const FLAVOR: EnvelopeFlavor = EnvelopeFlavor::Proto;

    fn encode_body(&self, buf: &mut BytesMut) -> Result<(), EnvelopeEncodeError> {
        self.0.encode_length_delimited(buf)?;
        Ok(())
    }

    fn decode_body(buf: &mut &[u8]) -> Result<Self, EnvelopeDecodeError> {
        Ok(Proto(T::decode_length_delimited(&mut *buf)?))
    }
}

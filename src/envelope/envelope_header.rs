use crate::{
    constants::{
        PROTO_HEADER_PREFIX_SIZE, PROTO_MASK, STRUCT_HEADER_CANARY,
        STRUCT_HEADER_SIZE, STRUCT_HEADER_SIZE_BYTE, STRUCT_HEADER_VERSION,
    },
    envelope::{
        EnvelopeDecodeError, EnvelopeEncodeError, EnvelopeFlavor, MessageType, fixed_layout,
    },
    job::JobId,
};
use bytes::{BufMut, BytesMut};
use prost::Message;

/// Protobuf form of the header used by the schema-driven flavor.
///
/// Tags match the protocol's shared header message so that fields this crate
/// does not know about are simply skipped by the decoder.
#[derive(Clone, PartialEq, Message)]
pub struct ProtoHeader {
    #[prost(fixed64, optional, tag = "1")]
    pub steamid: Option<u64>,
    #[prost(int32, optional, tag = "2")]
    pub client_sessionid: Option<i32>,
    #[prost(fixed64, optional, tag = "10")]
    pub jobid_source: Option<u64>,
    #[prost(fixed64, optional, tag = "11")]
    pub jobid_target: Option<u64>,
    #[prost(string, optional, tag = "12")]
    pub target_job_name: Option<String>,
}

/// Represents the header of an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeHeader {
    /// The wire message type.
    pub msg_type: MessageType,

    /// Session identifier supplied by the session layer.
    pub session_id: i32,

    /// Identifier of the authenticated peer on whose behalf the message is sent.
    pub peer_id: u64,

    /// The job that issued this message; a reply targets it.
    pub source_job_id: JobId,

    /// The job this message answers. For a response this equals the request's
    /// `source_job_id`, which is what correlation relies on.
    pub target_job_id: JobId,

    /// Logical operation name (`Service.Method#Version`). Only the
    /// service-method family may carry one.
    pub target_job_name: Option<String>,
}

impl EnvelopeHeader {
    pub fn new(msg_type: MessageType) -> Self {
        Self {
            msg_type,
            session_id: 0,
            peer_id: 0,
            source_job_id: JobId::INVALID,
            target_job_id: JobId::INVALID,
            target_job_name: None,
        }
    }

    /// Builds the header of a reply to `request`: our target is where the
    /// request came from.
    pub fn reply_to(msg_type: MessageType, request: &EnvelopeHeader) -> Self {
        Self {
            session_id: request.session_id,
            peer_id: request.peer_id,
            target_job_id: request.source_job_id,
            ..Self::new(msg_type)
        }
    }

    pub(crate) fn validate(&self, flavor: EnvelopeFlavor) -> Result<(), EnvelopeEncodeError> {
        let value = self.msg_type.value();
        if value & PROTO_MASK != 0 {
            return Err(EnvelopeEncodeError::MessageTypeOutOfRange { value });
        }

        // Decoding maps a declared value back to its named variant.
        if MessageType::from(value) != self.msg_type {
            return Err(EnvelopeEncodeError::NonCanonicalMessageType { value });
        }

        if !flavor.is_allowed_for(self.msg_type) {
            return Err(EnvelopeEncodeError::FlavorNotAllowed {
                msg_type: self.msg_type,
                flavor,
            });
        }

        if let Some(name) = &self.target_job_name {
            if !self.msg_type.allows_job_name() {
                return Err(EnvelopeEncodeError::JobNameNotAllowed {
                    msg_type: self.msg_type,
                });
            }
            if name.is_empty() {
                return Err(EnvelopeEncodeError::EmptyJobName);
            }
        }

        Ok(())
    }

    /// Appends the wire form of this header for `flavor` to `buf`.
    pub fn encode_into(
        &self,
        flavor: EnvelopeFlavor,
        buf: &mut BytesMut,
    ) -> Result<(), EnvelopeEncodeError> {
        self.validate(flavor)?;

        match flavor {
            EnvelopeFlavor::Proto => {
                let proto = ProtoHeader {
                    steamid: Some(self.peer_id),
                    client_sessionid: Some(self.session_id),
                    jobid_source: self.source_job_id.is_valid().then(|| self.source_job_id.value()),
                    jobid_target: self.target_job_id.is_valid().then(|| self.target_job_id.value()),
                    target_job_name: self.target_job_name.clone(),
                };

                let header_len = proto.encoded_len();
                let wire_len =
                    u32::try_from(header_len).map_err(|_| EnvelopeEncodeError::FieldTooLong {
                        field: "header",
                        len: header_len,
                        max: u32::MAX as usize,
                    })?;

                buf.reserve(PROTO_HEADER_PREFIX_SIZE + header_len);
                buf.put_u32_le(self.msg_type.value() | PROTO_MASK);
                buf.put_u32_le(wire_len);
                proto.encode(buf)?;
            }
            EnvelopeFlavor::Struct => {
                buf.reserve(STRUCT_HEADER_SIZE);
                buf.put_u32_le(self.msg_type.value());
                buf.put_u8(STRUCT_HEADER_SIZE_BYTE);
                buf.put_u16_le(STRUCT_HEADER_VERSION);
                buf.put_u64_le(self.target_job_id.value());
                buf.put_u64_le(self.source_job_id.value());
                buf.put_u8(STRUCT_HEADER_CANARY);
                buf.put_u64_le(self.peer_id);
                buf.put_i32_le(self.session_id);

                if self.msg_type.allows_job_name() {
                    let name = self.target_job_name.as_deref().unwrap_or_default();
                    fixed_layout::write_string(buf, "target job name", name)?;
                }
            }
        }

        Ok(())
    }

    /// Decodes a header of the given flavor from the front of `buf`.
    ///
    /// Returns the header and the number of bytes it occupied.
    pub fn decode(
        flavor: EnvelopeFlavor,
        buf: &[u8],
    ) -> Result<(EnvelopeHeader, usize), EnvelopeDecodeError> {
        match flavor {
            EnvelopeFlavor::Proto => Self::decode_proto(buf),
            EnvelopeFlavor::Struct => Self::decode_struct(buf),
        }
    }

    fn decode_proto(buf: &[u8]) -> Result<(EnvelopeHeader, usize), EnvelopeDecodeError> {
        if buf.len() < PROTO_HEADER_PREFIX_SIZE {
            return Err(EnvelopeDecodeError::IncompleteHeader {
                needed: PROTO_HEADER_PREFIX_SIZE,
                actual: buf.len(),
            });
        }

        let mut cursor = buf;
        let raw_type = fixed_layout::read_u32(&mut cursor)?;
        if raw_type & PROTO_MASK == 0 {
            return Err(EnvelopeDecodeError::corrupt_header(
                "protobuf flag missing from message type",
            ));
        }
        let msg_type = MessageType::from(raw_type & !PROTO_MASK);

        let header_len = fixed_layout::read_u32(&mut cursor)? as usize;

        let total = PROTO_HEADER_PREFIX_SIZE
            .checked_add(header_len)
            .ok_or_else(|| EnvelopeDecodeError::corrupt_header("header length overflow"))?;
        if buf.len() < total {
            return Err(EnvelopeDecodeError::IncompleteHeader {
                needed: total,
                actual: buf.len(),
            });
        }

        let proto = ProtoHeader::decode(&buf[PROTO_HEADER_PREFIX_SIZE..total])
            .map_err(|e| EnvelopeDecodeError::corrupt_header(e.to_string()))?;

        let header = EnvelopeHeader {
            msg_type,
            session_id: proto.client_sessionid.unwrap_or_default(),
            peer_id: proto.steamid.unwrap_or_default(),
            source_job_id: proto.jobid_source.map(JobId::new).unwrap_or(JobId::INVALID),
            target_job_id: proto.jobid_target.map(JobId::new).unwrap_or(JobId::INVALID),
            target_job_name: proto.target_job_name,
        };

        Ok((header, total))
    }

    fn decode_struct(buf: &[u8]) -> Result<(EnvelopeHeader, usize), EnvelopeDecodeError> {
        if buf.len() < STRUCT_HEADER_SIZE {
            return Err(EnvelopeDecodeError::IncompleteHeader {
                needed: STRUCT_HEADER_SIZE,
                actual: buf.len(),
            });
        }

        let mut cursor = buf;
        let raw_type = fixed_layout::read_u32(&mut cursor)?;
        if raw_type & PROTO_MASK != 0 {
            return Err(EnvelopeDecodeError::corrupt_header(
                "protobuf flag set on a fixed-layout header",
            ));
        }
        let msg_type = MessageType::from(raw_type);

        let header_size = fixed_layout::read_u8(&mut cursor)?;
        if header_size != STRUCT_HEADER_SIZE_BYTE {
            return Err(EnvelopeDecodeError::corrupt_header(format!(
                "unexpected header size {header_size}"
            )));
        }

        let version = fixed_layout::read_u16(&mut cursor)?;
        if version != STRUCT_HEADER_VERSION {
            return Err(EnvelopeDecodeError::corrupt_header(format!(
                "unsupported header version {version}"
            )));
        }

        let target_job_id = JobId::new(fixed_layout::read_u64(&mut cursor)?);
        let source_job_id = JobId::new(fixed_layout::read_u64(&mut cursor)?);

        let canary = fixed_layout::read_u8(&mut cursor)?;
        if canary != STRUCT_HEADER_CANARY {
            return Err(EnvelopeDecodeError::corrupt_header(format!(
                "bad header canary {canary}"
            )));
        }

        let peer_id = fixed_layout::read_u64(&mut cursor)?;
        let session_id = fixed_layout::read_i32(&mut cursor)?;

        let target_job_name = if msg_type.allows_job_name() {
            let name = fixed_layout::read_string(&mut cursor).map_err(|e| {
                EnvelopeDecodeError::corrupt_header(format!("unreadable target job name: {e}"))
            })?;
            (!name.is_empty()).then_some(name)
        } else {
            None
        };

        let header = EnvelopeHeader {
            msg_type,
            session_id,
            peer_id,
            source_job_id,
            target_job_id,
            target_job_name,
        };

        Ok((header, buf.len() - cursor.len()))
    }
}

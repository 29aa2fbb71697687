// Envelope related constants

/// High bit of the wire message type marking a schema-driven (protobuf) envelope.
pub const PROTO_MASK: u32 = 0x8000_0000;

/// Size of the fixed prefix preceding the protobuf header:
/// message type (u32) + header length (u32).
pub const PROTO_HEADER_PREFIX_SIZE: usize = 8;

/// Total size of the fixed-layout header.
///
/// msg type (4) + header size (1) + header version (2) + target job (8) +
/// source job (8) + canary (1) + peer id (8) + session id (4) = 36
pub const STRUCT_HEADER_SIZE: usize = 36;

/// Value written into the fixed-layout header's size byte.
pub const STRUCT_HEADER_SIZE_BYTE: u8 = STRUCT_HEADER_SIZE as u8;

/// Version of the fixed-layout header this crate reads and writes.
pub const STRUCT_HEADER_VERSION: u16 = 2;

/// Canary byte guarding against misaligned fixed-layout headers.
pub const STRUCT_HEADER_CANARY: u8 = 239;

// Job identifier layout

/// Reserved "no job" value.
pub const INVALID_JOB_ID: u64 = u64::MAX;

pub const JOB_ID_SEQUENCE_BITS: u32 = 20;
pub const JOB_ID_START_TIME_BITS: u32 = 30;
pub const JOB_ID_PROCESS_BITS: u32 = 4;
pub const JOB_ID_BOX_BITS: u32 = 10;

/// Mask over the combined start-time and sequence fields, which are advanced
/// together as a single counter.
pub const JOB_ID_COUNTER_MASK: u64 = (1u64 << (JOB_ID_SEQUENCE_BITS + JOB_ID_START_TIME_BITS)) - 1;

/// Unix timestamp (seconds) of 2005-01-01T00:00:00Z, the start-time epoch.
pub const JOB_ID_EPOCH_UNIX_SECS: i64 = 1_104_537_600;

//! User file system calls with dedicated response message types.

use bytes::{BufMut, BytesMut};
use jobmux::envelope::{
    BodyContract, EnvelopeDecodeError, EnvelopeEncodeError, EnvelopeFlavor, MessageType, Proto,
    fixed_layout,
};
use jobmux::job::JobKind;
use jobmux_service::UniqueMethod;
use prost::Message;

#[derive(Clone, PartialEq, Message)]
pub struct SingleFileInfoRequest {
    #[prost(uint32, tag = "1")]
    pub app_id: u32,
    #[prost(string, tag = "2")]
    pub file_name: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct SingleFileInfoResponse {
    #[prost(int32, tag = "1")]
    pub eresult: i32,
    #[prost(uint32, tag = "2")]
    pub app_id: u32,
    #[prost(string, tag = "3")]
    pub file_name: String,
    #[prost(bytes = "vec", tag = "4")]
    pub sha_file: Vec<u8>,
    #[prost(uint64, tag = "5")]
    pub time_stamp: u64,
    #[prost(uint32, tag = "6")]
    pub raw_file_size: u32,
    #[prost(bool, tag = "7")]
    pub is_explicit_delete: bool,
}

pub struct GetSingleFileInfo;

impl UniqueMethod for GetSingleFileInfo {
    const REQUEST_TYPE: MessageType = MessageType::ClientUfsGetSingleFileInfo;
    const RESPONSE_TYPE: MessageType = MessageType::ClientUfsGetSingleFileInfoResponse;
    const KIND: JobKind = JobKind::new("Ufs.GetSingleFileInfo");

    type Request = Proto<SingleFileInfoRequest>;
    type Response = Proto<SingleFileInfoResponse>;
}

/// Fixed-layout login request: `u32 protocol version, u64 session token,
/// u32 app count, u32 app ids...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UfsLoginRequest {
    pub protocol_version: u32,
    pub session_token: u64,
    pub app_ids: Vec<u32>,
}

impl BodyContract for UfsLoginRequest {
    const FLAVOR: EnvelopeFlavor = EnvelopeFlavor::Struct;

    fn encode_body(&self, buf: &mut BytesMut) -> Result<(), EnvelopeEncodeError> {
        let count = u32::try_from(self.app_ids.len()).map_err(|_| {
            EnvelopeEncodeError::FieldTooLong {
                field: "app ids",
                len: self.app_ids.len(),
                max: u32::MAX as usize,
            }
        })?;

        buf.put_u32_le(self.protocol_version);
        buf.put_u64_le(self.session_token);
        buf.put_u32_le(count);
        for app_id in &self.app_ids {
            buf.put_u32_le(*app_id);
        }
        Ok(())
    }

    fn decode_body(buf: &mut &[u8]) -> Result<Self, EnvelopeDecodeError> {
        let protocol_version = fixed_layout::read_u32(buf)?;
        let session_token = fixed_layout::read_u64(buf)?;
        let count = fixed_layout::read_u32(buf)? as usize;

        // Each id takes four bytes; reject counts the buffer cannot hold
        // before allocating for them.
        if buf.len() / 4 < count {
            return Err(EnvelopeDecodeError::IncompleteBody {
                needed: count.saturating_mul(4),
                actual: buf.len(),
            });
        }

        let app_ids = (0..count)
            .map(|_| fixed_layout::read_u32(buf))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            protocol_version,
            session_token,
            app_ids,
        })
    }
}

/// Fixed-layout login response: `i32 result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UfsLoginResponse {
    pub result: i32,
}

impl BodyContract for UfsLoginResponse {
    const FLAVOR: EnvelopeFlavor = EnvelopeFlavor::Struct;

    fn encode_body(&self, buf: &mut BytesMut) -> Result<(), EnvelopeEncodeError> {
        buf.put_i32_le(self.result);
        Ok(())
    }

    fn decode_body(buf: &mut &[u8]) -> Result<Self, EnvelopeDecodeError> {
        Ok(Self {
            result: fixed_layout::read_i32(buf)?,
        })
    }
}

pub struct UfsLogin;

impl UniqueMethod for UfsLogin {
    const REQUEST_TYPE: MessageType = MessageType::ClientUfsLoginRequest;
    const RESPONSE_TYPE: MessageType = MessageType::ClientUfsLoginResponse;
    const KIND: JobKind = JobKind::new("Ufs.Login");

    type Request = UfsLoginRequest;
    type Response = UfsLoginResponse;
}

#[derive(Clone, PartialEq, Message)]
pub struct UgcDetailsRequest {
    #[prost(fixed64, tag = "1")]
    pub hcontent: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct UgcDetailsResponse {
    #[prost(int32, tag = "1")]
    pub eresult: i32,
    #[prost(string, tag = "2")]
    pub url: String,
    #[prost(uint32, tag = "3")]
    pub app_id: u32,
    #[prost(string, tag = "4")]
    pub filename: String,
    #[prost(fixed64, tag = "5")]
    pub steamid_creator: u64,
    #[prost(uint32, tag = "6")]
    pub file_size: u32,
}

/// Looks up a piece of user-generated content by its handle.
pub struct GetUgcDetails;

impl UniqueMethod for GetUgcDetails {
    const REQUEST_TYPE: MessageType = MessageType::ClientUfsGetUgcDetails;
    const RESPONSE_TYPE: MessageType = MessageType::ClientUfsGetUgcDetailsResponse;
    const KIND: JobKind = JobKind::new("Ufs.GetUgcDetails");

    type Request = Proto<UgcDetailsRequest>;
    type Response = Proto<UgcDetailsResponse>;
}

#[derive(Clone, PartialEq, Message)]
pub struct FileListForAppRequest {
    #[prost(uint32, repeated, tag = "1")]
    pub apps_to_query: Vec<u32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct UfsFileInfo {
    #[prost(uint32, tag = "1")]
    pub app_id: u32,
    #[prost(string, tag = "2")]
    pub file_name: String,
    #[prost(bytes = "vec", tag = "3")]
    pub sha_file: Vec<u8>,
    #[prost(uint64, tag = "4")]
    pub time_stamp: u64,
    #[prost(uint32, tag = "5")]
    pub raw_file_size: u32,
    #[prost(bool, tag = "6")]
    pub is_explicit_delete: bool,
    #[prost(uint32, tag = "7")]
    pub platforms_to_sync: u32,
    #[prost(uint32, tag = "8")]
    pub path_prefix_index: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct FileListForAppResponse {
    #[prost(message, repeated, tag = "1")]
    pub files: Vec<UfsFileInfo>,
    #[prost(string, repeated, tag = "2")]
    pub path_prefixes: Vec<String>,
}

pub struct GetFileListForApp;

impl UniqueMethod for GetFileListForApp {
    const REQUEST_TYPE: MessageType = MessageType::ClientUfsGetFileListForApp;
    const RESPONSE_TYPE: MessageType = MessageType::ClientUfsGetFileListForAppResponse;
    const KIND: JobKind = JobKind::new("Ufs.GetFileListForApp");

    type Request = Proto<FileListForAppRequest>;
    type Response = Proto<FileListForAppResponse>;
}

#[derive(Clone, PartialEq, Message)]
pub struct ShareFileRequest {
    #[prost(uint32, tag = "1")]
    pub app_id: u32,
    #[prost(string, tag = "2")]
    pub file_name: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ShareFileResponse {
    #[prost(int32, tag = "1")]
    pub eresult: i32,
    #[prost(fixed64, tag = "2")]
    pub hcontent: u64,
}

/// Publishes a cloud file; the response carries the new content handle.
pub struct ShareFile;

impl UniqueMethod for ShareFile {
    const REQUEST_TYPE: MessageType = MessageType::ClientUfsShareFile;
    const RESPONSE_TYPE: MessageType = MessageType::ClientUfsShareFileResponse;
    const KIND: JobKind = JobKind::new("Ufs.ShareFile");

    type Request = Proto<ShareFileRequest>;
    type Response = Proto<ShareFileResponse>;
}

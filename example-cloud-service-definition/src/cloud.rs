//! Cloud file transfer calls. All three are answered by the generic
//! service-method response and told apart by the job that is waiting.

use jobmux::envelope::Proto;
use jobmux_service::{ServiceMethod, service_job_name};
use prost::Message;

#[derive(Clone, PartialEq, Message)]
pub struct HttpHeader {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub value: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct FileDownloadRequest {
    #[prost(uint32, tag = "1")]
    pub appid: u32,
    #[prost(string, tag = "2")]
    pub filename: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct FileDownloadResponse {
    #[prost(uint32, tag = "1")]
    pub appid: u32,
    #[prost(uint32, tag = "2")]
    pub file_size: u32,
    #[prost(uint32, tag = "3")]
    pub raw_file_size: u32,
    #[prost(bytes = "vec", tag = "4")]
    pub sha_file: Vec<u8>,
    #[prost(uint64, tag = "5")]
    pub time_stamp: u64,
    #[prost(bool, tag = "6")]
    pub is_explicit_delete: bool,
    #[prost(string, tag = "7")]
    pub url_host: String,
    #[prost(string, tag = "8")]
    pub url_path: String,
    #[prost(bool, tag = "9")]
    pub use_https: bool,
    #[prost(message, repeated, tag = "10")]
    pub request_headers: Vec<HttpHeader>,
    #[prost(bool, tag = "11")]
    pub encrypted: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct BeginFileUploadRequest {
    #[prost(uint32, tag = "1")]
    pub appid: u32,
    #[prost(uint32, tag = "2")]
    pub file_size: u32,
    #[prost(uint32, tag = "3")]
    pub raw_file_size: u32,
    #[prost(bytes = "vec", tag = "4")]
    pub file_sha: Vec<u8>,
    #[prost(uint64, tag = "5")]
    pub time_stamp: u64,
    #[prost(string, tag = "6")]
    pub filename: String,
    #[prost(bool, tag = "10")]
    pub can_encrypt: bool,
    #[prost(bool, tag = "11")]
    pub is_shared_file: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct UploadBlockDetails {
    #[prost(string, tag = "1")]
    pub url_host: String,
    #[prost(string, tag = "2")]
    pub url_path: String,
    #[prost(bool, tag = "3")]
    pub use_https: bool,
    #[prost(int32, tag = "4")]
    pub http_method: i32,
    #[prost(message, repeated, tag = "5")]
    pub request_headers: Vec<HttpHeader>,
    #[prost(uint64, tag = "6")]
    pub block_offset: u64,
    #[prost(uint32, tag = "7")]
    pub block_length: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct BeginFileUploadResponse {
    #[prost(bool, tag = "1")]
    pub encrypt_file: bool,
    #[prost(message, repeated, tag = "2")]
    pub block_requests: Vec<UploadBlockDetails>,
}

#[derive(Clone, PartialEq, Message)]
pub struct CommitFileUploadRequest {
    #[prost(bool, tag = "1")]
    pub transfer_succeeded: bool,
    #[prost(uint32, tag = "2")]
    pub appid: u32,
    #[prost(bytes = "vec", tag = "3")]
    pub file_sha: Vec<u8>,
    #[prost(string, tag = "4")]
    pub filename: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct CommitFileUploadResponse {
    #[prost(bool, tag = "1")]
    pub file_committed: bool,
}

pub struct ClientFileDownload;

impl ServiceMethod for ClientFileDownload {
    const JOB_NAME: &'static str = service_job_name!("Cloud", "ClientFileDownload", 1);

    type Request = Proto<FileDownloadRequest>;
    type Response = Proto<FileDownloadResponse>;
}

pub struct ClientBeginFileUpload;

impl ServiceMethod for ClientBeginFileUpload {
    const JOB_NAME: &'static str = service_job_name!("Cloud", "ClientBeginFileUpload", 1);

    type Request = Proto<BeginFileUploadRequest>;
    type Response = Proto<BeginFileUploadResponse>;
}

pub struct ClientCommitFileUpload;

impl ServiceMethod for ClientCommitFileUpload {
    const JOB_NAME: &'static str = service_job_name!("Cloud", "ClientCommitFileUpload", 1);

    type Request = Proto<CommitFileUploadRequest>;
    type Response = Proto<CommitFileUploadResponse>;
}

use example_cloud_service_definition::cloud::{
    ClientBeginFileUpload, ClientCommitFileUpload, ClientFileDownload, CommitFileUploadRequest,
    CommitFileUploadResponse, FileDownloadRequest, FileDownloadResponse, BeginFileUploadRequest,
};
use example_cloud_service_definition::ufs::{
    FileListForAppRequest, FileListForAppResponse, GetFileListForApp, GetSingleFileInfo,
    GetUgcDetails, ShareFile, ShareFileRequest, ShareFileResponse, SingleFileInfoRequest,
    SingleFileInfoResponse, UfsFileInfo, UfsLogin, UfsLoginRequest, UfsLoginResponse,
    UgcDetailsRequest,
};
use jobmux::constants::PROTO_MASK;
use jobmux::envelope::{
    BodyContract, EnvelopeCodec, EnvelopeHeader, InboundEnvelope, InboundPacket, MessageType,
    Proto,
};
use jobmux::job::PendingJobRegistry;
use jobmux::rpc::{JobDispatcher, JobError, JobSession};
use jobmux_service::ServiceMethod;
use jobmux_service_caller::{JobCallerInterface, ServiceCall, UniqueCall};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Caller whose emitted requests are answered in-process by [`serve`].
struct LoopbackCaller {
    session: Arc<JobSession>,
    dispatcher: Arc<Mutex<JobDispatcher>>,
    emit_fn: Arc<dyn Fn(Vec<u8>) + Send + Sync>,
    connected: AtomicBool,
    sent: Arc<Mutex<Vec<MessageType>>>,
}

impl LoopbackCaller {
    fn new() -> Self {
        let registry = Arc::new(PendingJobRegistry::new());
        let session = Arc::new(JobSession::new(registry.clone()));
        let dispatcher = Arc::new(Mutex::new(JobDispatcher::new(registry)));
        let sent = Arc::new(Mutex::new(Vec::new()));

        let emit_fn: Arc<dyn Fn(Vec<u8>) + Send + Sync> = Arc::new({
            let dispatcher = dispatcher.clone();
            let sent = sent.clone();
            move |bytes: Vec<u8>| {
                let is_proto = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
                    & PROTO_MASK
                    != 0;
                let request = InboundEnvelope::parse(InboundPacket::new(is_proto, bytes))
                    .expect("request should parse");
                sent.lock().push(request.msg_type());

                if let Some(reply) = serve(&request) {
                    dispatcher.lock().dispatch(reply);
                }
            }
        });

        Self {
            session,
            dispatcher,
            emit_fn,
            connected: AtomicBool::new(true),
            sent,
        }
    }
}

fn reply<B: BodyContract>(
    msg_type: MessageType,
    request: &InboundEnvelope,
    body: B,
    payload: &[u8],
) -> InboundPacket {
    let header = EnvelopeHeader::reply_to(msg_type, request.header());
    let bytes = EnvelopeCodec::encode_parts(&header, &body, payload).expect("reply encode failed");
    InboundPacket::new(request.flavor() == jobmux::envelope::EnvelopeFlavor::Proto, bytes)
}

/// Answers download, commit, file info, file list, share and login; ignores
/// everything else, including UGC details.
fn serve(request: &InboundEnvelope) -> Option<InboundPacket> {
    match request.msg_type() {
        MessageType::ServiceMethod => {
            let name = request.header().target_job_name.as_deref()?;

            if name == ClientFileDownload::JOB_NAME {
                let req = request.decode::<Proto<FileDownloadRequest>>().ok()?;
                let body = FileDownloadResponse {
                    appid: req.body.appid,
                    url_host: "cdn.example.net".into(),
                    url_path: format!("/{}", req.body.filename),
                    use_https: true,
                    ..Default::default()
                };
                Some(reply(MessageType::ServiceMethodResponse, request, Proto(body), b"blob"))
            } else if name == ClientCommitFileUpload::JOB_NAME {
                let req = request.decode::<Proto<CommitFileUploadRequest>>().ok()?;
                let body = CommitFileUploadResponse {
                    file_committed: req.body.transfer_succeeded,
                };
                Some(reply(MessageType::ServiceMethodResponse, request, Proto(body), &[]))
            } else {
                None
            }
        }
        MessageType::ClientUfsGetSingleFileInfo => {
            let req = request.decode::<Proto<SingleFileInfoRequest>>().ok()?;
            let body = SingleFileInfoResponse {
                eresult: 1,
                app_id: req.body.app_id,
                file_name: req.body.file_name.clone(),
                raw_file_size: 2048,
                ..Default::default()
            };
            Some(reply(
                MessageType::ClientUfsGetSingleFileInfoResponse,
                request,
                Proto(body),
                &[],
            ))
        }
        MessageType::ClientUfsGetFileListForApp => {
            let req = request.decode::<Proto<FileListForAppRequest>>().ok()?;
            let files = req
                .body
                .apps_to_query
                .iter()
                .map(|&app_id| UfsFileInfo {
                    app_id,
                    file_name: format!("{app_id}.sav"),
                    raw_file_size: 512,
                    ..Default::default()
                })
                .collect();
            let body = FileListForAppResponse {
                files,
                path_prefixes: vec!["%GameInstall%".into()],
            };
            Some(reply(
                MessageType::ClientUfsGetFileListForAppResponse,
                request,
                Proto(body),
                &[],
            ))
        }
        MessageType::ClientUfsShareFile => {
            let req = request.decode::<Proto<ShareFileRequest>>().ok()?;
            let body = ShareFileResponse {
                eresult: 1,
                hcontent: (u64::from(req.body.app_id) << 32) | 7,
            };
            Some(reply(MessageType::ClientUfsShareFileResponse, request, Proto(body), &[]))
        }
        MessageType::ClientUfsLoginRequest => {
            let req = request.decode::<UfsLoginRequest>().ok()?;
            let body = UfsLoginResponse {
                result: if req.body.app_ids.is_empty() { 2 } else { 1 },
            };
            Some(reply(MessageType::ClientUfsLoginResponse, request, body, &[]))
        }
        _ => None,
    }
}

#[async_trait::async_trait]
impl JobCallerInterface for LoopbackCaller {
    type DispatcherLock = Mutex<JobDispatcher>;

    fn get_session(&self) -> Arc<JobSession> {
        self.session.clone()
    }

    fn get_dispatcher(&self) -> Arc<Self::DispatcherLock> {
        self.dispatcher.clone()
    }

    fn get_emit_fn(&self) -> Arc<dyn Fn(Vec<u8>) + Send + Sync> {
        self.emit_fn.clone()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn test_call_service_resolves_with_payload() {
    let caller = LoopbackCaller::new();

    let request = Proto(FileDownloadRequest {
        appid: 440,
        filename: "saves/slot1.sav".into(),
    });
    let response = caller
        .call_service::<ClientFileDownload>(&request, &[])
        .await
        .expect("download failed");

    assert_eq!(response.body.appid, 440);
    assert_eq!(response.body.url_path, "/saves/slot1.sav");
    assert_eq!(response.payload, b"blob");
    assert_eq!(caller.session.pending_jobs(), 0);
}

#[tokio::test]
async fn test_call_routes_service_kind_on_first_use() {
    let caller = LoopbackCaller::new();
    assert!(caller.dispatcher.lock().service_kinds().is_empty());

    let request = Proto(CommitFileUploadRequest {
        transfer_succeeded: true,
        appid: 440,
        ..Default::default()
    });
    let response = ClientCommitFileUpload::call(&caller, &request)
        .await
        .expect("commit failed");

    assert!(response.body.file_committed);
    assert_eq!(
        caller.dispatcher.lock().service_kinds(),
        &[ClientCommitFileUpload::KIND]
    );
}

#[tokio::test]
async fn test_unique_calls_for_both_flavors() {
    let caller = LoopbackCaller::new();

    let info = GetSingleFileInfo::call(
        &caller,
        &Proto(SingleFileInfoRequest {
            app_id: 730,
            file_name: "cfg/config.cfg".into(),
        }),
    )
    .await
    .expect("file info failed");
    assert_eq!(info.body.raw_file_size, 2048);
    assert_eq!(info.body.file_name, "cfg/config.cfg");

    let login = UfsLogin::call(
        &caller,
        &UfsLoginRequest {
            protocol_version: 1,
            session_token: 0xDEAD_BEEF,
            app_ids: vec![440, 730],
        },
    )
    .await
    .expect("login failed");
    assert_eq!(login.body, UfsLoginResponse { result: 1 });
}

#[tokio::test]
async fn test_file_list_and_share_resolve_by_response_type() {
    let caller = LoopbackCaller::new();

    let listing = GetFileListForApp::call(
        &caller,
        &Proto(FileListForAppRequest {
            apps_to_query: vec![440, 730],
        }),
    )
    .await
    .expect("file list failed");
    let names: Vec<_> = listing.body.files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(names, ["440.sav", "730.sav"]);
    assert_eq!(listing.body.path_prefixes, ["%GameInstall%"]);

    let shared = ShareFile::call(
        &caller,
        &Proto(ShareFileRequest {
            app_id: 440,
            file_name: "440.sav".into(),
        }),
    )
    .await
    .expect("share failed");
    assert_eq!(shared.body.hcontent, (440u64 << 32) | 7);
    assert_eq!(caller.session.pending_jobs(), 0);
}

#[tokio::test]
async fn test_unanswered_unique_call_stays_pending_until_cancelled() {
    let caller = LoopbackCaller::new();

    let job = caller
        .start_unique_call::<GetUgcDetails>(&Proto(UgcDetailsRequest { hcontent: 99 }), &[])
        .await
        .expect("start failed");

    assert_eq!(caller.session.pending_jobs(), 1);
    assert_eq!(caller.dispatcher.lock().stats().resolved, 0);
    assert!(caller.cancel_job(job.job_id()));
    assert_eq!(job.await.unwrap_err(), JobError::Cancelled);
}

#[tokio::test]
async fn test_unanswered_call_can_be_cancelled() {
    let caller = LoopbackCaller::new();

    let job = caller
        .start_service_call::<ClientBeginFileUpload>(
            &Proto(BeginFileUploadRequest::default()),
            &[],
        )
        .await
        .expect("start failed");

    assert_eq!(caller.session.pending_jobs(), 1);
    assert!(caller.cancel_job(job.job_id()));
    assert_eq!(job.await.unwrap_err(), JobError::Cancelled);
}

#[tokio::test]
async fn test_disconnected_caller_rejects_calls() {
    let caller = LoopbackCaller::new();
    caller.connected.store(false, Ordering::SeqCst);

    let result = caller
        .call_service::<ClientFileDownload>(&Proto(FileDownloadRequest::default()), &[])
        .await;

    assert_eq!(result.unwrap_err(), JobError::Disconnected);
    assert_eq!(caller.session.pending_jobs(), 0);
    assert!(caller.sent.lock().is_empty());

    assert_eq!(
        caller.send_message(
            MessageType::ClientUfsLoginRequest,
            &UfsLoginRequest {
                protocol_version: 1,
                session_token: 0,
                app_ids: vec![],
            },
            &[],
        ),
        Err(JobError::Disconnected)
    );
}

#[tokio::test]
async fn test_send_message_emits_without_registering() {
    let caller = LoopbackCaller::new();

    caller
        .send_message(
            MessageType::ClientUfsGetFileListForApp,
            &Proto(SingleFileInfoRequest::default()),
            &[],
        )
        .expect("send failed");

    assert_eq!(
        *caller.sent.lock(),
        vec![MessageType::ClientUfsGetFileListForApp]
    );
    assert_eq!(caller.session.pending_jobs(), 0);
}

#[tokio::test]
async fn test_concurrent_calls_resolve_independently() {
    let caller = LoopbackCaller::new();

    let download_request = Proto(FileDownloadRequest {
        appid: 1,
        filename: "a".into(),
    });
    let commit_request = Proto(CommitFileUploadRequest {
        transfer_succeeded: false,
        ..Default::default()
    });

    let (download, commit) = tokio::join!(
        caller.call_service::<ClientFileDownload>(&download_request, &[]),
        caller.call_service::<ClientCommitFileUpload>(&commit_request, &[]),
    );

    assert_eq!(download.expect("download failed").body.url_path, "/a");
    assert!(!commit.expect("commit failed").body.file_committed);
}

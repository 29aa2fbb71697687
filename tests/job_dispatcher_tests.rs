use futures::executor::block_on;
use jobmux::envelope::{
    Envelope, EnvelopeCodec, EnvelopeHeader, InboundPacket, MessageType, Proto,
};
use jobmux::job::{JobId, JobKind, PendingJobRegistry};
use jobmux::rpc::{
    AsyncJob, DispatchOutcome, JobDispatcher, JobError, JobSession, JobSink, decoding_sink,
};
use prost::Message;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const DOWNLOAD: JobKind = JobKind::new("Cloud.ClientFileDownload#1");
const BEGIN_UPLOAD: JobKind = JobKind::new("Cloud.ClientBeginFileUpload#1");
const COMMIT_UPLOAD: JobKind = JobKind::new("Cloud.ClientCommitFileUpload#1");
const FILE_INFO: JobKind = JobKind::new("Ufs.GetSingleFileInfo");

#[derive(Clone, PartialEq, Message)]
struct DownloadResponse {
    #[prost(string, tag = "7")]
    url_host: String,
    #[prost(uint32, tag = "2")]
    file_size: u32,
}

#[derive(Clone, PartialEq, Message)]
struct BeginUploadResponse {
    #[prost(bool, tag = "1")]
    encrypt_file: bool,
}

#[derive(Clone, PartialEq, Message)]
struct CommitUploadResponse {
    #[prost(bool, tag = "1")]
    file_committed: bool,
}

#[derive(Clone, PartialEq, Message)]
struct FileInfoRequest {
    #[prost(uint32, tag = "1")]
    app_id: u32,
    #[prost(string, tag = "2")]
    file_name: String,
}

#[derive(Clone, PartialEq, Message)]
struct FileInfoResponse {
    #[prost(int32, tag = "1")]
    eresult: i32,
    #[prost(string, tag = "3")]
    file_name: String,
}

fn new_dispatcher() -> JobDispatcher {
    let mut dispatcher = JobDispatcher::new(Arc::new(PendingJobRegistry::new()));
    dispatcher.register_service_kind(DOWNLOAD);
    dispatcher.register_service_kind(BEGIN_UPLOAD);
    dispatcher.register_service_kind(COMMIT_UPLOAD);
    dispatcher.bind_response(MessageType::ClientUfsGetSingleFileInfoResponse, FILE_INFO);
    dispatcher
}

fn pending<B>(dispatcher: &JobDispatcher, kind: JobKind, job_id: u64) -> AsyncJob<Envelope<B>>
where
    B: jobmux::envelope::BodyContract + Send + 'static,
{
    let (tx, async_job) = AsyncJob::channel(JobId::new(job_id));
    dispatcher
        .registry()
        .register(kind, JobId::new(job_id), decoding_sink::<B>(tx), None)
        .expect("register failed");
    async_job
}

fn service_response<M: Message + Default>(target: u64, body: M, payload: &[u8]) -> InboundPacket {
    let mut header = EnvelopeHeader::new(MessageType::ServiceMethodResponse);
    header.target_job_id = JobId::new(target);
    let bytes = EnvelopeCodec::encode_parts(&header, &Proto(body), payload)
        .expect("encode failed");
    InboundPacket::proto(bytes)
}

#[test]
fn test_generic_response_resolves_download_job() {
    let mut dispatcher = new_dispatcher();
    let job = pending::<Proto<DownloadResponse>>(&dispatcher, DOWNLOAD, 42);

    let body = DownloadResponse {
        url_host: "cdn.example.net".into(),
        file_size: 1024,
    };
    let outcome = dispatcher.dispatch(service_response(42, body.clone(), b"chunk"));

    assert_eq!(
        outcome,
        DispatchOutcome::Resolved {
            job_id: JobId::new(42),
            kind: DOWNLOAD
        }
    );

    let response = block_on(job).expect("job failed");
    assert_eq!(response.body.into_inner(), body);
    assert_eq!(response.payload, b"chunk");
    assert!(dispatcher.registry().is_empty());
    assert_eq!(dispatcher.stats().resolved, 1);
}

#[test]
fn test_unmatched_generic_response_is_discarded() {
    let mut dispatcher = new_dispatcher();
    let mut job = pending::<Proto<BeginUploadResponse>>(&dispatcher, BEGIN_UPLOAD, 7);

    let outcome = dispatcher.dispatch(service_response(
        99,
        BeginUploadResponse { encrypt_file: true },
        &[],
    ));

    assert_eq!(
        outcome,
        DispatchOutcome::Unmatched {
            msg_type: MessageType::ServiceMethodResponse,
            job_id: JobId::new(99)
        }
    );
    assert!(dispatcher.registry().contains(JobId::new(7)));
    assert_eq!(dispatcher.stats().unmatched, 1);
    assert!(job.try_take().is_none());
}

#[test]
fn test_generic_response_decoded_with_owning_kind_contract() {
    let mut dispatcher = new_dispatcher();
    let download = pending::<Proto<DownloadResponse>>(&dispatcher, DOWNLOAD, 1);
    let begin = pending::<Proto<BeginUploadResponse>>(&dispatcher, BEGIN_UPLOAD, 2);
    let commit = pending::<Proto<CommitUploadResponse>>(&dispatcher, COMMIT_UPLOAD, 3);

    dispatcher.dispatch(service_response(3, CommitUploadResponse { file_committed: true }, &[]));
    dispatcher.dispatch(service_response(2, BeginUploadResponse { encrypt_file: true }, &[]));
    dispatcher.dispatch(service_response(
        1,
        DownloadResponse {
            url_host: "a".into(),
            file_size: 9,
        },
        &[],
    ));

    assert!(block_on(commit).expect("commit failed").body.file_committed);
    assert!(block_on(begin).expect("begin failed").body.encrypt_file);
    assert_eq!(block_on(download).expect("download failed").body.file_size, 9);
}

#[test]
fn test_resolution_is_at_most_once() {
    let mut dispatcher = new_dispatcher();
    let job = pending::<Proto<CommitUploadResponse>>(&dispatcher, COMMIT_UPLOAD, 5);

    let first = dispatcher.dispatch(service_response(
        5,
        CommitUploadResponse {
            file_committed: true,
        },
        &[],
    ));
    let second = dispatcher.dispatch(service_response(
        5,
        CommitUploadResponse {
            file_committed: false,
        },
        &[],
    ));

    assert!(matches!(first, DispatchOutcome::Resolved { .. }));
    assert!(matches!(second, DispatchOutcome::Unmatched { .. }));
    assert!(block_on(job).expect("job failed").body.file_committed);
}

#[test]
fn test_unique_response_resolves_by_binding() {
    let mut dispatcher = new_dispatcher();
    let job = pending::<Proto<FileInfoResponse>>(&dispatcher, FILE_INFO, 8);

    let mut header = EnvelopeHeader::new(MessageType::ClientUfsGetSingleFileInfoResponse);
    header.target_job_id = JobId::new(8);
    let body = FileInfoResponse {
        eresult: 1,
        file_name: "a.sav".into(),
    };
    let bytes = EnvelopeCodec::encode_parts(&header, &Proto(body.clone()), &[]).unwrap();

    let outcome = dispatcher.dispatch(InboundPacket::proto(bytes));
    assert_eq!(
        outcome,
        DispatchOutcome::Resolved {
            job_id: JobId::new(8),
            kind: FILE_INFO
        }
    );
    assert_eq!(block_on(job).expect("job failed").body.into_inner(), body);
}

#[test]
fn test_unique_response_does_not_resolve_service_job() {
    let mut dispatcher = new_dispatcher();
    let _job = pending::<Proto<DownloadResponse>>(&dispatcher, DOWNLOAD, 8);

    let mut header = EnvelopeHeader::new(MessageType::ClientUfsGetSingleFileInfoResponse);
    header.target_job_id = JobId::new(8);
    let bytes = EnvelopeCodec::encode_parts(&header, &Proto(FileInfoResponse::default()), &[])
        .unwrap();

    assert!(matches!(
        dispatcher.dispatch(InboundPacket::proto(bytes)),
        DispatchOutcome::Unmatched { .. }
    ));
    assert!(dispatcher.registry().contains(JobId::new(8)));
}

#[test]
fn test_handler_takes_precedence() {
    let mut dispatcher = new_dispatcher();
    let seen = Arc::new(Mutex::new(Vec::new()));

    dispatcher.register_typed_handler::<Proto<FileInfoResponse>, _>(
        MessageType::ClientUfsGetSingleFileInfoResponse,
        {
            let seen = seen.clone();
            move |envelope| seen.lock().unwrap().push(envelope.body.into_inner().file_name)
        },
    );

    let mut header = EnvelopeHeader::new(MessageType::ClientUfsGetSingleFileInfoResponse);
    header.target_job_id = JobId::new(1);
    let body = FileInfoResponse {
        eresult: 1,
        file_name: "pushed.sav".into(),
    };
    let bytes = EnvelopeCodec::encode_parts(&header, &Proto(body), &[]).unwrap();

    assert_eq!(
        dispatcher.dispatch(InboundPacket::proto(bytes)),
        DispatchOutcome::Handled {
            msg_type: MessageType::ClientUfsGetSingleFileInfoResponse
        }
    );
    assert_eq!(*seen.lock().unwrap(), vec!["pushed.sav".to_string()]);
    assert!(dispatcher.remove_handler(MessageType::ClientUfsGetSingleFileInfoResponse));
}

#[test]
fn test_failing_and_panicking_handlers_are_isolated() {
    let mut dispatcher = new_dispatcher();
    dispatcher.register_handler(MessageType::ClientUfsShareFileResponse, |_| {
        Err("rejected".into())
    });
    dispatcher.register_handler(MessageType::ClientUfsGetUgcDetailsResponse, |_| {
        panic!("handler blew up")
    });

    let job = pending::<Proto<DownloadResponse>>(&dispatcher, DOWNLOAD, 4);

    for msg_type in [
        MessageType::ClientUfsShareFileResponse,
        MessageType::ClientUfsGetUgcDetailsResponse,
    ] {
        let bytes = EnvelopeCodec::encode_parts(
            &EnvelopeHeader::new(msg_type),
            &Proto(FileInfoResponse::default()),
            &[],
        )
        .unwrap();
        assert_eq!(
            dispatcher.dispatch(InboundPacket::proto(bytes)),
            DispatchOutcome::HandlerFailed { msg_type }
        );
    }

    // Dispatch carries on.
    dispatcher.dispatch(service_response(4, DownloadResponse::default(), &[]));
    assert!(block_on(job).is_ok());
    assert_eq!(dispatcher.stats().handler_failures, 2);
}

#[test]
fn test_panicking_sink_is_isolated() {
    let mut dispatcher = new_dispatcher();
    let sink: JobSink = Box::new(|_| panic!("sink blew up"));
    dispatcher
        .registry()
        .register(DOWNLOAD, JobId::new(6), sink, None)
        .unwrap();

    assert_eq!(
        dispatcher.dispatch(service_response(6, DownloadResponse::default(), &[])),
        DispatchOutcome::SinkFailed {
            job_id: JobId::new(6),
            kind: DOWNLOAD
        }
    );
    assert_eq!(dispatcher.stats().handler_failures, 1);
    assert!(dispatcher.registry().is_empty());
}

#[test]
fn test_undecodable_body_fails_the_job() {
    let mut dispatcher = new_dispatcher();
    let job = pending::<Proto<DownloadResponse>>(&dispatcher, DOWNLOAD, 12);

    let mut header = EnvelopeHeader::new(MessageType::ServiceMethodResponse);
    header.target_job_id = JobId::new(12);
    let mut bytes =
        EnvelopeCodec::encode_parts(&header, &Proto(BeginUploadResponse::default()), &[])
            .unwrap();
    // The empty body is a lone zero length prefix; claim bytes that never follow.
    let last = bytes.len() - 1;
    bytes[last] = 0x7F;

    dispatcher.dispatch(InboundPacket::proto(bytes));
    assert!(matches!(block_on(job), Err(JobError::Decode(_))));
}

#[test]
fn test_malformed_packet_is_dropped() {
    let mut dispatcher = new_dispatcher();
    assert_eq!(
        dispatcher.dispatch(InboundPacket::proto(vec![1, 2, 3])),
        DispatchOutcome::Dropped
    );
    assert_eq!(
        dispatcher.dispatch(InboundPacket::fixed(vec![0; 12])),
        DispatchOutcome::Dropped
    );

    let stats = dispatcher.stats();
    assert_eq!(stats.dropped, 2);
    assert_eq!(stats.dispatched, 2);
}

#[test]
fn test_message_without_route_is_ignored() {
    let mut dispatcher = new_dispatcher();
    let bytes = EnvelopeCodec::encode_parts(
        &EnvelopeHeader::new(MessageType::from(8_000)),
        &Proto(FileInfoResponse::default()),
        &[],
    )
    .unwrap();

    assert_eq!(
        dispatcher.dispatch(InboundPacket::proto(bytes)),
        DispatchOutcome::Ignored {
            msg_type: MessageType::Unknown(8_000)
        }
    );
    assert_eq!(dispatcher.stats().ignored, 1);
}

#[test]
fn test_sweep_rejects_expired_jobs() {
    let mut dispatcher = new_dispatcher();
    let registry = dispatcher.registry().clone();

    let (tx, expired) = AsyncJob::<Envelope<Proto<DownloadResponse>>>::channel(JobId::new(1));
    registry
        .register(
            DOWNLOAD,
            JobId::new(1),
            decoding_sink(tx),
            Some(Instant::now()),
        )
        .unwrap();
    let (tx, mut alive) = AsyncJob::<Envelope<Proto<DownloadResponse>>>::channel(JobId::new(2));
    registry
        .register(
            DOWNLOAD,
            JobId::new(2),
            decoding_sink(tx),
            Some(Instant::now() + Duration::from_secs(60)),
        )
        .unwrap();

    assert_eq!(dispatcher.sweep_expired(Instant::now()), 1);
    assert_eq!(block_on(expired).unwrap_err(), JobError::TimedOut);
    assert!(alive.try_take().is_none());
    assert_eq!(dispatcher.stats().timed_out, 1);

    // A late response for the expired job is discarded.
    assert!(matches!(
        dispatcher.dispatch(service_response(1, DownloadResponse::default(), &[])),
        DispatchOutcome::Unmatched { .. }
    ));
}

#[test]
fn test_reject_all_disconnects_pending_jobs() {
    let mut dispatcher = new_dispatcher();
    let a = pending::<Proto<DownloadResponse>>(&dispatcher, DOWNLOAD, 1);
    let b = pending::<Proto<FileInfoResponse>>(&dispatcher, FILE_INFO, 2);

    assert_eq!(dispatcher.reject_all(JobError::Disconnected), 2);
    assert_eq!(block_on(a).unwrap_err(), JobError::Disconnected);
    assert_eq!(block_on(b).unwrap_err(), JobError::Disconnected);
    assert!(dispatcher.registry().is_empty());
}

#[test]
fn test_service_kinds_keep_registration_order() {
    let mut dispatcher = new_dispatcher();
    dispatcher.register_service_kind(DOWNLOAD);
    assert_eq!(
        dispatcher.service_kinds(),
        &[DOWNLOAD, BEGIN_UPLOAD, COMMIT_UPLOAD]
    );
}

#[test]
fn test_session_round_trip_through_dispatcher() {
    let registry = Arc::new(PendingJobRegistry::new());
    let session = JobSession::new(registry.clone());
    let mut dispatcher = JobDispatcher::new(registry);
    dispatcher.register_service_kind(DOWNLOAD);

    let request = Proto(FileInfoRequest {
        app_id: 440,
        file_name: "a.sav".into(),
    });
    let issued = session
        .issue_service_call::<_, Proto<DownloadResponse>>(
            DOWNLOAD,
            "Cloud.ClientFileDownload#1",
            &request,
            &[],
        )
        .expect("issue failed");
    let job_id = issued.job_id();

    // The remote end reads the request and replies to its source job.
    let received = EnvelopeCodec::decode::<Proto<FileInfoRequest>>(&issued.bytes).unwrap();
    assert_eq!(received.header.source_job_id, job_id);
    assert_eq!(
        received.header.target_job_name.as_deref(),
        Some("Cloud.ClientFileDownload#1")
    );

    let reply = session
        .encode_reply(
            MessageType::ServiceMethodResponse,
            &received.header,
            &Proto(DownloadResponse {
                url_host: "h".into(),
                file_size: 3,
            }),
            b"xyz",
        )
        .unwrap();

    dispatcher.dispatch(InboundPacket::proto(reply));

    let response = block_on(issued.async_job).expect("job failed");
    assert_eq!(response.header.target_job_id, job_id);
    assert_eq!(response.body.file_size, 3);
    assert_eq!(response.payload, b"xyz");
}

#[test]
fn test_session_cancel_rejects_job() {
    let registry = Arc::new(PendingJobRegistry::new());
    let session = JobSession::new(registry);

    let issued = session
        .issue_unique_call::<_, Proto<FileInfoResponse>>(
            MessageType::ClientUfsGetSingleFileInfo,
            FILE_INFO,
            &Proto(FileInfoRequest::default()),
            &[],
        )
        .unwrap();

    assert_eq!(session.pending_jobs(), 1);
    assert!(session.cancel(issued.job_id()));
    assert!(!session.cancel(issued.job_id()));
    assert_eq!(block_on(issued.async_job).unwrap_err(), JobError::Cancelled);
}

#[test]
fn test_session_encode_failure_leaves_nothing_pending() {
    let registry = Arc::new(PendingJobRegistry::new());
    let session = JobSession::new(registry);

    let result = session.issue_unique_call::<_, Proto<FileInfoResponse>>(
        MessageType::ClientUfsLoginRequest,
        FILE_INFO,
        &Proto(FileInfoRequest::default()),
        &[],
    );

    assert!(matches!(result, Err(JobError::Encode(_))));
    assert_eq!(session.pending_jobs(), 0);
}

#[test]
fn test_session_deadline_follows_job_timeout() {
    let registry = Arc::new(PendingJobRegistry::new());
    let session = JobSession::new(registry.clone()).with_job_timeout(Some(Duration::ZERO));
    let mut dispatcher = JobDispatcher::new(registry);

    let issued = session
        .issue_service_call::<_, Proto<DownloadResponse>>(
            DOWNLOAD,
            "Cloud.ClientFileDownload#1",
            &Proto(FileInfoRequest::default()),
            &[],
        )
        .unwrap();

    assert_eq!(dispatcher.sweep_expired(Instant::now()), 1);
    assert_eq!(block_on(issued.async_job).unwrap_err(), JobError::TimedOut);
}

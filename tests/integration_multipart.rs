//! Multipart uploads driven through the orchestrator against an in-memory vault
//!
//! Covers the part plan seen on the wire, the tree hash sent on completion, concurrency,
//! retries, abort on failure, cancellation and the still-open completion failure.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing,
    clippy::panic
)]

mod common;

use common::{
    ARCHIVE_ID, CapturingObserver, Call, MIB, MockVault, TREE_HASH_2_MIB, TREE_HASH_3_MIB_100,
    TREE_HASH_4_294_304, UPLOAD_ID, pattern_file,
};
use glacierm::glacier::checksum::Hash256;
use glacierm::upload::{
    Ledger, PartError, RetryPolicy, UploadError, UploadEvent, UploadOrchestrator, UploadRequest,
    UploadState,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const SCENARIO_SIZE: u64 = 4_294_304;

fn orchestrator(vault: &Arc<MockVault>, observer: &Arc<CapturingObserver>) -> UploadOrchestrator {
    UploadOrchestrator::new(vault.clone()).with_observer(observer.clone())
}

fn request(path: &std::path::Path, part_size: u64) -> UploadRequest {
    UploadRequest::new("v", "backup", path).with_part_size(part_size)
}

// upload attempts of the part at `range`
fn attempts(vault: &MockVault, range: &str) -> usize {
    vault
        .part_ranges()
        .iter()
        .filter(|sent| *sent == range)
        .count()
}

#[tokio::test]
async fn test_scenario_a_one_mib_parts() {
    let file = pattern_file(SCENARIO_SIZE);
    let vault = Arc::new(MockVault::new(&["v"]));
    let observer = Arc::new(CapturingObserver::new());

    let report = orchestrator(&vault, &observer)
        .with_concurrency(1)
        .upload(&request(file.path(), MIB))
        .await
        .unwrap();

    assert_eq!(
        vault.part_ranges(),
        vec![
            "bytes 0-1048575/*",
            "bytes 1048576-2097151/*",
            "bytes 2097152-3145727/*",
            "bytes 3145728-4194303/*",
            "bytes 4194304-4294303/*",
        ]
    );
    assert_eq!(
        vault.part_sizes(),
        vec![1_048_576, 1_048_576, 1_048_576, 1_048_576, 100_000]
    );

    let calls = vault.calls();
    assert_eq!(calls[0], Call::ListVaults);
    assert_eq!(
        calls[1],
        Call::Initiate {
            vault: "v".to_string(),
            description: "backup".to_string(),
            part_size: MIB,
        }
    );
    assert_eq!(
        calls.last(),
        Some(&Call::Complete {
            upload_id: UPLOAD_ID.to_string(),
            archive_size: SCENARIO_SIZE,
            checksum: TREE_HASH_4_294_304.to_string(),
        })
    );

    assert_eq!(report.archive.archive_id, ARCHIVE_ID);
    assert_eq!(report.upload_id.as_deref(), Some(UPLOAD_ID));
    assert_eq!(report.checksum.to_hex(), TREE_HASH_4_294_304);
    assert_eq!(report.size, SCENARIO_SIZE);
    assert_eq!(report.parts, 5);

    assert_eq!(
        observer.states(),
        vec![
            UploadState::Initiating,
            UploadState::UploadingParts,
            UploadState::Completing,
            UploadState::Completed,
        ]
    );
    assert_eq!(observer.uploaded_parts(), 5);
}

#[tokio::test]
async fn test_scenario_b_two_mib_parts() {
    let file = pattern_file(SCENARIO_SIZE);
    let vault = Arc::new(MockVault::new(&["v"]));
    let observer = Arc::new(CapturingObserver::new());

    let report = orchestrator(&vault, &observer)
        .with_concurrency(1)
        .upload(&request(file.path(), 2 * MIB))
        .await
        .unwrap();

    assert_eq!(vault.part_sizes(), vec![2_097_152, 2_097_152, 100_000]);
    assert_eq!(
        vault.part_ranges(),
        vec![
            "bytes 0-2097151/*",
            "bytes 2097152-4194303/*",
            "bytes 4194304-4294303/*",
        ]
    );
    // the part size does not change the root
    assert_eq!(report.checksum.to_hex(), TREE_HASH_4_294_304);
    assert_eq!(report.parts, 3);
}

#[tokio::test]
async fn test_scenario_c_second_part_fails() {
    let file = pattern_file(2 * MIB + 100);
    let vault = Arc::new(MockVault::new(&["v"]).fail_part(
        MIB,
        400,
        "InvalidParameterValueException",
        1,
    ));
    let observer = Arc::new(CapturingObserver::new());

    let err = orchestrator(&vault, &observer)
        .with_concurrency(1)
        .upload(&request(file.path(), MIB))
        .await
        .unwrap_err();

    assert_eq!(err.state(), UploadState::Aborted);
    assert_eq!(err.upload_id(), Some(UPLOAD_ID));
    match &err {
        UploadError::PartFailed {
            index,
            source: PartError::Remote(remote),
            abort_error: None,
            ..
        } => {
            assert_eq!(*index, 1);
            assert!(!remote.is_transient());
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // the third part is never attempted
    assert_eq!(
        vault.part_ranges(),
        vec!["bytes 0-1048575/*", "bytes 1048576-2097151/*"]
    );
    assert_eq!(vault.count(|c| matches!(c, Call::Complete { .. })), 0);
    assert_eq!(
        vault.calls().last(),
        Some(&Call::Abort {
            upload_id: UPLOAD_ID.to_string()
        })
    );

    assert_eq!(
        observer.states(),
        vec![
            UploadState::Initiating,
            UploadState::UploadingParts,
            UploadState::Aborting,
            UploadState::Aborted,
        ]
    );
    assert!(observer.events().contains(&UploadEvent::AbortIssued {
        upload_id: UPLOAD_ID.to_string()
    }));
}

#[tokio::test]
async fn test_scenario_d_exact_multiple() {
    let file = pattern_file(2 * MIB);
    let vault = Arc::new(MockVault::new(&["v"]));
    let observer = Arc::new(CapturingObserver::new());

    let report = orchestrator(&vault, &observer)
        .upload(&request(file.path(), MIB))
        .await
        .unwrap();

    let mut sizes = vault.part_sizes();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![1_048_576, 1_048_576]);
    assert_eq!(report.parts, 2);
    assert_eq!(report.checksum.to_hex(), TREE_HASH_2_MIB);
}

#[tokio::test]
async fn test_out_of_order_completion_keeps_part_order() {
    let file = pattern_file(3 * MIB + 100);
    // the first part finishes last
    let vault = Arc::new(MockVault::new(&["v"]).delay_part(0, Duration::from_millis(100)));
    let observer = Arc::new(CapturingObserver::new());

    let report = orchestrator(&vault, &observer)
        .with_concurrency(4)
        .upload(&request(file.path(), MIB))
        .await
        .unwrap();

    let uploaded: Vec<usize> = observer
        .events()
        .into_iter()
        .filter_map(|event| match event {
            UploadEvent::PartUploaded { index, .. } => Some(index),
            _ => None,
        })
        .collect();
    assert_eq!(uploaded.len(), 4);
    assert_eq!(uploaded.last(), Some(&0));

    assert_eq!(report.checksum.to_hex(), TREE_HASH_3_MIB_100);
    assert_eq!(
        vault.calls().last(),
        Some(&Call::Complete {
            upload_id: UPLOAD_ID.to_string(),
            archive_size: 3 * MIB + 100,
            checksum: TREE_HASH_3_MIB_100.to_string(),
        })
    );
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let file = pattern_file(5 * MIB);
    let vault = Arc::new(
        MockVault::new(&["v"]).delay_parts((0..5).map(|i| i * MIB), Duration::from_millis(30)),
    );
    let observer = Arc::new(CapturingObserver::new());

    let report = orchestrator(&vault, &observer)
        .with_concurrency(2)
        .upload(&request(file.path(), MIB))
        .await
        .unwrap();

    assert_eq!(report.parts, 5);
    assert_eq!(vault.max_in_flight(), 2);
}

#[tokio::test]
async fn test_sequential_with_concurrency_one() {
    let file = pattern_file(3 * MIB);
    let vault = Arc::new(
        MockVault::new(&["v"]).delay_parts((0..3).map(|i| i * MIB), Duration::from_millis(10)),
    );
    let observer = Arc::new(CapturingObserver::new());

    orchestrator(&vault, &observer)
        .with_concurrency(0)
        .upload(&request(file.path(), MIB))
        .await
        .unwrap();

    assert_eq!(vault.max_in_flight(), 1);
}

#[tokio::test]
async fn test_transient_error_retried() {
    let file = pattern_file(2 * MIB);
    let vault = Arc::new(MockVault::new(&["v"]).fail_part(
        0,
        503,
        "ServiceUnavailableException",
        2,
    ));
    let observer = Arc::new(CapturingObserver::new());

    let report = orchestrator(&vault, &observer)
        .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(1)))
        .upload(&request(file.path(), MIB))
        .await
        .unwrap();

    assert_eq!(report.checksum.to_hex(), TREE_HASH_2_MIB);
    assert_eq!(attempts(&vault, "bytes 0-1048575/*"), 3);

    let retries: Vec<(usize, u32, Duration)> = observer
        .events()
        .into_iter()
        .filter_map(|event| match event {
            UploadEvent::PartRetrying {
                index,
                attempt,
                delay,
                ..
            } => Some((index, attempt, delay)),
            _ => None,
        })
        .collect();
    assert_eq!(
        retries,
        vec![
            (0, 1, Duration::from_millis(1)),
            (0, 2, Duration::from_millis(2)),
        ]
    );
}

#[tokio::test]
async fn test_transient_error_not_retried_by_default() {
    let file = pattern_file(2 * MIB);
    let vault = Arc::new(MockVault::new(&["v"]).fail_part(0, 408, "RequestTimeoutException", 1));
    let observer = Arc::new(CapturingObserver::new());

    let err = orchestrator(&vault, &observer)
        .with_concurrency(1)
        .upload(&request(file.path(), MIB))
        .await
        .unwrap_err();

    assert_eq!(err.state(), UploadState::Aborted);
    assert_eq!(vault.part_ranges(), vec!["bytes 0-1048575/*"]);
    assert_eq!(vault.count(|c| matches!(c, Call::Abort { .. })), 1);
}

#[tokio::test]
async fn test_retries_exhausted() {
    let file = pattern_file(2 * MIB);
    let vault = Arc::new(MockVault::new(&["v"]).fail_part(
        MIB,
        500,
        "ServiceUnavailableException",
        5,
    ));
    let observer = Arc::new(CapturingObserver::new());

    let err = orchestrator(&vault, &observer)
        .with_concurrency(1)
        .with_retry_policy(RetryPolicy::new(2, Duration::from_millis(1)))
        .upload(&request(file.path(), MIB))
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::PartFailed { index: 1, .. }));
    // first attempt plus two retries
    assert_eq!(attempts(&vault, "bytes 1048576-2097151/*"), 3);
}

#[tokio::test]
async fn test_permanent_error_not_retried() {
    let file = pattern_file(2 * MIB);
    let vault = Arc::new(MockVault::new(&["v"]).fail_part(
        0,
        404,
        "ResourceNotFoundException",
        1,
    ));
    let observer = Arc::new(CapturingObserver::new());

    let err = orchestrator(&vault, &observer)
        .with_concurrency(1)
        .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(1)))
        .upload(&request(file.path(), MIB))
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::PartFailed { index: 0, .. }));
    assert_eq!(vault.part_ranges(), vec!["bytes 0-1048575/*"]);
}

#[tokio::test]
async fn test_abort_failure_still_aborted() {
    let file = pattern_file(2 * MIB);
    let vault = Arc::new(
        MockVault::new(&["v"])
            .fail_part(0, 400, "InvalidParameterValueException", 1)
            .fail_abort(404, "ResourceNotFoundException"),
    );
    let observer = Arc::new(CapturingObserver::new());

    let err = orchestrator(&vault, &observer)
        .with_concurrency(1)
        .upload(&request(file.path(), MIB))
        .await
        .unwrap_err();

    assert_eq!(err.state(), UploadState::Aborted);
    assert!(matches!(
        err,
        UploadError::PartFailed {
            abort_error: Some(_),
            ..
        }
    ));
    assert!(err.to_string().contains("abort failed"));
    assert!(
        observer
            .events()
            .iter()
            .any(|event| matches!(event, UploadEvent::AbortFailed { .. }))
    );
}

#[tokio::test]
async fn test_completion_failure_leaves_upload_open() {
    let file = pattern_file(2 * MIB);
    let vault =
        Arc::new(MockVault::new(&["v"]).fail_complete(500, "ServiceUnavailableException", 1));
    let observer = Arc::new(CapturingObserver::new());
    let orchestrator = orchestrator(&vault, &observer);

    let err = orchestrator
        .upload(&request(file.path(), MIB))
        .await
        .unwrap_err();

    assert_eq!(err.state(), UploadState::Completing);
    assert_eq!(err.upload_id(), Some(UPLOAD_ID));
    let checksum: Hash256 = *err.root_digest().unwrap();
    assert_eq!(checksum.to_hex(), TREE_HASH_2_MIB);
    assert_eq!(vault.count(|c| matches!(c, Call::Abort { .. })), 0);
    assert_eq!(observer.states().last(), Some(&UploadState::Completing));

    // the caller can complete it again
    let archive = orchestrator
        .complete_upload("v", UPLOAD_ID, 2 * MIB, &checksum)
        .await
        .unwrap();
    assert_eq!(archive.archive_id, ARCHIVE_ID);
    assert_eq!(vault.count(|c| matches!(c, Call::Complete { .. })), 2);
}

#[tokio::test]
async fn test_abort_upload_manually() {
    let vault = Arc::new(MockVault::new(&["v"]));
    let observer = Arc::new(CapturingObserver::new());

    orchestrator(&vault, &observer)
        .abort_upload("v", "open-upload")
        .await
        .unwrap();

    assert_eq!(
        vault.calls(),
        vec![Call::Abort {
            upload_id: "open-upload".to_string()
        }]
    );
}

#[tokio::test]
async fn test_cancellation_aborts_upload() {
    let file = pattern_file(3 * MIB);
    let cancel = CancellationToken::new();
    let vault = Arc::new(MockVault::new(&["v"]));
    let observer = Arc::new(CapturingObserver::cancelling_after(1, cancel.clone()));

    let err = orchestrator(&vault, &observer)
        .with_concurrency(1)
        .with_cancellation(cancel)
        .upload(&request(file.path(), MIB))
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Interrupted { .. }));
    assert_eq!(err.state(), UploadState::Aborted);
    assert_eq!(vault.part_ranges().len(), 1);
    assert_eq!(vault.count(|c| matches!(c, Call::Abort { .. })), 1);
    assert_eq!(vault.count(|c| matches!(c, Call::Complete { .. })), 0);
}

#[tokio::test]
async fn test_cancel_before_initiate() {
    let file = pattern_file(2 * MIB);
    let cancel = CancellationToken::new();
    let vault = Arc::new(MockVault::new(&["v"]));
    // first event is the vault check, the token is cancelled before the upload is initiated
    let observer = Arc::new(CapturingObserver::cancelling_after(0, cancel.clone()));

    let err = orchestrator(&vault, &observer)
        .with_cancellation(cancel)
        .upload(&request(file.path(), MIB))
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Cancelled));
    assert_eq!(err.state(), UploadState::Cancelled);
    assert_eq!(vault.calls(), vec![Call::ListVaults]);
    assert_eq!(
        observer.states(),
        vec![UploadState::Initiating, UploadState::Cancelled]
    );
}

#[tokio::test]
async fn test_part_failure_cancels_parts_in_flight() {
    let file = pattern_file(4 * MIB);
    let vault = Arc::new(
        MockVault::new(&["v"])
            .fail_part(0, 400, "InvalidParameterValueException", 1)
            .delay_parts([MIB, 2 * MIB, 3 * MIB], Duration::from_secs(30)),
    );
    let observer = Arc::new(CapturingObserver::new());

    let started = Instant::now();
    let err = orchestrator(&vault, &observer)
        .with_concurrency(4)
        .upload(&request(file.path(), MIB))
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(matches!(err, UploadError::PartFailed { index: 0, .. }));
    assert_eq!(err.state(), UploadState::Aborted);
    assert_eq!(observer.uploaded_parts(), 0);
    assert_eq!(vault.count(|c| matches!(c, Call::Abort { .. })), 1);
    assert_eq!(vault.count(|c| matches!(c, Call::Complete { .. })), 0);
}

#[tokio::test]
async fn test_ledger_records_multipart_upload() {
    let tmp_dir = TempDir::new().unwrap();
    let file = pattern_file(2 * MIB);
    let vault = Arc::new(MockVault::new(&["v"]));
    let observer = Arc::new(CapturingObserver::new());
    let ledger = Ledger::new(tmp_dir.path().join("uploaded.json"));

    orchestrator(&vault, &observer)
        .with_ledger(ledger.clone())
        .upload(&request(file.path(), MIB))
        .await
        .unwrap();

    let records = ledger.records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].vault, "v");
    assert_eq!(records[0].description, "backup");
    assert_eq!(records[0].archive_id, ARCHIVE_ID);
    assert_eq!(records[0].checksum, TREE_HASH_2_MIB);
    assert_eq!(records[0].size, 2 * MIB);
    assert_eq!(records[0].upload_id.as_deref(), Some(UPLOAD_ID));
    assert!(observer.events().contains(&UploadEvent::LedgerRecorded {
        archive_id: ARCHIVE_ID.to_string()
    }));
}

#[tokio::test]
async fn test_ledger_failure_keeps_archive() {
    let tmp_dir = TempDir::new().unwrap();
    let file = pattern_file(2 * MIB);
    let vault = Arc::new(MockVault::new(&["v"]));
    let observer = Arc::new(CapturingObserver::new());

    // a directory can not be written as a file
    let err = orchestrator(&vault, &observer)
        .with_ledger(Ledger::new(tmp_dir.path()))
        .upload(&request(file.path(), MIB))
        .await
        .unwrap_err();

    assert_eq!(err.state(), UploadState::Completed);
    assert_eq!(err.archive().map(|a| a.archive_id.as_str()), Some(ARCHIVE_ID));
    assert_eq!(err.upload_id(), Some(UPLOAD_ID));
}

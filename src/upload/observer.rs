use crate::glacier::checksum::Hash256;
use crate::upload::UploadState;
use std::time::Duration;

/// Everything the orchestrator reports while it runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    StateChanged {
        from: UploadState,
        to: UploadState,
    },
    ValidationFailed {
        reason: String,
    },
    VaultChecked {
        vault: String,
        found: bool,
    },
    PartsPlanned {
        parts: usize,
        part_size: u64,
        total_size: u64,
    },
    Initiated {
        upload_id: String,
    },
    PartStarted {
        index: usize,
        range: String,
    },
    PartUploaded {
        index: usize,
        size: u64,
        digest: Hash256,
    },
    PartRetrying {
        index: usize,
        attempt: u32,
        delay: Duration,
        error: String,
    },
    PartFailed {
        index: usize,
        error: String,
    },
    AbortIssued {
        upload_id: String,
    },
    AbortFailed {
        upload_id: String,
        error: String,
    },
    CompletionFailed {
        upload_id: String,
        error: String,
    },
    Completed {
        archive_id: String,
        checksum: String,
        size: u64,
    },
    LedgerRecorded {
        archive_id: String,
    },
    LedgerFailed {
        archive_id: String,
        error: String,
    },
}

/// Sink for [`UploadEvent`]s, shared with the part workers
pub trait UploadObserver: Send + Sync {
    fn on_event(&self, event: &UploadEvent);
}

/// Forward events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl UploadObserver for LogObserver {
    fn on_event(&self, event: &UploadEvent) {
        match event {
            UploadEvent::StateChanged { from, to } => log::debug!("state: {from} -> {to}"),
            UploadEvent::ValidationFailed { reason } => log::error!("validation failed: {reason}"),
            UploadEvent::VaultChecked { vault, found } => {
                if *found {
                    log::info!("vault found: {vault}");
                } else {
                    log::error!("vault not found: {vault}");
                }
            }
            UploadEvent::PartsPlanned {
                parts,
                part_size,
                total_size,
            } => log::info!("{total_size} bytes in {parts} parts of {part_size} bytes"),
            UploadEvent::Initiated { upload_id } => log::info!("upload id: {upload_id}"),
            UploadEvent::PartStarted { index, range } => {
                log::debug!("uploading part: {index}, {range}");
            }
            UploadEvent::PartUploaded {
                index,
                size,
                digest,
            } => log::info!("uploaded part: {index}, size: {size}, tree hash: {digest}"),
            UploadEvent::PartRetrying {
                index,
                attempt,
                delay,
                error,
            } => log::warn!(
                "error uploading part: {index}, retry {attempt} in {}ms: {error}",
                delay.as_millis()
            ),
            UploadEvent::PartFailed { index, error } => {
                log::error!("error uploading part: {index}: {error}");
            }
            UploadEvent::AbortIssued { upload_id } => log::warn!("aborting upload: {upload_id}"),
            UploadEvent::AbortFailed { upload_id, error } => {
                log::error!("could not abort upload {upload_id}: {error}");
            }
            UploadEvent::CompletionFailed { upload_id, error } => {
                log::error!("could not complete upload {upload_id}: {error}");
            }
            UploadEvent::Completed {
                archive_id,
                checksum,
                size,
            } => log::info!("archive id: {archive_id}, size: {size}, tree hash: {checksum}"),
            UploadEvent::LedgerRecorded { archive_id } => {
                log::debug!("ledger updated: {archive_id}");
            }
            UploadEvent::LedgerFailed { archive_id, error } => {
                log::error!("could not record archive {archive_id}: {error}");
            }
        }
    }
}

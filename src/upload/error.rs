use crate::glacier::checksum::Hash256;
use crate::glacier::{ArchiveCreated, RemoteError};
use crate::upload::ledger::LedgerError;
use crate::upload::{UploadReport, UploadState};
use std::io;
use std::path::PathBuf;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("invalid size: {total_size} bytes can not be split in parts of {part_size} bytes")]
    InvalidSize { total_size: u64, part_size: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("unsupported part size: {part_size} bytes, allowed sizes in MiB: {allowed}")]
    UnsupportedPartSize { part_size: u64, allowed: String },

    #[error("part size {part_size} must be smaller than the file size {total_size}")]
    PartSizeTooLarge { part_size: u64, total_size: u64 },

    #[error("{parts} parts of {part_size} bytes exceed the limit of {max} parts per upload")]
    TooManyParts { parts: u64, part_size: u64, max: u64 },

    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure of a single part upload
#[derive(Debug, thiserror::Error)]
pub enum PartError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("could not read part {index}: {source}")]
    Io {
        index: usize,
        #[source]
        source: io::Error,
    },
}

impl PartError {
    /// Only remote failures the service flags as retryable
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Remote(e) => e.is_transient(),
            Self::Io { .. } => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid transition from {from} to {to}")]
pub struct StateError {
    pub from: UploadState,
    pub to: UploadState,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("vault not found: {0}")]
    VaultNotFound(String),

    #[error("could not list vaults: {0}")]
    ListVaults(#[source] RemoteError),

    #[error("could not initiate the multipart upload: {0}")]
    Initiate(#[source] RemoteError),

    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("upload failed: {0}")]
    Archive(#[source] RemoteError),

    #[error("upload cancelled, no archive was created")]
    Cancelled,

    #[error("part {index} failed, multipart upload {upload_id} aborted{}: {source}", abort_suffix(.abort_error.as_ref()))]
    PartFailed {
        index: usize,
        upload_id: String,
        #[source]
        source: PartError,
        abort_error: Option<RemoteError>,
    },

    #[error("upload interrupted, multipart upload {upload_id} aborted{}", abort_suffix(.abort_error.as_ref()))]
    Interrupted {
        upload_id: String,
        abort_error: Option<RemoteError>,
    },

    #[error("could not complete multipart upload {upload_id} (tree hash {checksum}), it is still open: {source}")]
    Complete {
        upload_id: String,
        checksum: Hash256,
        archive_size: u64,
        #[source]
        source: RemoteError,
    },

    #[error("archive {} created but not recorded: {source}", .report.archive.archive_id)]
    Ledger {
        report: Box<UploadReport>,
        #[source]
        source: LedgerError,
    },

    #[error(transparent)]
    Transition(#[from] StateError),
}

fn abort_suffix(abort_error: Option<&RemoteError>) -> String {
    abort_error.map_or_else(String::new, |e| format!(" (abort failed: {e})"))
}

impl UploadError {
    /// State the session ended in
    #[must_use]
    pub const fn state(&self) -> UploadState {
        match self {
            Self::Validation(_)
            | Self::Plan(_)
            | Self::VaultNotFound(_)
            | Self::ListVaults(_)
            | Self::Initiate(_)
            | Self::Io { .. }
            | Self::Archive(_)
            | Self::Cancelled => UploadState::Cancelled,
            Self::PartFailed { .. } | Self::Interrupted { .. } => UploadState::Aborted,
            Self::Complete { .. } => UploadState::Completing,
            Self::Ledger { .. } => UploadState::Completed,
            Self::Transition(e) => e.from,
        }
    }

    /// Upload id of a multipart upload that reached the service
    #[must_use]
    pub fn upload_id(&self) -> Option<&str> {
        match self {
            Self::PartFailed { upload_id, .. }
            | Self::Interrupted { upload_id, .. }
            | Self::Complete { upload_id, .. } => Some(upload_id),
            Self::Ledger { report, .. } => report.upload_id.as_deref(),
            _ => None,
        }
    }

    /// Root tree hash, available once every part was uploaded
    #[must_use]
    pub fn root_digest(&self) -> Option<&Hash256> {
        match self {
            Self::Complete { checksum, .. } => Some(checksum),
            Self::Ledger { report, .. } => Some(&report.checksum),
            _ => None,
        }
    }

    /// The archive exists in the vault even though the call failed
    #[must_use]
    pub fn archive(&self) -> Option<&ArchiveCreated> {
        match self {
            Self::Ledger { report, .. } => Some(&report.archive),
            _ => None,
        }
    }
}

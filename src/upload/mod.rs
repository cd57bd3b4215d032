//! Multipart upload engine: plan the parts, send them, fold their tree hashes and complete

pub mod error;
pub mod iterator;
pub mod ledger;
pub mod observer;
pub mod orchestrator;
pub mod part;
pub mod retry;
pub mod session;
pub mod validator;

pub use self::{
    error::{PartError, PlanError, StateError, UploadError, ValidationError},
    iterator::{PartIterator, plan},
    ledger::{ArchiveRecord, Ledger, LedgerError},
    observer::{LogObserver, UploadEvent, UploadObserver},
    orchestrator::UploadOrchestrator,
    part::{PartDescriptor, PartStatus},
    retry::RetryPolicy,
    session::{UploadSession, UploadState},
    validator::preflight_check,
};

use crate::glacier::ArchiveCreated;
use crate::glacier::checksum::Hash256;
use std::path::PathBuf;

/// What to upload and where
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub vault: String,
    pub description: String,
    pub archive_path: PathBuf,
    // None sends the archive in a single request
    pub part_size: Option<u64>,
}

impl UploadRequest {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(vault: &str, description: &str, archive_path: P) -> Self {
        Self {
            vault: vault.to_string(),
            description: description.to_string(),
            archive_path: archive_path.into(),
            part_size: None,
        }
    }

    #[must_use]
    pub const fn with_part_size(mut self, part_size: u64) -> Self {
        self.part_size = Some(part_size);
        self
    }
}

/// Result of a completed upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub archive: ArchiveCreated,
    // None for whole archive uploads
    pub upload_id: Option<String>,
    pub checksum: Hash256,
    pub size: u64,
    pub parts: usize,
}

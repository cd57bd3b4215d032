use crate::glacier::checksum::Hash256;
use crate::upload::{PartDescriptor, PartStatus, StateError};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadState {
    Validating,
    Initiating,
    UploadingParts,
    Completing,
    Completed,
    Aborting,
    Aborted,
    Cancelled,
}

impl UploadState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "Validating",
            Self::Initiating => "Initiating",
            Self::UploadingParts => "UploadingParts",
            Self::Completing => "Completing",
            Self::Completed => "Completed",
            Self::Aborting => "Aborting",
            Self::Aborted => "Aborted",
            Self::Cancelled => "Cancelled",
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted | Self::Cancelled)
    }

    /// `Validating -> Completed` is the whole archive path, a failed completion stays in
    /// `Completing`
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::Validating,
                Self::Initiating | Self::Completed | Self::Cancelled
            ) | (Self::Initiating, Self::UploadingParts | Self::Cancelled)
                | (Self::UploadingParts, Self::Completing | Self::Aborting)
                | (Self::Completing, Self::Completed)
                | (Self::Aborting, Self::Aborted)
        )
    }
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one upload, owned by a single orchestrator call
#[derive(Debug, Clone)]
pub struct UploadSession {
    vault: String,
    description: String,
    archive_path: PathBuf,
    total_size: u64,
    // None for whole archive uploads
    part_size: Option<u64>,
    upload_id: Option<String>,
    parts: Vec<PartDescriptor>,
    root_digest: Option<Hash256>,
    state: UploadState,
}

impl UploadSession {
    #[must_use]
    pub fn new(
        vault: &str,
        description: &str,
        archive_path: &Path,
        part_size: Option<u64>,
    ) -> Self {
        Self {
            vault: vault.to_string(),
            description: description.to_string(),
            archive_path: archive_path.to_path_buf(),
            total_size: 0,
            part_size,
            upload_id: None,
            parts: Vec::new(),
            root_digest: None,
            state: UploadState::Validating,
        }
    }

    #[must_use]
    pub fn vault(&self) -> &str {
        &self.vault
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    #[must_use]
    pub const fn total_size(&self) -> u64 {
        self.total_size
    }

    #[must_use]
    pub const fn part_size(&self) -> Option<u64> {
        self.part_size
    }

    #[must_use]
    pub fn upload_id(&self) -> Option<&str> {
        self.upload_id.as_deref()
    }

    #[must_use]
    pub fn parts(&self) -> &[PartDescriptor] {
        &self.parts
    }

    #[must_use]
    pub const fn root_digest(&self) -> Option<&Hash256> {
        self.root_digest.as_ref()
    }

    #[must_use]
    pub const fn state(&self) -> UploadState {
        self.state
    }

    pub const fn set_total_size(&mut self, total_size: u64) {
        self.total_size = total_size;
    }

    pub fn set_parts(&mut self, parts: Vec<PartDescriptor>) {
        self.parts = parts;
    }

    pub fn set_upload_id(&mut self, upload_id: String) {
        self.upload_id = Some(upload_id);
    }

    pub const fn set_root_digest(&mut self, digest: Hash256) {
        self.root_digest = Some(digest);
    }

    pub fn part_mut(&mut self, index: usize) -> Option<&mut PartDescriptor> {
        self.parts.get_mut(index)
    }

    #[must_use]
    pub fn all_uploaded(&self) -> bool {
        self.parts
            .iter()
            .all(|part| part.status() == PartStatus::Uploaded)
    }

    /// Part digests in part order, `None` if any part is missing its digest
    #[must_use]
    pub fn part_digests(&self) -> Option<Vec<Hash256>> {
        self.parts
            .iter()
            .map(|part| part.digest().copied())
            .collect()
    }

    /// Bytes of the parts already uploaded
    #[must_use]
    pub fn uploaded_bytes(&self) -> u64 {
        self.parts
            .iter()
            .filter(|part| part.status() == PartStatus::Uploaded)
            .map(PartDescriptor::size)
            .sum()
    }

    /// Move to `next`, returns the previous state
    ///
    /// # Errors
    ///
    /// Will return `Err` if the state machine does not allow the transition
    pub fn transition(&mut self, next: UploadState) -> Result<UploadState, StateError> {
        if self.state.can_transition_to(next) {
            let previous = self.state;
            self.state = next;
            Ok(previous)
        } else {
            Err(StateError {
                from: self.state,
                to: next,
            })
        }
    }
}

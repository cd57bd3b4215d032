use crate::glacier::checksum::Hash256;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartStatus {
    Pending,
    Uploaded,
    Failed,
}

impl fmt::Display for PartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Uploaded => write!(f, "uploaded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A byte range `[range_start, range_end)` of the archive uploaded as one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartDescriptor {
    index: usize,
    range_start: u64,
    range_end: u64,
    digest: Option<Hash256>,
    status: PartStatus,
}

impl PartDescriptor {
    #[must_use]
    pub const fn new(index: usize, range_start: u64, size: u64) -> Self {
        Self {
            index,
            range_start,
            range_end: range_start + size,
            digest: None,
            status: PartStatus::Pending,
        }
    }

    /// Position in the upload, starting at 0
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn range_start(&self) -> u64 {
        self.range_start
    }

    /// Exclusive
    #[must_use]
    pub const fn range_end(&self) -> u64 {
        self.range_end
    }

    #[must_use]
    pub const fn size(&self) -> u64 {
        self.range_end - self.range_start
    }

    /// Tree hash of the part, set once uploaded
    #[must_use]
    pub const fn digest(&self) -> Option<&Hash256> {
        self.digest.as_ref()
    }

    #[must_use]
    pub const fn status(&self) -> PartStatus {
        self.status
    }

    /// `Content-Range` value, the end is inclusive on the wire
    #[must_use]
    pub fn range_header(&self) -> String {
        format!(
            "bytes {}-{}/*",
            self.range_start,
            self.range_end.saturating_sub(1)
        )
    }

    pub fn mark_uploaded(&mut self, digest: Hash256) {
        self.digest = Some(digest);
        self.status = PartStatus::Uploaded;
    }

    pub fn mark_failed(&mut self) {
        self.status = PartStatus::Failed;
    }
}

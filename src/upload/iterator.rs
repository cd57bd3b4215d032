use crate::glacier::limits::AllowedPartSizes;
use crate::upload::{PartDescriptor, PlanError};
use std::{cmp::min, iter::Iterator};

/// Walks `[0, file_size)` in steps of `part_size`, the last part holds the remainder
pub struct PartIterator {
    seek: u64,
    part_size: u64,
    file_size: u64,
    index: usize,
}

impl PartIterator {
    #[must_use]
    pub const fn new(file_size: u64, part_size: u64) -> Self {
        Self {
            seek: 0,
            part_size,
            file_size,
            index: 0,
        }
    }
}

impl Iterator for PartIterator {
    type Item = PartDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        if self.seek >= self.file_size || self.part_size == 0 {
            return None;
        }

        let size = min(self.part_size, self.file_size - self.seek);

        let part = PartDescriptor::new(self.index, self.seek, size);

        log::trace!(
            "PartIterator::next() -> index: {}, seek: {}, size: {}",
            self.index,
            self.seek,
            size
        );

        self.seek += size;
        self.index += 1;

        Some(part)
    }
}

/// Split `total_size` bytes into parts of `part_size`
///
/// # Errors
///
/// Will return `Err` if `total_size` is 0 or `part_size` is not one of the allowed sizes
pub fn plan(total_size: u64, part_size: u64) -> Result<Vec<PartDescriptor>, PlanError> {
    if total_size == 0 || !AllowedPartSizes::contains(part_size) {
        return Err(PlanError::InvalidSize {
            total_size,
            part_size,
        });
    }

    let parts: Vec<PartDescriptor> = PartIterator::new(total_size, part_size).collect();

    log::debug!(
        "plan: {} bytes, part size {}, {} parts",
        total_size,
        part_size,
        parts.len()
    );

    Ok(parts)
}

use crate::glacier::limits::{AllowedPartSizes, MAX_PARTS_PER_UPLOAD};
use crate::upload::ValidationError;
use std::{fs, io, path::Path};

/// Local checks before any remote call, returns the size of the archive
///
/// Checks stop at the first failure:
/// 1. the archive exists and is a regular file
/// 2. the part size (multipart only) is one of [`AllowedPartSizes`]
/// 3. the part size is smaller than the archive
/// 4. the archive fits in the maximum number of parts
///
/// # Errors
///
/// Will return `Err` with the first check that failed
pub fn preflight_check(
    archive_path: &Path,
    part_size: Option<u64>,
) -> Result<u64, ValidationError> {
    let metadata = match fs::metadata(archive_path) {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => return Err(ValidationError::FileNotFound(archive_path.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ValidationError::FileNotFound(archive_path.to_path_buf()));
        }
        Err(source) => {
            return Err(ValidationError::Io {
                path: archive_path.to_path_buf(),
                source,
            });
        }
    };

    let total_size = metadata.len();

    if let Some(part_size) = part_size {
        if !AllowedPartSizes::contains(part_size) {
            return Err(ValidationError::UnsupportedPartSize {
                part_size,
                allowed: AllowedPartSizes::mib_list(),
            });
        }

        if part_size >= total_size {
            return Err(ValidationError::PartSizeTooLarge {
                part_size,
                total_size,
            });
        }

        let parts = total_size.div_ceil(part_size);
        if parts > MAX_PARTS_PER_UPLOAD {
            return Err(ValidationError::TooManyParts {
                parts,
                part_size,
                max: MAX_PARTS_PER_UPLOAD,
            });
        }
    }

    log::debug!(
        "preflight ok: {}, {total_size} bytes, part size: {part_size:?}",
        archive_path.display()
    );

    Ok(total_size)
}

//! Amazon S3 Glacier service limits and constants
//!
//! # References
//! - [Glacier Quotas](https://docs.aws.amazon.com/amazonglacier/latest/dev/limits.html)
//! - [Uploading Large Archives in Parts](https://docs.aws.amazon.com/amazonglacier/latest/dev/uploading-archive-mpu.html)

/// One mebibyte, the unit part sizes are expressed in
pub const MIB: u64 = 1_048_576;

/// Size of the leaves of the SHA-256 tree hash
pub const TREE_HASH_CHUNK_SIZE: usize = 1_048_576;

/// Maximum number of parts in a multipart upload
pub const MAX_PARTS_PER_UPLOAD: u64 = 10_000;

/// Largest archive accepted by a single `UploadArchive` call (4 GiB)
pub const MAX_SINGLE_UPLOAD_BYTES: u64 = 4_294_967_296;

/// Part sizes accepted by `InitiateMultipartUpload`: 1 MiB doubling up to 4 GiB is the service
/// range, the tool caps it at 2048 MiB
pub struct AllowedPartSizes;

impl AllowedPartSizes {
    pub const SIZES: [u64; 12] = [
        MIB,
        2 * MIB,
        4 * MIB,
        8 * MIB,
        16 * MIB,
        32 * MIB,
        64 * MIB,
        128 * MIB,
        256 * MIB,
        512 * MIB,
        1024 * MIB,
        2048 * MIB,
    ];

    #[must_use]
    pub fn contains(size: u64) -> bool {
        Self::SIZES.contains(&size)
    }

    /// Part size in bytes for a size given in MiB, `None` when not allowed
    #[must_use]
    pub fn from_mib(mib: u64) -> Option<u64> {
        mib.checked_mul(MIB).filter(|size| Self::contains(*size))
    }

    pub fn iter() -> impl Iterator<Item = u64> {
        Self::SIZES.into_iter()
    }

    /// The allowed sizes in MiB, for error messages
    #[must_use]
    pub fn mib_list() -> String {
        Self::iter()
            .map(|size| (size / MIB).to_string())
            .collect::<Vec<String>>()
            .join(", ")
    }
}

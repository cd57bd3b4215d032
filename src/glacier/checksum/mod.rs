//! SHA-256 tree hash
//! <https://docs.aws.amazon.com/amazonglacier/latest/dev/checksum-calculations.html>
//!
//! Data is cut into 1 MiB leaves, each leaf is hashed and adjacent digests are hashed together
//! level by level until a single root remains. An odd digest at the end of a level is carried up
//! unchanged.

mod digest;
mod hasher;

pub use self::digest::{FileDigest, PartPayload, digest_file, read_part};
pub use self::hasher::TreeHasher;

use crate::glacier::tools::write_hex_bytes;
use ring::digest::{Context, SHA256};
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        write_hex_bytes(&self.0)
    }

    /// Parse 64 hex digits, case insensitive
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 64 {
            return None;
        }

        let mut bytes = [0_u8; 32];
        for (byte, pair) in bytes.iter_mut().zip(hex.as_bytes().chunks_exact(2)) {
            let [high, low] = pair else {
                return None;
            };
            *byte = (nibble(*high)? << 4) | nibble(*low)?;
        }
        Some(Self(bytes))
    }
}

const fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl From<ring::digest::Digest> for Hash256 {
    fn from(digest: ring::digest::Digest) -> Self {
        let mut bytes = [0_u8; 32];
        for (byte, d) in bytes.iter_mut().zip(digest.as_ref()) {
            *byte = *d;
        }
        Self(bytes)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

/// SHA-256 of raw bytes
#[must_use]
pub fn digest(bytes: impl AsRef<[u8]>) -> Hash256 {
    Hash256::from(ring::digest::digest(&SHA256, bytes.as_ref()))
}

/// SHA-256 of the concatenation of two digests (raw bytes, not hex)
#[must_use]
pub fn combine(left: &Hash256, right: &Hash256) -> Hash256 {
    let mut context = Context::new(&SHA256);
    context.update(left.as_bytes());
    context.update(right.as_bytes());
    Hash256::from(context.finish())
}

/// Fold an ordered sequence of digests into the root, `None` when empty
#[must_use]
pub fn fold(leaves: &[Hash256]) -> Option<Hash256> {
    let mut level = leaves.to_vec();

    while level.len() > 1 {
        level = level
            .chunks(2)
            .filter_map(|pair| pair.iter().copied().reduce(|a, b| combine(&a, &b)))
            .collect();
    }

    level.first().copied()
}

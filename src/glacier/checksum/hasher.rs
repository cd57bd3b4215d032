use crate::glacier::checksum::{Hash256, digest, fold};
use crate::glacier::limits::TREE_HASH_CHUNK_SIZE;
use ring::digest::{Context, SHA256};

/// Streaming tree hash, input may arrive in chunks of any size
pub struct TreeHasher {
    leaves: Vec<Hash256>,
    current: Context,
    // bytes in the current leaf
    filled: usize,
    length: u64,
}

impl Default for TreeHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeHasher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            leaves: Vec::new(),
            current: Context::new(&SHA256),
            filled: 0,
            length: 0,
        }
    }

    pub fn update(&mut self, mut data: &[u8]) {
        self.length += data.len() as u64;

        while !data.is_empty() {
            let take = (TREE_HASH_CHUNK_SIZE - self.filled).min(data.len());
            let (head, tail) = data.split_at(take);
            self.current.update(head);
            self.filled += take;
            data = tail;

            if self.filled == TREE_HASH_CHUNK_SIZE {
                self.close_leaf();
            }
        }
    }

    /// Bytes hashed so far
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.length
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Digests of the completed 1 MiB leaves
    #[must_use]
    pub fn leaves(&self) -> &[Hash256] {
        &self.leaves
    }

    #[must_use]
    pub fn finish(mut self) -> Hash256 {
        if self.filled > 0 {
            self.close_leaf();
        }

        // empty input hashes as a single empty leaf
        fold(&self.leaves).unwrap_or_else(|| digest(b""))
    }

    fn close_leaf(&mut self) {
        let context = std::mem::replace(&mut self.current, Context::new(&SHA256));
        self.leaves.push(Hash256::from(context.finish()));
        self.filled = 0;
    }
}

use crate::glacier::checksum::{Hash256, TreeHasher};
use crate::glacier::tools::write_hex_bytes;
use bytes::{Bytes, BytesMut};
use futures::stream::TryStreamExt;
use ring::digest::{Context, SHA256};
use std::io::{self, SeekFrom};
use std::path::Path;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt},
};
use tokio_util::codec::{BytesCodec, FramedRead};

const READ_CAPACITY: usize = 1024 * 256;

/// One part read from disk: the body to send plus both of its digests
#[derive(Debug, Clone)]
pub struct PartPayload {
    pub body: Bytes,
    // x-amz-sha256-tree-hash
    pub tree_hash: Hash256,
    // x-amz-content-sha256
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    pub tree_hash: Hash256,
    pub sha256: String,
    pub length: u64,
}

/// Read `size` bytes starting at `seek`, hashing them as they are read
///
/// # Errors
///
/// Will return `Err` if the file can not be read or is shorter than expected
pub async fn read_part(path: &Path, seek: u64, size: u64) -> io::Result<PartPayload> {
    let mut file = File::open(path).await?;
    file.seek(SeekFrom::Start(seek)).await?;

    let file = file.take(size);
    let mut stream = FramedRead::with_capacity(file, BytesCodec::new(), READ_CAPACITY);
    let mut body = BytesMut::with_capacity(usize::try_from(size).unwrap_or_default());
    let mut tree = TreeHasher::new();
    let mut linear = Context::new(&SHA256);

    while let Some(bytes) = stream.try_next().await? {
        tree.update(&bytes);
        linear.update(&bytes);
        body.extend_from_slice(&bytes);
    }

    if tree.len() != size {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "{}: expected {size} bytes at offset {seek}, read {}",
                path.display(),
                tree.len()
            ),
        ));
    }

    Ok(PartPayload {
        body: body.freeze(),
        tree_hash: tree.finish(),
        sha256: write_hex_bytes(linear.finish().as_ref()),
    })
}

/// Tree hash, linear SHA-256 and length of a whole file in one pass
///
/// # Errors
///
/// Will return `Err` if the file can not be read
pub async fn digest_file(path: &Path) -> io::Result<FileDigest> {
    let file = File::open(path).await?;
    let mut stream = FramedRead::with_capacity(file, BytesCodec::new(), READ_CAPACITY);
    let mut tree = TreeHasher::new();
    let mut linear = Context::new(&SHA256);

    while let Some(bytes) = stream.try_next().await? {
        tree.update(&bytes);
        linear.update(&bytes);
    }

    let length = tree.len();

    Ok(FileDigest {
        tree_hash: tree.finish(),
        sha256: write_hex_bytes(linear.finish().as_ref()),
        length,
    })
}

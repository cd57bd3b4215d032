//! Remote call surface used by the upload engine

use crate::glacier::actions::{
    AbortMultipartUpload, CompleteMultipartUpload, InitiateMultipartUpload, ListVaults,
    UploadArchive, UploadMultipartPart,
};
use crate::glacier::checksum::Hash256;
use crate::glacier::{Glacier, RemoteError};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RemoteError>> + Send + 'a>>;

/// Archive created by `UploadArchive` or `CompleteMultipartUpload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveCreated {
    pub archive_id: String,
    pub location: String,
    // tree hash computed by the service
    pub checksum: String,
}

/// One part ready to be sent
#[derive(Debug, Clone)]
pub struct PartUpload {
    // bytes {start}-{end}/* (inclusive end)
    pub range: String,
    pub body: Bytes,
    pub tree_hash: Hash256,
    pub sha256: String,
}

/// A whole archive sent in a single request, the body is streamed from `path`
#[derive(Debug, Clone)]
pub struct ArchiveUpload {
    pub path: PathBuf,
    pub description: String,
    pub tree_hash: Hash256,
    pub sha256: String,
    pub length: u64,
}

pub trait VaultTransport: Send + Sync {
    /// Names of every vault of the account
    fn list_vaults(&self) -> TransportFuture<'_, Vec<String>>;

    /// Returns the upload id
    fn initiate_multipart_upload<'a>(
        &'a self,
        vault: &'a str,
        description: &'a str,
        part_size: u64,
    ) -> TransportFuture<'a, String>;

    fn upload_part<'a>(
        &'a self,
        vault: &'a str,
        upload_id: &'a str,
        part: PartUpload,
    ) -> TransportFuture<'a, ()>;

    /// `checksum` is the hex root of the tree hash
    fn complete_multipart_upload<'a>(
        &'a self,
        vault: &'a str,
        upload_id: &'a str,
        archive_size: u64,
        checksum: &'a str,
    ) -> TransportFuture<'a, ArchiveCreated>;

    fn abort_multipart_upload<'a>(
        &'a self,
        vault: &'a str,
        upload_id: &'a str,
    ) -> TransportFuture<'a, ()>;

    fn upload_archive<'a>(
        &'a self,
        vault: &'a str,
        archive: ArchiveUpload,
    ) -> TransportFuture<'a, ArchiveCreated>;
}

impl VaultTransport for Glacier {
    fn list_vaults(&self) -> TransportFuture<'_, Vec<String>> {
        Box::pin(async move {
            let mut vaults = Vec::new();
            let mut marker: Option<String> = None;

            loop {
                let page = ListVaults::new(marker.as_deref()).request(self).await?;
                vaults.extend(page.vault_list.into_iter().map(|v| v.vault_name));

                match page.marker {
                    Some(next) if !next.is_empty() => marker = Some(next),
                    _ => break,
                }
            }

            Ok(vaults)
        })
    }

    fn initiate_multipart_upload<'a>(
        &'a self,
        vault: &'a str,
        description: &'a str,
        part_size: u64,
    ) -> TransportFuture<'a, String> {
        Box::pin(async move {
            InitiateMultipartUpload::new(vault, description, part_size)
                .request(self)
                .await
        })
    }

    fn upload_part<'a>(
        &'a self,
        vault: &'a str,
        upload_id: &'a str,
        part: PartUpload,
    ) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            let tree_hash = part.tree_hash.to_hex();
            UploadMultipartPart::new(vault, upload_id, &part.range, &tree_hash)
                .request(self, part.body, &part.sha256)
                .await
        })
    }

    fn complete_multipart_upload<'a>(
        &'a self,
        vault: &'a str,
        upload_id: &'a str,
        archive_size: u64,
        checksum: &'a str,
    ) -> TransportFuture<'a, ArchiveCreated> {
        Box::pin(async move {
            CompleteMultipartUpload::new(vault, upload_id, archive_size, checksum)
                .request(self)
                .await
        })
    }

    fn abort_multipart_upload<'a>(
        &'a self,
        vault: &'a str,
        upload_id: &'a str,
    ) -> TransportFuture<'a, ()> {
        Box::pin(async move { AbortMultipartUpload::new(vault, upload_id).request(self).await })
    }

    fn upload_archive<'a>(
        &'a self,
        vault: &'a str,
        archive: ArchiveUpload,
    ) -> TransportFuture<'a, ArchiveCreated> {
        Box::pin(async move {
            let tree_hash = archive.tree_hash.to_hex();
            UploadArchive::new(vault, &archive.description, &tree_hash)
                .request(self, &archive.path, &archive.sha256, archive.length)
                .await
        })
    }
}

use crate::glacier::actions::{Action, response_error};
use crate::glacier::{Glacier, Operation, RemoteError, request};
use bytes::Bytes;
use reqwest::{Body, Method};
use std::collections::BTreeMap;

/// Upload one byte range of a multipart upload
#[derive(Debug)]
pub struct UploadMultipartPart<'a> {
    vault: &'a str,
    upload_id: &'a str,
    // Content-Range: bytes {start}-{end}/*
    range: &'a str,
    // x-amz-sha256-tree-hash of the part
    tree_hash: &'a str,
}

impl<'a> UploadMultipartPart<'a> {
    #[must_use]
    pub const fn new(
        vault: &'a str,
        upload_id: &'a str,
        range: &'a str,
        tree_hash: &'a str,
    ) -> Self {
        Self {
            vault,
            upload_id,
            range,
            tree_hash,
        }
    }

    /// `sha256` is the linear hex digest of `body`
    ///
    /// # Errors
    ///
    /// Will return `Err` if can not make the request or the service computed a different
    /// tree hash for the part
    pub async fn request(
        &self,
        glacier: &Glacier,
        body: Bytes,
        sha256: &str,
    ) -> Result<(), RemoteError> {
        let (url, headers) = self.sign(glacier, sha256, Some(body.len() as u64))?;
        let response = request::request(
            glacier,
            self.operation(),
            url,
            self.http_method(),
            &headers,
            Some(Body::from(body)),
        )
        .await?;

        if !response.status().is_success() {
            return Err(response_error(self.operation(), response).await);
        }

        match response
            .headers()
            .get("x-amz-sha256-tree-hash")
            .and_then(|v| v.to_str().ok())
        {
            Some(checksum) if checksum != self.tree_hash => Err(RemoteError::invalid(
                self.operation(),
                format!(
                    "checksum mismatch for {}: sent {}, service computed {checksum}",
                    self.range, self.tree_hash
                ),
            )),
            _ => Ok(()),
        }
    }
}

impl Action for UploadMultipartPart<'_> {
    fn operation(&self) -> Operation {
        Operation::UploadMultipartPart
    }

    fn http_method(&self) -> Method {
        Method::PUT
    }

    fn headers(&self) -> Option<BTreeMap<&str, &str>> {
        let mut map: BTreeMap<&str, &str> = BTreeMap::new();
        map.insert("content-range", self.range);
        map.insert("x-amz-sha256-tree-hash", self.tree_hash);
        Some(map)
    }

    fn query_pairs(&self) -> Option<BTreeMap<&str, &str>> {
        None
    }

    fn path(&self) -> Vec<&str> {
        vec!["vaults", self.vault, "multipart-uploads", self.upload_id]
    }
}

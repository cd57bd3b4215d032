use crate::glacier::actions::{Action, archive_created, response_error};
use crate::glacier::{ArchiveCreated, Glacier, Operation, RemoteError, request, tools};
use reqwest::Method;
use std::collections::BTreeMap;

/// Assemble the uploaded parts into an archive
#[derive(Debug)]
pub struct CompleteMultipartUpload<'a> {
    vault: &'a str,
    upload_id: &'a str,
    archive_size: String,
    tree_hash: &'a str,
}

impl<'a> CompleteMultipartUpload<'a> {
    #[must_use]
    pub fn new(vault: &'a str, upload_id: &'a str, archive_size: u64, tree_hash: &'a str) -> Self {
        Self {
            vault,
            upload_id,
            archive_size: archive_size.to_string(),
            tree_hash,
        }
    }

    /// # Errors
    ///
    /// Will return `Err` if can not make the request or the response lacks the archive headers
    pub async fn request(&self, glacier: &Glacier) -> Result<ArchiveCreated, RemoteError> {
        let (url, headers) = self.sign(glacier, &tools::sha256_digest_string(""), Some(0))?;
        let response = request::request(
            glacier,
            self.operation(),
            url,
            self.http_method(),
            &headers,
            None,
        )
        .await?;

        if response.status().is_success() {
            archive_created(self.operation(), &response)
        } else {
            Err(response_error(self.operation(), response).await)
        }
    }
}

impl Action for CompleteMultipartUpload<'_> {
    fn operation(&self) -> Operation {
        Operation::CompleteMultipartUpload
    }

    fn http_method(&self) -> Method {
        Method::POST
    }

    fn headers(&self) -> Option<BTreeMap<&str, &str>> {
        let mut map: BTreeMap<&str, &str> = BTreeMap::new();
        map.insert("x-amz-archive-size", &self.archive_size);
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

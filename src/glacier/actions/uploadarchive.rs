use crate::glacier::actions::{Action, archive_created, response_error};
use crate::glacier::{ArchiveCreated, Glacier, Operation, RemoteError, request};
use reqwest::Method;
use std::collections::BTreeMap;
use std::path::Path;

/// Upload a whole archive in a single request
#[derive(Debug)]
pub struct UploadArchive<'a> {
    vault: &'a str,
    description: &'a str,
    tree_hash: &'a str,
}

impl<'a> UploadArchive<'a> {
    #[must_use]
    pub const fn new(vault: &'a str, description: &'a str, tree_hash: &'a str) -> Self {
        Self {
            vault,
            description,
            tree_hash,
        }
    }

    /// Streams `path` as the body, `sha256` and `length` must describe the file
    ///
    /// # Errors
    ///
    /// Will return `Err` if the file can not be opened or the request fails
    pub async fn request(
        &self,
        glacier: &Glacier,
        path: &Path,
        sha256: &str,
        length: u64,
    ) -> Result<ArchiveCreated, RemoteError> {
        let (url, headers) = self.sign(glacier, sha256, Some(length))?;

        let body = request::file_body(path).await.map_err(|e| {
            RemoteError::invalid(self.operation(), format!("{}: {e}", path.display()))
        })?;

        let response = request::request(
            glacier,
            self.operation(),
            url,
            self.http_method(),
            &headers,
            Some(body),
        )
        .await?;

        if response.status().is_success() {
            archive_created(self.operation(), &response)
        } else {
            Err(response_error(self.operation(), response).await)
        }
    }
}

impl Action for UploadArchive<'_> {
    fn operation(&self) -> Operation {
        Operation::UploadArchive
    }

    fn http_method(&self) -> Method {
        Method::POST
    }

    fn headers(&self) -> Option<BTreeMap<&str, &str>> {
        let mut map: BTreeMap<&str, &str> = BTreeMap::new();

        if !self.description.is_empty() {
            map.insert("x-amz-archive-description", self.description);
        }

        map.insert("x-amz-sha256-tree-hash", self.tree_hash);

        Some(map)
    }

    fn query_pairs(&self) -> Option<BTreeMap<&str, &str>> {
        None
    }

    fn path(&self) -> Vec<&str> {
        vec!["vaults", self.vault, "archives"]
    }
}

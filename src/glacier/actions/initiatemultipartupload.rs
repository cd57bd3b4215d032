use crate::glacier::actions::{Action, required_header, response_error};
use crate::glacier::{Glacier, Operation, RemoteError, request, tools};
use reqwest::Method;
use std::collections::BTreeMap;

/// Start a multipart upload, the part size is fixed for the whole upload
#[derive(Debug)]
pub struct InitiateMultipartUpload<'a> {
    vault: &'a str,
    description: &'a str,
    part_size: String,
}

impl<'a> InitiateMultipartUpload<'a> {
    #[must_use]
    pub fn new(vault: &'a str, description: &'a str, part_size: u64) -> Self {
        Self {
            vault,
            description,
            part_size: part_size.to_string(),
        }
    }

    /// Returns the upload id
    ///
    /// # Errors
    ///
    /// Will return `Err` if can not make the request or the upload id is missing
    pub async fn request(&self, glacier: &Glacier) -> Result<String, RemoteError> {
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
            required_header(self.operation(), &response, "x-amz-multipart-upload-id")
        } else {
            Err(response_error(self.operation(), response).await)
        }
    }
}

impl Action for InitiateMultipartUpload<'_> {
    fn operation(&self) -> Operation {
        Operation::InitiateMultipartUpload
    }

    fn http_method(&self) -> Method {
        Method::POST
    }

    fn headers(&self) -> Option<BTreeMap<&str, &str>> {
        let mut map: BTreeMap<&str, &str> = BTreeMap::new();

        if !self.description.is_empty() {
            map.insert("x-amz-archive-description", self.description);
        }

        map.insert("x-amz-part-size", &self.part_size);

        Some(map)
    }

    fn query_pairs(&self) -> Option<BTreeMap<&str, &str>> {
        None
    }

    fn path(&self) -> Vec<&str> {
        vec!["vaults", self.vault, "multipart-uploads"]
    }
}

use crate::glacier::actions::{Action, response_error};
use crate::glacier::{Glacier, Operation, RemoteError, request, tools};
use reqwest::Method;
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct AbortMultipartUpload<'a> {
    vault: &'a str,
    upload_id: &'a str,
}

impl<'a> AbortMultipartUpload<'a> {
    #[must_use]
    pub const fn new(vault: &'a str, upload_id: &'a str) -> Self {
        Self { vault, upload_id }
    }

    /// # Errors
    ///
    /// Will return `Err` if can not make the request
    pub async fn request(&self, glacier: &Glacier) -> Result<(), RemoteError> {
        let (url, headers) = self.sign(glacier, &tools::sha256_digest_string(""), None)?;
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
            Ok(())
        } else {
            Err(response_error(self.operation(), response).await)
        }
    }
}

impl Action for AbortMultipartUpload<'_> {
    fn operation(&self) -> Operation {
        Operation::AbortMultipartUpload
    }

    fn http_method(&self) -> Method {
        Method::DELETE
    }

    fn headers(&self) -> Option<BTreeMap<&str, &str>> {
        None
    }

    fn query_pairs(&self) -> Option<BTreeMap<&str, &str>> {
        None
    }

    fn path(&self) -> Vec<&str> {
        vec!["vaults", self.vault, "multipart-uploads", self.upload_id]
    }
}

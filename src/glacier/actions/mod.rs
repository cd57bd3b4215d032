//! Actions
//! <https://docs.aws.amazon.com/amazonglacier/latest/dev/amazon-glacier-api.html>

use crate::glacier::responses::ErrorResponse;
use crate::glacier::signature::Signature;
use crate::glacier::{ArchiveCreated, Glacier, Operation, RemoteError};
use reqwest::{Method, Response};
use std::collections::BTreeMap;
use url::Url;

// <https://docs.aws.amazon.com/amazonglacier/latest/dev/api-vaults-get.html>
mod listvaults;
pub use self::listvaults::ListVaults;

// <https://docs.aws.amazon.com/amazonglacier/latest/dev/api-multipart-initiate-upload.html>
mod initiatemultipartupload;
pub use self::initiatemultipartupload::InitiateMultipartUpload;

// <https://docs.aws.amazon.com/amazonglacier/latest/dev/api-upload-part.html>
mod uploadmultipartpart;
pub use self::uploadmultipartpart::UploadMultipartPart;

// <https://docs.aws.amazon.com/amazonglacier/latest/dev/api-multipart-complete-upload.html>
mod completemultipartupload;
pub use self::completemultipartupload::CompleteMultipartUpload;

// <https://docs.aws.amazon.com/amazonglacier/latest/dev/api-multipart-abort-upload.html>
mod abortmultipartupload;
pub use self::abortmultipartupload::AbortMultipartUpload;

// <https://docs.aws.amazon.com/amazonglacier/latest/dev/api-archive-post.html>
mod uploadarchive;
pub use self::uploadarchive::UploadArchive;

pub trait Action {
    // remote operation, used to tag errors
    fn operation(&self) -> Operation;

    // headers to send in the request
    fn headers(&self) -> Option<BTreeMap<&str, &str>>;

    // method to use GET/PUT...
    fn http_method(&self) -> Method;

    // URL query pairs
    fn query_pairs(&self) -> Option<BTreeMap<&str, &str>>;

    // URL path after /{account-id}/
    fn path(&self) -> Vec<&str>;

    /// # Errors
    ///
    /// Will return `Err` if the endpoint is not a valid base URL
    fn sign(
        &self,
        glacier: &Glacier,
        hash_payload: &str,
        content_length: Option<u64>,
    ) -> Result<(Url, BTreeMap<String, String>), RemoteError> {
        let mut url = glacier
            .endpoint()
            .map_err(|e| RemoteError::invalid(self.operation(), e.to_string()))?;

        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                RemoteError::invalid(self.operation(), "endpoint cannot be a base URL")
            })?;
            segments.pop_if_empty().push(glacier.account_id());
            for p in self.path() {
                segments.push(p);
            }
        }

        if let Some(pairs) = &self.query_pairs() {
            for (k, v) in pairs {
                url.query_pairs_mut().append_pair(k, v);
            }
        }

        let mut signature = Signature::new(glacier, self.http_method());
        let headers = signature.sign(&url, hash_payload, content_length, self.headers());
        Ok((url, headers))
    }
}

/// Turn a non-success response into a [`RemoteError`], the service sends
/// `{"code", "message", "type"}` as body
pub async fn response_error(operation: Operation, response: Response) -> RemoteError {
    let status = response.status();

    if let Some(rid) = response
        .headers()
        .get("x-amzn-requestid")
        .and_then(|v| v.to_str().ok())
    {
        log::debug!("{operation}: request id {rid}");
    }

    match response.text().await {
        Ok(body) => match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(e) => RemoteError::service(operation, status.as_u16(), e.code, e.message),
            Err(_) => RemoteError::service(
                operation,
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown"),
                body,
            ),
        },
        Err(source) => RemoteError::Http { operation, source },
    }
}

/// Read a response header that must be present
pub(crate) fn required_header(
    operation: Operation,
    response: &Response,
    name: &str,
) -> Result<String, RemoteError> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
        .ok_or_else(|| RemoteError::invalid(operation, format!("missing {name} header")))
}

/// `UploadArchive` and `CompleteMultipartUpload` describe the new archive in headers
pub(crate) fn archive_created(
    operation: Operation,
    response: &Response,
) -> Result<ArchiveCreated, RemoteError> {
    Ok(ArchiveCreated {
        archive_id: required_header(operation, response, "x-amz-archive-id")?,
        location: required_header(operation, response, "location")?,
        checksum: required_header(operation, response, "x-amz-sha256-tree-hash")?,
    })
}

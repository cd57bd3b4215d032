use crate::glacier::{Glacier, Operation, RemoteError};
use reqwest::{
    Body, Method, Response,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs::File;
use tokio_util::codec::{BytesCodec, FramedRead};
use url::Url;

/// Send a signed request, `body` is either buffered part bytes or a streamed file
///
/// # Errors
///
/// Will return `Err` if the headers are not valid or the request can not be sent
pub async fn request(
    glacier: &Glacier,
    operation: Operation,
    url: Url,
    method: Method,
    headers: &BTreeMap<String, String>,
    body: Option<Body>,
) -> Result<Response, RemoteError> {
    let headers = header_map(operation, headers)?;

    log::debug!("{operation}: {method} {url}");

    let request = glacier.client().request(method, url).headers(headers);

    let request = match body {
        Some(body) => request.body(body),
        None => request,
    };

    request
        .send()
        .await
        .map_err(|source| RemoteError::Http { operation, source })
}

/// Stream a whole file as the request body
///
/// # Errors
///
/// Will return `Err` if the file can not be opened
pub async fn file_body(path: &Path) -> std::io::Result<Body> {
    let file = File::open(path).await?;
    let stream = FramedRead::with_capacity(file, BytesCodec::new(), 1024 * 256);
    Ok(Body::wrap_stream(stream))
}

fn header_map(
    operation: Operation,
    headers: &BTreeMap<String, String>,
) -> Result<HeaderMap, RemoteError> {
    headers
        .iter()
        .map(|(k, v)| {
            let name = k
                .parse::<HeaderName>()
                .map_err(|e| RemoteError::invalid(operation, format!("header {k}: {e}")))?;
            let value = v
                .parse::<HeaderValue>()
                .map_err(|e| RemoteError::invalid(operation, format!("header {k}: {e}")))?;
            Ok((name, value))
        })
        .collect()
}

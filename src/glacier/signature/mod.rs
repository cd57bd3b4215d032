//! Signature Version 4 for the `glacier` service
//! <https://docs.aws.amazon.com/amazonglacier/latest/dev/amazon-glacier-signing-requests.html>

use crate::glacier::Glacier;
use crate::glacier::tools::{sha256_digest_string, sha256_hmac, write_hex_bytes};
use chrono::prelude::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Method;
use ring::hmac;
use secrecy::ExposeSecret;
use std::collections::BTreeMap;
use url::Url;

pub const SERVICE: &str = "glacier";

/// Required on every request to the service
pub const GLACIER_VERSION: &str = "2012-06-01";

#[derive(Debug)]
pub struct Signature<'a> {
    glacier: &'a Glacier,
    // The HTTPRequestMethod
    http_method: Method,
    // The HTTP request headers
    headers: BTreeMap<String, String>,
    // current date & time
    datetime: DateTime<Utc>,
}

impl<'a> Signature<'a> {
    #[must_use]
    pub fn new(glacier: &'a Glacier, method: Method) -> Self {
        Self {
            glacier,
            http_method: method,
            headers: BTreeMap::new(),
            datetime: Utc::now(),
        }
    }

    /// Sign as if the request was made at `datetime`
    #[must_use]
    pub const fn with_datetime(mut self, datetime: DateTime<Utc>) -> Self {
        self.datetime = datetime;
        self
    }

    /// Need the HexEncode(Hash(RequestPayload)), returns the headers to send including
    /// `Authorization`
    pub fn sign(
        &mut self,
        url: &Url,
        hash_payload: &str,
        content_length: Option<u64>,
        custom_headers: Option<BTreeMap<&str, &str>>,
    ) -> BTreeMap<String, String> {
        let current_date = self.datetime.format("%Y%m%d").to_string();
        let current_datetime = self.datetime.format("%Y%m%dT%H%M%SZ").to_string();

        self.add_header("host", &host_header(url));
        self.add_header("x-amz-date", &current_datetime);
        self.add_header("x-amz-glacier-version", GLACIER_VERSION);
        self.add_header("x-amz-content-sha256", hash_payload);

        if let Some(length) = content_length {
            self.add_header("content-length", &length.to_string());
        }

        if let Some(headers) = custom_headers {
            for (k, v) in headers {
                self.add_header(k, v);
            }
        }

        let signed_headers = signed_headers(&self.headers);

        // 1. Create a canonical request for Signature Version 4
        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            self.http_method.as_str(),
            canonical_uri(url),
            canonical_query_string(url),
            canonical_headers(&self.headers),
            signed_headers,
            hash_payload
        );

        log::trace!("canonical request:\n{canonical_request}");

        // 2. Create a string to sign for Signature Version 4
        let scope = format!(
            "{}/{}/{}/aws4_request",
            current_date,
            self.glacier.region().name(),
            SERVICE
        );
        let string_to_sign = string_to_sign(
            &current_datetime,
            &scope,
            &sha256_digest_string(&canonical_request),
        );

        // 3. Calculate the signature for AWS Signature Version 4
        let signing_key = signature_key(
            self.glacier
                .credentials()
                .aws_secret_access_key()
                .expose_secret(),
            &current_date,
            self.glacier.region().name(),
            SERVICE,
        );
        let signature = sha256_hmac(signing_key.as_ref(), string_to_sign.as_bytes());

        // 4. Add the signature to the HTTP request
        let authorization_header = format!(
            "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
            self.glacier.credentials().aws_access_key_id(),
            scope,
            signed_headers,
            write_hex_bytes(signature.as_ref())
        );
        self.add_header("authorization", &authorization_header);
        self.headers.clone()
    }

    pub fn add_header(&mut self, key: &str, value: &str) {
        self.headers
            .insert(key.to_ascii_lowercase(), value.trim().to_string());
    }
}

// host[:port], the port only when it is not the default for the scheme
fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

// URI encode every byte except the unreserved characters:
// 'A'-'Z', 'a'-'z', '0'-'9', '-', '.', '_', and '~'.
#[must_use]
pub fn canonical_uri(uri: &Url) -> String {
    const FRAGMENT: &AsciiSet = &NON_ALPHANUMERIC
        .remove(b'/')
        .remove(b'-')
        .remove(b'.')
        .remove(b'_')
        .remove(b'~');
    utf8_percent_encode(uri.path(), FRAGMENT).to_string()
}

// Parameters are encoded individually and sorted by key name after encoding.
#[must_use]
pub fn canonical_query_string(uri: &Url) -> String {
    const FRAGMENT: &AsciiSet = &NON_ALPHANUMERIC
        .remove(b'-')
        .remove(b'.')
        .remove(b'_')
        .remove(b'~');
    let mut pairs = uri
        .query_pairs()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(&key, FRAGMENT),
                utf8_percent_encode(&value, FRAGMENT)
            )
        })
        .collect::<Vec<String>>();
    pairs.sort();
    pairs.join("&")
}

fn canonical_headers(headers: &BTreeMap<String, String>) -> String {
    headers
        .iter()
        .map(|(key, value)| format!("{key}:{value}\n"))
        .collect()
}

fn signed_headers(headers: &BTreeMap<String, String>) -> String {
    headers
        .keys()
        .map(String::as_str)
        .collect::<Vec<&str>>()
        .join(";")
}

// https://docs.aws.amazon.com/general/latest/gr/sigv4-create-string-to-sign.html
#[must_use]
pub fn string_to_sign(timestamp: &str, scope: &str, hashed_canonical_request: &str) -> String {
    format!("AWS4-HMAC-SHA256\n{timestamp}\n{scope}\n{hashed_canonical_request}")
}

fn signature_key(secret_access_key: &str, date: &str, region: &str, service: &str) -> hmac::Tag {
    let k_date = sha256_hmac(
        format!("AWS4{secret_access_key}").as_bytes(),
        date.as_bytes(),
    );
    let k_region = sha256_hmac(k_date.as_ref(), region.as_bytes());
    let k_service = sha256_hmac(k_region.as_ref(), service.as_bytes());
    sha256_hmac(k_service.as_ref(), b"aws4_request")
}

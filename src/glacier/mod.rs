pub mod actions;
pub mod checksum;
pub mod credentials;
pub mod error;
pub mod limits;
pub mod region;
pub mod request;
pub mod responses;
pub mod signature;
pub mod tools;
pub mod transport;

pub use self::{
    credentials::Credentials,
    error::{ErrorKind, Operation, RemoteError},
    region::Region,
    signature::Signature,
    transport::{ArchiveCreated, ArchiveUpload, PartUpload, TransportFuture, VaultTransport},
};

use anyhow::{Result, anyhow};
use reqwest::Client;
use std::fmt;
use url::Url;

/// `-` stands for the account that owns the credentials used to sign the request
pub const DEFAULT_ACCOUNT_ID: &str = "-";

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct Glacier {
    // AWS Credentials
    credentials: Credentials,
    // AWS Region
    region: Region,
    // account owning the vaults
    account_id: String,
    // shared connection pool
    client: Client,
}

// Amazon S3 Glacier API Reference
// <https://docs.aws.amazon.com/amazonglacier/latest/dev/amazon-glacier-api.html>
impl Glacier {
    #[must_use]
    pub fn new(credentials: &Credentials, region: &Region, account_id: Option<String>) -> Self {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .unwrap_or_default();

        Self {
            credentials: credentials.clone(),
            region: region.clone(),
            account_id: account_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| DEFAULT_ACCOUNT_ID.to_string()),
            client,
        }
    }

    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    #[must_use]
    pub const fn region(&self) -> &Region {
        &self.region
    }

    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Base URL of the service, custom endpoints may carry their own scheme
    ///
    /// # Errors
    ///
    /// Will return `Err` if the endpoint is not a valid URL
    pub fn endpoint(&self) -> Result<Url> {
        let endpoint = self.region.endpoint();

        let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            Url::parse(&endpoint)
        } else {
            Url::parse(&format!("https://{endpoint}"))
        };

        url.map_err(|e| anyhow!("invalid endpoint {endpoint}: {e}"))
    }
}

impl fmt::Display for Glacier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "endpoint: {}", self.region.endpoint())?;
        writeln!(f, "region: {}", self.region.name())?;
        writeln!(f, "account: {}", self.account_id)?;
        write!(f, "access key: {}", self.credentials.aws_access_key_id())
    }
}

use crate::glacier::actions::{Action, response_error};
use crate::glacier::responses::ListVaultsOutput;
use crate::glacier::{Glacier, Operation, RemoteError, request, tools};
use reqwest::Method;
use std::collections::BTreeMap;

/// One page of vaults owned by the account
#[derive(Debug, Default)]
pub struct ListVaults<'a> {
    marker: Option<&'a str>,
}

impl<'a> ListVaults<'a> {
    #[must_use]
    pub const fn new(marker: Option<&'a str>) -> Self {
        Self { marker }
    }

    /// # Errors
    ///
    /// Will return `Err` if can not make the request or the body is not valid JSON
    pub async fn request(&self, glacier: &Glacier) -> Result<ListVaultsOutput, RemoteError> {
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
            let body = response.text().await.map_err(|source| RemoteError::Http {
                operation: self.operation(),
                source,
            })?;
            serde_json::from_str(&body)
                .map_err(|e| RemoteError::invalid(self.operation(), format!("bad body: {e}")))
        } else {
            Err(response_error(self.operation(), response).await)
        }
    }
}

impl Action for ListVaults<'_> {
    fn operation(&self) -> Operation {
        Operation::ListVaults
    }

    fn http_method(&self) -> Method {
        Method::GET
    }

    fn headers(&self) -> Option<BTreeMap<&str, &str>> {
        None
    }

    fn query_pairs(&self) -> Option<BTreeMap<&str, &str>> {
        self.marker.map(|marker| {
            let mut map: BTreeMap<&str, &str> = BTreeMap::new();
            map.insert("marker", marker);
            map
        })
    }

    fn path(&self) -> Vec<&str> {
        vec!["vaults"]
    }
}

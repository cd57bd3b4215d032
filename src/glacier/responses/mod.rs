use serde::{Deserialize, Serialize};

/// Vault metadata as returned by `ListVaults` and `DescribeVault`
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct DescribeVaultOutput {
    #[serde(rename = "VaultName")]
    pub vault_name: String,
    #[serde(rename = "VaultARN")]
    pub vault_arn: Option<String>,
    #[serde(rename = "CreationDate")]
    pub creation_date: Option<String>,
    #[serde(rename = "LastInventoryDate")]
    pub last_inventory_date: Option<String>,
    #[serde(rename = "NumberOfArchives", default)]
    pub number_of_archives: u64,
    #[serde(rename = "SizeInBytes", default)]
    pub size_in_bytes: u64,
}

/// One page of vaults, `marker` is `None` on the last page
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ListVaultsOutput {
    #[serde(rename = "Marker")]
    pub marker: Option<String>,
    #[serde(rename = "VaultList", default)]
    pub vault_list: Vec<DescribeVaultOutput>,
}

/// Body of every non-success response
#[derive(Deserialize, Debug, Clone)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: Option<String>,
}

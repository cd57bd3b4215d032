use crate::glacier::Region;
use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::{collections::BTreeMap, fs::File, path::PathBuf};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub hosts: BTreeMap<String, Host>,
}

#[derive(Debug, Deserialize)]
pub struct Host {
    pub endpoint: Option<String>,
    pub region: Option<String>,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: SecretString,
    pub account_id: Option<String>,
}

impl Config {
    /// # Errors
    ///
    /// Will return `Err` if the file can not be opened or is not valid YAML
    pub fn new(config_path: PathBuf) -> Result<Self> {
        let file = File::open(&config_path)
            .with_context(|| format!("unable to open {}", config_path.display()))?;

        let config: Self =
            serde_yaml_ng::from_reader(file).context("unable to parse config file")?;

        Ok(config)
    }

    /// Get the host from the config.yml
    ///
    /// # Errors
    ///
    /// Will return `Err` if the host is not defined
    pub fn get_host(&self, name: &str) -> Result<&Host> {
        self.hosts
            .get(name)
            .with_context(|| format!("could not find host {name}"))
    }
}

impl Host {
    /// Region of the host, an `endpoint` makes it a custom region signed with `region` (or the
    /// default one)
    ///
    /// # Errors
    ///
    /// Will return `Err` if the region is unknown
    pub fn get_region(&self) -> Result<Region> {
        match (&self.endpoint, &self.region) {
            (Some(endpoint), region) => Ok(Region::Custom {
                name: region
                    .clone()
                    .unwrap_or_else(|| Region::default().name().to_string()),
                endpoint: endpoint.to_string(),
            }),
            (None, Some(region)) => Ok(region.parse::<Region>()?),
            (None, None) => Ok(Region::default()),
        }
    }
}

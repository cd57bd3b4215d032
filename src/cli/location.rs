use anyhow::{Result, anyhow};

/// `<host>/<vault>` as given on the command line
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VaultLocation {
    pub host: String,
    pub vault: Option<String>,
}

impl VaultLocation {
    /// # Errors
    ///
    /// Will return `Err` if the host is empty, the vault is required but missing, or the vault
    /// name is invalid
    pub fn parse(location: &str, require_vault: bool) -> Result<Self> {
        let (host, vault) = match location.split_once('/') {
            Some((host, vault)) => (host, vault.trim_end_matches('/')),
            None => (location, ""),
        };

        if host.is_empty() {
            return Err(anyhow!("host cannot be empty, expected <host>/<vault>"));
        }

        let vault = if vault.is_empty() {
            if require_vault {
                return Err(anyhow!("vault name missing, expected <host>/<vault>"));
            }
            None
        } else {
            Self::validate_vault_name(vault)?;
            Some(vault.to_string())
        };

        Ok(Self {
            host: host.to_string(),
            vault,
        })
    }

    /// Vault names are 1-255 characters: a-z, A-Z, 0-9, '_', '-' and '.'
    fn validate_vault_name(vault: &str) -> Result<()> {
        if vault.len() > 255 {
            return Err(anyhow!(
                "invalid vault name '{vault}', must be 1-255 characters long"
            ));
        }

        if !vault
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(anyhow!(
                "invalid vault name '{vault}', allowed characters: a-z, A-Z, 0-9, '_', '-', '.'"
            ));
        }

        Ok(())
    }
}

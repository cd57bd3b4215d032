use crate::glacier::{Glacier, actions, responses::DescribeVaultOutput};
use anyhow::Result;
use bytesize::ByteSize;
use colored::Colorize;

/// # Errors
/// Will return an error if the action fails
pub async fn handle(glacier: &Glacier) -> Result<()> {
    let mut marker: Option<String> = None;

    loop {
        let page = actions::ListVaults::new(marker.as_deref())
            .request(glacier)
            .await?;

        for vault in &page.vault_list {
            println!("{}", format_vault(vault));
        }

        match page.marker {
            Some(next) if !next.is_empty() => marker = Some(next),
            _ => break,
        }
    }

    Ok(())
}

fn format_vault(vault: &DescribeVaultOutput) -> String {
    format!(
        "{} {:>10} {:>8} {}",
        format!("[{}]", vault.creation_date.as_deref().unwrap_or("-")).green(),
        ByteSize(vault.size_in_bytes).to_string().yellow(),
        vault.number_of_archives,
        vault.vault_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_vault() {
        colored::control::set_override(false);
        let vault = DescribeVaultOutput {
            vault_name: "photos".to_string(),
            vault_arn: Some("arn:aws:glacier:us-east-1:012345678901:vaults/photos".to_string()),
            creation_date: Some("2012-02-20T17:01:45.198Z".to_string()),
            last_inventory_date: None,
            number_of_archives: 12,
            size_in_bytes: 2048,
        };
        let line = format_vault(&vault);
        assert!(line.starts_with("[2012-02-20T17:01:45.198Z]"));
        assert!(line.ends_with("12 photos"));
    }
}

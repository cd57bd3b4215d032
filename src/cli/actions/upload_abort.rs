use crate::{
    cli::actions::Action,
    glacier::{Glacier, actions},
};
use anyhow::{Context, Result};

/// # Errors
/// Will return an error if the action fails
pub async fn handle(glacier: &Glacier, action: Action) -> Result<()> {
    if let Action::AbortUpload { vault, upload_id } = action {
        actions::AbortMultipartUpload::new(&vault, &upload_id)
            .request(glacier)
            .await
            .with_context(|| format!("could not abort upload {upload_id}"))?;

        println!("aborted: {upload_id}");
    }

    Ok(())
}

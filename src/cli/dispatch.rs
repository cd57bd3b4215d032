use crate::cli::actions::Action;
use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;

// return Action based on the command or subcommand
pub fn dispatch(vault: Option<String>, matches: &clap::ArgMatches) -> Result<Action> {
    // Closure to return subcommand_matches
    let sub_m = |subcommand| -> Result<&clap::ArgMatches> {
        matches
            .subcommand_matches(subcommand)
            .context("arguments missing")
    };

    let vault_required =
        |vault: Option<String>| vault.ok_or_else(|| anyhow!("vault name missing, <host>/<vault>"));

    match matches.subcommand_name() {
        // ListVaults
        Some("ls") => Ok(Action::ListVaults),

        // AbortMultipartUpload
        Some("rm") => {
            let sub_m = sub_m("rm")?;
            let upload_id = sub_m
                .get_one::<String>("UploadId")
                .cloned()
                .context("upload id missing, --upload-id <id>")?;
            Ok(Action::AbortUpload {
                vault: vault_required(vault)?,
                upload_id,
            })
        }

        Some(other) => Err(anyhow!("unknown subcommand: {other}")),

        // UploadArchive or multipart upload
        None => {
            let file = matches
                .get_many::<String>("arguments")
                .unwrap_or_default()
                .next()
                .map(PathBuf::from)
                .context("file missing, /path/to/file <host>/<vault>")?;

            let part_size = if matches.get_flag("multipart") {
                matches.get_one::<u64>("part-size").copied()
            } else {
                None
            };

            let ledger = matches
                .get_one::<PathBuf>("ledger")
                .cloned()
                .context("ledger path missing")?;

            Ok(Action::PutArchive {
                file,
                vault: vault_required(vault)?,
                description: matches
                    .get_one::<String>("description")
                    .cloned()
                    .unwrap_or_default(),
                part_size,
                ledger,
            })
        }
    }
}

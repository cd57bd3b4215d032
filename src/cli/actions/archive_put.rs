use crate::{
    cli::{actions::Action, globals::GlobalArgs, progressbar::ProgressObserver},
    glacier::{Glacier, limits::MAX_SINGLE_UPLOAD_BYTES},
    upload::{
        Ledger, RetryPolicy, UploadError, UploadOrchestrator, UploadReport, UploadRequest,
        UploadState,
    },
};
use anyhow::{Result, anyhow};
use bytesize::ByteSize;
use colored::Colorize;
use std::{fmt::Write, fs, sync::Arc};
use tokio_util::sync::CancellationToken;

/// # Errors
/// Will return an error if the upload fails
pub async fn handle(glacier: Glacier, action: Action, globals: GlobalArgs) -> Result<()> {
    if let Action::PutArchive {
        file,
        vault,
        description,
        part_size,
        ledger,
    } = action
    {
        // missing files are reported by the orchestrator
        let file_size = fs::metadata(&file).map(|m| m.len()).unwrap_or(0);

        if part_size.is_none() && file_size > MAX_SINGLE_UPLOAD_BYTES {
            return Err(anyhow!(
                "{} is larger than {}, use {} to upload it in parts",
                file.display(),
                ByteSize(MAX_SINGLE_UPLOAD_BYTES),
                "--multipart".green()
            ));
        }

        // ctrl-c stops the upload, an open multipart upload is aborted
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        });

        let orchestrator = UploadOrchestrator::new(Arc::new(glacier))
            .with_observer(Arc::new(ProgressObserver::new(file_size, globals.quiet)))
            .with_ledger(Ledger::new(ledger))
            .with_concurrency(globals.workers)
            .with_retry_policy(RetryPolicy::new(globals.retries, globals.retry_delay))
            .with_cancellation(cancel);

        let mut request = UploadRequest::new(&vault, &description, file);
        request.part_size = part_size;

        match orchestrator.upload(&request).await {
            Ok(report) => print!("{}", format_report(&report)),
            Err(e) => {
                if let Some(hint) = recovery_hint(&vault, &e) {
                    eprintln!("{hint}");
                }
                return Err(e.into());
            }
        }
    }

    Ok(())
}

fn format_report(report: &UploadReport) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "archive id: {}", report.archive.archive_id);
    let _ = writeln!(output, "location: {}", report.archive.location);
    let _ = writeln!(output, "checksum: {}", report.checksum);
    let _ = writeln!(output, "size: {}", ByteSize(report.size));
    if let Some(upload_id) = &report.upload_id {
        let _ = writeln!(output, "upload id: {upload_id}");
        let _ = writeln!(output, "parts: {}", report.parts);
    }
    output
}

// what to do with the multipart upload left open by a failed completion
fn recovery_hint(vault: &str, error: &UploadError) -> Option<String> {
    if error.state() != UploadState::Completing {
        return None;
    }

    let upload_id = error.upload_id()?;
    let checksum = error.root_digest()?;

    Some(format!(
        "multipart upload {} is still open (tree hash {checksum}), abort it with: glacierm rm <host>/{vault} --upload-id {upload_id}",
        upload_id.yellow()
    ))
}

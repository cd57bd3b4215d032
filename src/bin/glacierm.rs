use anyhow::Result;
use colored::Colorize;
use glacierm::cli::{
    actions::{Action, archive_put, upload_abort, vault_list},
    start,
};
use std::process::exit;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        exit(1);
    }
}

async fn run() -> Result<()> {
    let (glacier, action, globals) = start()?;

    match action {
        Action::PutArchive { .. } => archive_put::handle(glacier, action, globals).await,
        Action::ListVaults => vault_list::handle(&glacier).await,
        Action::AbortUpload { .. } => upload_abort::handle(&glacier, action).await,
    }
}

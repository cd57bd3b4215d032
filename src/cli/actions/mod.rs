pub mod archive_put;
pub mod upload_abort;
pub mod vault_list;

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ListVaults,
    AbortUpload {
        vault: String,
        upload_id: String,
    },
    PutArchive {
        file: PathBuf,
        vault: String,
        description: String,
        // None uploads the archive in a single request
        part_size: Option<u64>,
        ledger: PathBuf,
    },
}

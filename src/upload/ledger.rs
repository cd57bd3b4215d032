//! JSON record of every archive uploaded, `{"archives": [...]}`

use crate::glacier::ArchiveCreated;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub vault: String,
    pub description: String,
    pub path: String,
    pub size: u64,
    pub archive_id: String,
    pub location: String,
    pub checksum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
    // RFC 3339, UTC
    pub uploaded_at: String,
}

impl ArchiveRecord {
    #[must_use]
    pub fn new(
        vault: &str,
        description: &str,
        path: &Path,
        size: u64,
        archive: &ArchiveCreated,
        upload_id: Option<&str>,
    ) -> Self {
        Self {
            vault: vault.to_string(),
            description: description.to_string(),
            path: path.display().to_string(),
            size,
            archive_id: archive.archive_id.clone(),
            location: archive.location.clone(),
            checksum: archive.checksum.clone(),
            upload_id: upload_id.map(ToString::to_string),
            uploaded_at: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    #[serde(default)]
    archives: Vec<ArchiveRecord>,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("ledger {} is not valid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Append only store, records are never removed
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with an empty list if it does not exist
    ///
    /// # Errors
    ///
    /// Will return `Err` if the file can not be created
    pub fn init(&self) -> Result<(), LedgerError> {
        if self.path.exists() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }

        self.write(&LedgerFile::default())
    }

    /// # Errors
    ///
    /// Will return `Err` if the file can not be read or parsed
    pub fn records(&self) -> Result<Vec<ArchiveRecord>, LedgerError> {
        Ok(self.read()?.archives)
    }

    /// # Errors
    ///
    /// Will return `Err` if the file can not be read, parsed or written
    pub fn append(&self, record: ArchiveRecord) -> Result<(), LedgerError> {
        self.init()?;
        let mut ledger = self.read()?;
        ledger.archives.push(record);
        self.write(&ledger)
    }

    fn read(&self) -> Result<LedgerFile, LedgerError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LedgerFile::default()),
            Err(source) => return Err(self.io_error(source)),
        };

        if content.trim().is_empty() {
            return Ok(LedgerFile::default());
        }

        serde_json::from_str(&content).map_err(|source| LedgerError::Json {
            path: self.path.clone(),
            source,
        })
    }

    // the new list goes to a temporary file next to the ledger and is renamed over it, a
    // failed write leaves the previous file untouched
    fn write(&self, ledger: &LedgerFile) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(ledger).map_err(|source| LedgerError::Json {
            path: self.path.clone(),
            source,
        })?;

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir).map_err(|source| self.io_error(source))?;
        tmp.write_all(json.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|source| self.io_error(source))?;

        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        Ok(())
    }

    fn io_error(&self, source: io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

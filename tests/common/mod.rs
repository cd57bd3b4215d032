//! Shared helpers for the upload engine integration tests
//!
//! - `MockVault`: in-memory `VaultTransport` recording every call, with scripted failures
//! - `CapturingObserver`: keeps every `UploadEvent`, optionally cancels after N parts
//! - `pattern_file`: scratch archive with predictable content

#![allow(
    dead_code,
    clippy::indexing_slicing,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::cast_possible_truncation,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use
)]

use glacierm::glacier::checksum::TreeHasher;
use glacierm::glacier::{
    ArchiveCreated, ArchiveUpload, Operation, PartUpload, RemoteError, TransportFuture,
    VaultTransport,
};
use glacierm::upload::{UploadEvent, UploadObserver, UploadState};
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

pub const UPLOAD_ID: &str = "upload-1";
pub const ARCHIVE_ID: &str = "archive-1";

// tree hashes of `pattern_file` archives
pub const MIB: u64 = 1_048_576;
pub const TREE_HASH_2_MIB: &str =
    "bf4dff263ae686b64403208c35a3767e38453d6477e841947588d13d04e1d816";
pub const TREE_HASH_3_MIB_100: &str =
    "ad7db2234d20fb9ac65642464d2564ed1f82b8de76fd0a0e86cfd91792d46444";
pub const TREE_HASH_4_294_304: &str =
    "112a26ee91b82bbcf0db9a7a94d4068a95c7e509e4615d6ce0a93bc4386370e3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListVaults,
    Initiate {
        vault: String,
        description: String,
        part_size: u64,
    },
    UploadPart {
        upload_id: String,
        range: String,
        len: usize,
    },
    Complete {
        upload_id: String,
        archive_size: u64,
        checksum: String,
    },
    Abort {
        upload_id: String,
    },
    UploadArchive {
        vault: String,
        description: String,
        tree_hash: String,
        length: u64,
    },
}

type Failure = (u16, &'static str);

fn remote(operation: Operation, (status, code): Failure) -> RemoteError {
    RemoteError::service(operation, status, code, "scripted failure")
}

#[derive(Default)]
pub struct MockVault {
    vaults: Vec<String>,
    calls: Mutex<Vec<Call>>,
    list_error: Option<Failure>,
    initiate_error: Option<Failure>,
    abort_error: Option<Failure>,
    archive_error: Option<Failure>,
    // consumed one per call
    complete_errors: Mutex<VecDeque<Failure>>,
    // keyed by the first byte of the part, consumed one per attempt
    part_errors: Mutex<HashMap<u64, VecDeque<Failure>>>,
    part_delays: HashMap<u64, Duration>,
    archive_delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockVault {
    pub fn new(vaults: &[&str]) -> Self {
        Self {
            vaults: vaults.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn fail_list(mut self, status: u16, code: &'static str) -> Self {
        self.list_error = Some((status, code));
        self
    }

    pub fn fail_initiate(mut self, status: u16, code: &'static str) -> Self {
        self.initiate_error = Some((status, code));
        self
    }

    pub fn fail_abort(mut self, status: u16, code: &'static str) -> Self {
        self.abort_error = Some((status, code));
        self
    }

    pub fn fail_archive(mut self, status: u16, code: &'static str) -> Self {
        self.archive_error = Some((status, code));
        self
    }

    pub fn fail_complete(self, status: u16, code: &'static str, times: usize) -> Self {
        self.complete_errors
            .lock()
            .unwrap()
            .extend(std::iter::repeat_n((status, code), times));
        self
    }

    pub fn fail_part(
        self,
        range_start: u64,
        status: u16,
        code: &'static str,
        times: usize,
    ) -> Self {
        self.part_errors
            .lock()
            .unwrap()
            .entry(range_start)
            .or_default()
            .extend(std::iter::repeat_n((status, code), times));
        self
    }

    pub fn delay_part(mut self, range_start: u64, delay: Duration) -> Self {
        self.part_delays.insert(range_start, delay);
        self
    }

    pub fn delay_parts(mut self, starts: impl IntoIterator<Item = u64>, delay: Duration) -> Self {
        for start in starts {
            self.part_delays.insert(start, delay);
        }
        self
    }

    pub fn delay_archive(mut self, delay: Duration) -> Self {
        self.archive_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Ranges of every part upload attempt, in call order
    pub fn part_ranges(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::UploadPart { range, .. } => Some(range),
                _ => None,
            })
            .collect()
    }

    pub fn part_sizes(&self) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::UploadPart { len, .. } => Some(len),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn range_start(range: &str) -> u64 {
    range
        .trim_start_matches("bytes ")
        .split('-')
        .next()
        .and_then(|start| start.parse().ok())
        .unwrap()
}

impl VaultTransport for MockVault {
    fn list_vaults(&self) -> TransportFuture<'_, Vec<String>> {
        Box::pin(async move {
            self.record(Call::ListVaults);
            match self.list_error {
                Some(failure) => Err(remote(Operation::ListVaults, failure)),
                None => Ok(self.vaults.clone()),
            }
        })
    }

    fn initiate_multipart_upload<'a>(
        &'a self,
        vault: &'a str,
        description: &'a str,
        part_size: u64,
    ) -> TransportFuture<'a, String> {
        Box::pin(async move {
            self.record(Call::Initiate {
                vault: vault.to_string(),
                description: description.to_string(),
                part_size,
            });
            match self.initiate_error {
                Some(failure) => Err(remote(Operation::InitiateMultipartUpload, failure)),
                None => Ok(UPLOAD_ID.to_string()),
            }
        })
    }

    fn upload_part<'a>(
        &'a self,
        _vault: &'a str,
        upload_id: &'a str,
        part: PartUpload,
    ) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            let start = range_start(&part.range);
            self.record(Call::UploadPart {
                upload_id: upload_id.to_string(),
                range: part.range.clone(),
                len: part.body.len(),
            });

            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);

            if let Some(delay) = self.part_delays.get(&start) {
                tokio::time::sleep(*delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let failure = self
                .part_errors
                .lock()
                .unwrap()
                .get_mut(&start)
                .and_then(VecDeque::pop_front);
            if let Some(failure) = failure {
                return Err(remote(Operation::UploadMultipartPart, failure));
            }

            // the service checks the tree hash of every part
            let mut hasher = TreeHasher::new();
            hasher.update(&part.body);
            if hasher.finish() != part.tree_hash {
                return Err(RemoteError::invalid(
                    Operation::UploadMultipartPart,
                    "tree hash mismatch",
                ));
            }

            Ok(())
        })
    }

    fn complete_multipart_upload<'a>(
        &'a self,
        _vault: &'a str,
        upload_id: &'a str,
        archive_size: u64,
        checksum: &'a str,
    ) -> TransportFuture<'a, ArchiveCreated> {
        Box::pin(async move {
            self.record(Call::Complete {
                upload_id: upload_id.to_string(),
                archive_size,
                checksum: checksum.to_string(),
            });

            let failure = self.complete_errors.lock().unwrap().pop_front();
            if let Some(failure) = failure {
                return Err(remote(Operation::CompleteMultipartUpload, failure));
            }

            Ok(ArchiveCreated {
                archive_id: ARCHIVE_ID.to_string(),
                location: format!("/-/vaults/v/archives/{ARCHIVE_ID}"),
                checksum: checksum.to_string(),
            })
        })
    }

    fn abort_multipart_upload<'a>(
        &'a self,
        _vault: &'a str,
        upload_id: &'a str,
    ) -> TransportFuture<'a, ()> {
        Box::pin(async move {
            self.record(Call::Abort {
                upload_id: upload_id.to_string(),
            });
            match self.abort_error {
                Some(failure) => Err(remote(Operation::AbortMultipartUpload, failure)),
                None => Ok(()),
            }
        })
    }

    fn upload_archive<'a>(
        &'a self,
        vault: &'a str,
        archive: ArchiveUpload,
    ) -> TransportFuture<'a, ArchiveCreated> {
        Box::pin(async move {
            self.record(Call::UploadArchive {
                vault: vault.to_string(),
                description: archive.description.clone(),
                tree_hash: archive.tree_hash.to_hex(),
                length: archive.length,
            });
            if let Some(delay) = self.archive_delay {
                tokio::time::sleep(delay).await;
            }
            match self.archive_error {
                Some(failure) => Err(remote(Operation::UploadArchive, failure)),
                None => Ok(ArchiveCreated {
                    archive_id: ARCHIVE_ID.to_string(),
                    location: format!("/-/vaults/{vault}/archives/{ARCHIVE_ID}"),
                    checksum: archive.tree_hash.to_hex(),
                }),
            }
        })
    }
}

#[derive(Default)]
pub struct CapturingObserver {
    events: Mutex<Vec<UploadEvent>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl CapturingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel `token` on the first event seen once `parts` parts are uploaded
    pub fn cancelling_after(parts: usize, token: CancellationToken) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            cancel_after: Some((parts, token)),
        }
    }

    pub fn events(&self) -> Vec<UploadEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Every state entered, in order
    pub fn states(&self) -> Vec<UploadState> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UploadEvent::StateChanged { to, .. } => Some(to),
                _ => None,
            })
            .collect()
    }

    pub fn uploaded_parts(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, UploadEvent::PartUploaded { .. }))
            .count()
    }
}

impl UploadObserver for CapturingObserver {
    fn on_event(&self, event: &UploadEvent) {
        let uploaded = {
            let mut events = self.events.lock().unwrap();
            events.push(event.clone());
            events
                .iter()
                .filter(|event| matches!(event, UploadEvent::PartUploaded { .. }))
                .count()
        };

        match &self.cancel_after {
            Some((parts, token)) if uploaded >= *parts => token.cancel(),
            _ => (),
        }
    }
}

/// Scratch archive of `size` bytes where byte `i` is `i % 251`
pub fn pattern_file(size: u64) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    file.write_all(&data).expect("Failed to write to temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

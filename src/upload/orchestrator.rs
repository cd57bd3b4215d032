use crate::glacier::checksum::{self, Hash256, digest_file, read_part};
use crate::glacier::{ArchiveCreated, ArchiveUpload, PartUpload, RemoteError, VaultTransport};
use crate::upload::{
    ArchiveRecord, Ledger, LogObserver, PartDescriptor, PartError, RetryPolicy, StateError,
    UploadError, UploadEvent, UploadObserver, UploadReport, UploadRequest, UploadSession,
    UploadState, iterator::plan, validator::preflight_check,
};
use futures::stream::{FuturesUnordered, StreamExt};
use std::{future::Future, io, path::Path, sync::Arc};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_CONCURRENCY: usize = 4;

// why the part upload loop stopped
enum PartsOutcome {
    Failed { index: usize, source: PartError },
    Interrupted,
}

/// Drives one upload through `Validating -> Initiating -> UploadingParts -> Completing`
pub struct UploadOrchestrator {
    transport: Arc<dyn VaultTransport>,
    observer: Arc<dyn UploadObserver>,
    ledger: Option<Ledger>,
    concurrency: usize,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl UploadOrchestrator {
    #[must_use]
    pub fn new(transport: Arc<dyn VaultTransport>) -> Self {
        Self {
            transport,
            observer: Arc::new(LogObserver),
            ledger: None,
            concurrency: DEFAULT_CONCURRENCY,
            retry: RetryPolicy::default(),
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn UploadObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn with_ledger(mut self, ledger: Ledger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Parts in flight at the same time, at least 1
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Cancelling the token stops the upload before the archive is created: the vault check
    /// and a whole archive upload are dropped, an initiated multipart upload is aborted. The
    /// final `CompleteMultipartUpload` call is not interrupted.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Upload the archive, in parts when `request.part_size` is set
    ///
    /// # Errors
    ///
    /// Will return `Err` if validation fails, the vault does not exist or any remote call
    /// fails, [`UploadError::state`] tells where the upload stopped
    pub async fn upload(&self, request: &UploadRequest) -> Result<UploadReport, UploadError> {
        let mut session = UploadSession::new(
            &request.vault,
            &request.description,
            &request.archive_path,
            request.part_size,
        );

        let total_size = match preflight_check(&request.archive_path, request.part_size) {
            Ok(size) => size,
            Err(e) => {
                self.emit(UploadEvent::ValidationFailed {
                    reason: e.to_string(),
                });
                return Err(self.cancel_session(&mut session, e.into()));
            }
        };
        session.set_total_size(total_size);

        let checked = self
            .unless_cancelled(self.check_vault(&request.vault))
            .await
            .unwrap_or(Err(UploadError::Cancelled));

        if let Err(e) = checked {
            return Err(self.cancel_session(&mut session, e));
        }

        match request.part_size {
            Some(part_size) => self.upload_multipart(request, &mut session, part_size).await,
            None => self.upload_whole(request, &mut session).await,
        }
    }

    /// Complete an open multipart upload, for uploads that stopped in `Completing`
    ///
    /// # Errors
    ///
    /// Will return `Err` if the service rejects the request
    pub async fn complete_upload(
        &self,
        vault: &str,
        upload_id: &str,
        archive_size: u64,
        checksum: &Hash256,
    ) -> Result<ArchiveCreated, RemoteError> {
        self.transport
            .complete_multipart_upload(vault, upload_id, archive_size, &checksum.to_hex())
            .await
    }

    /// # Errors
    ///
    /// Will return `Err` if the service rejects the request
    pub async fn abort_upload(&self, vault: &str, upload_id: &str) -> Result<(), RemoteError> {
        self.emit(UploadEvent::AbortIssued {
            upload_id: upload_id.to_string(),
        });
        self.transport.abort_multipart_upload(vault, upload_id).await
    }

    async fn check_vault(&self, vault: &str) -> Result<(), UploadError> {
        let vaults = self
            .transport
            .list_vaults()
            .await
            .map_err(UploadError::ListVaults)?;

        let found = vaults.iter().any(|name| name == vault);
        self.emit(UploadEvent::VaultChecked {
            vault: vault.to_string(),
            found,
        });

        if found {
            Ok(())
        } else {
            Err(UploadError::VaultNotFound(vault.to_string()))
        }
    }

    async fn upload_whole(
        &self,
        request: &UploadRequest,
        session: &mut UploadSession,
    ) -> Result<UploadReport, UploadError> {
        let digest = match self.unless_cancelled(digest_file(&request.archive_path)).await {
            Some(Ok(digest)) => digest,
            None => return Err(self.cancel_session(session, UploadError::Cancelled)),
            Some(Err(source)) => {
                let e = UploadError::Io {
                    path: request.archive_path.clone(),
                    source,
                };
                return Err(self.cancel_session(session, e));
            }
        };

        let archive = ArchiveUpload {
            path: request.archive_path.clone(),
            description: request.description.clone(),
            tree_hash: digest.tree_hash,
            sha256: digest.sha256,
            length: digest.length,
        };

        let created = match self
            .unless_cancelled(self.transport.upload_archive(&request.vault, archive))
            .await
        {
            Some(Ok(created)) => created,
            None => return Err(self.cancel_session(session, UploadError::Cancelled)),
            Some(Err(e)) => return Err(self.cancel_session(session, UploadError::Archive(e))),
        };

        session.set_root_digest(digest.tree_hash);
        self.transition(session, UploadState::Completed)?;

        let report = UploadReport {
            archive: created,
            upload_id: None,
            checksum: digest.tree_hash,
            size: digest.length,
            parts: 1,
        };

        self.finish(request, report)
    }

    async fn upload_multipart(
        &self,
        request: &UploadRequest,
        session: &mut UploadSession,
        part_size: u64,
    ) -> Result<UploadReport, UploadError> {
        let total_size = session.total_size();

        match plan(total_size, part_size) {
            Ok(parts) => session.set_parts(parts),
            Err(e) => return Err(self.cancel_session(session, e.into())),
        }

        self.emit(UploadEvent::PartsPlanned {
            parts: session.parts().len(),
            part_size,
            total_size,
        });

        self.transition(session, UploadState::Initiating)?;

        // once initiated the upload id is needed to abort, so the call itself is not raced
        if self.cancel.is_cancelled() {
            return Err(self.cancel_session(session, UploadError::Cancelled));
        }

        let upload_id = match self
            .transport
            .initiate_multipart_upload(&request.vault, &request.description, part_size)
            .await
        {
            Ok(upload_id) => upload_id,
            Err(e) => return Err(self.cancel_session(session, UploadError::Initiate(e))),
        };

        session.set_upload_id(upload_id.clone());
        self.emit(UploadEvent::Initiated {
            upload_id: upload_id.clone(),
        });

        self.transition(session, UploadState::UploadingParts)?;

        let root = match self
            .upload_parts(&request.vault, &upload_id, &request.archive_path, session)
            .await
        {
            Ok(root) => root,
            Err(outcome) => {
                return Err(self.abort(&request.vault, upload_id, session, outcome).await);
            }
        };

        session.set_root_digest(root);
        self.transition(session, UploadState::Completing)?;

        let created = match self
            .transport
            .complete_multipart_upload(&request.vault, &upload_id, total_size, &root.to_hex())
            .await
        {
            Ok(created) => created,
            Err(source) => {
                self.emit(UploadEvent::CompletionFailed {
                    upload_id: upload_id.clone(),
                    error: source.to_string(),
                });
                return Err(UploadError::Complete {
                    upload_id,
                    checksum: root,
                    archive_size: total_size,
                    source,
                });
            }
        };

        if !created.checksum.is_empty() && Hash256::from_hex(&created.checksum) != Some(root) {
            log::warn!(
                "tree hash returned by the service {} differs from {root}",
                created.checksum
            );
        }

        self.transition(session, UploadState::Completed)?;

        let report = UploadReport {
            archive: created,
            upload_id: Some(upload_id),
            checksum: root,
            size: total_size,
            parts: session.parts().len(),
        };

        self.finish(request, report)
    }

    // upload every planned part, at most `concurrency` at a time, and fold the part digests
    async fn upload_parts(
        &self,
        vault: &str,
        upload_id: &str,
        path: &Path,
        session: &mut UploadSession,
    ) -> Result<Hash256, PartsOutcome> {
        let parts = session.parts().to_vec();
        let mut pending = parts.iter();
        let mut tasks = FuturesUnordered::new();

        loop {
            while tasks.len() < self.concurrency {
                match pending.next() {
                    Some(part) => tasks.push(self.upload_part(vault, upload_id, path, part)),
                    None => break,
                }
            }

            // dropping `tasks` on return cancels the parts still in flight
            let next = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(PartsOutcome::Interrupted),
                next = tasks.next() => next,
            };

            match next {
                Some((index, Ok(digest))) => {
                    if let Some(part) = session.part_mut(index) {
                        part.mark_uploaded(digest);
                    }
                }
                Some((index, Err(source))) => {
                    if let Some(part) = session.part_mut(index) {
                        part.mark_failed();
                    }
                    self.emit(UploadEvent::PartFailed {
                        index,
                        error: source.to_string(),
                    });
                    return Err(PartsOutcome::Failed { index, source });
                }
                None => break,
            }
        }

        if self.cancel.is_cancelled() {
            return Err(PartsOutcome::Interrupted);
        }

        session
            .part_digests()
            .and_then(|digests| checksum::fold(&digests))
            .ok_or_else(|| {
                let index = session
                    .parts()
                    .iter()
                    .find(|part| part.digest().is_none())
                    .map_or(0, PartDescriptor::index);
                PartsOutcome::Failed {
                    index,
                    source: PartError::Io {
                        index,
                        source: io::Error::other("part was not uploaded"),
                    },
                }
            })
    }

    async fn upload_part(
        &self,
        vault: &str,
        upload_id: &str,
        path: &Path,
        part: &PartDescriptor,
    ) -> (usize, Result<Hash256, PartError>) {
        (part.index(), self.send_part(vault, upload_id, path, part).await)
    }

    async fn send_part(
        &self,
        vault: &str,
        upload_id: &str,
        path: &Path,
        part: &PartDescriptor,
    ) -> Result<Hash256, PartError> {
        let index = part.index();
        let range = part.range_header();

        // read once, retries resend the same bytes
        let payload = read_part(path, part.range_start(), part.size())
            .await
            .map_err(|source| PartError::Io { index, source })?;

        let mut attempt: u32 = 0;
        loop {
            self.emit(UploadEvent::PartStarted {
                index,
                range: range.clone(),
            });

            let upload = PartUpload {
                range: range.clone(),
                body: payload.body.clone(),
                tree_hash: payload.tree_hash,
                sha256: payload.sha256.clone(),
            };

            match self.transport.upload_part(vault, upload_id, upload).await {
                Ok(()) => {
                    self.emit(UploadEvent::PartUploaded {
                        index,
                        size: part.size(),
                        digest: payload.tree_hash,
                    });
                    return Ok(payload.tree_hash);
                }
                Err(e) => {
                    let error = PartError::from(e);
                    if !self.retry.should_retry(attempt, &error) {
                        return Err(error);
                    }

                    attempt += 1;
                    let delay = self.retry.delay(attempt);
                    self.emit(UploadEvent::PartRetrying {
                        index,
                        attempt,
                        delay,
                        error: error.to_string(),
                    });
                    sleep(delay).await;
                }
            }
        }
    }

    async fn abort(
        &self,
        vault: &str,
        upload_id: String,
        session: &mut UploadSession,
        outcome: PartsOutcome,
    ) -> UploadError {
        if let Err(e) = self.transition(session, UploadState::Aborting) {
            return e.into();
        }

        let abort_error = match self.abort_upload(vault, &upload_id).await {
            Ok(()) => None,
            Err(e) => {
                self.emit(UploadEvent::AbortFailed {
                    upload_id: upload_id.clone(),
                    error: e.to_string(),
                });
                Some(e)
            }
        };

        if let Err(e) = self.transition(session, UploadState::Aborted) {
            return e.into();
        }

        match outcome {
            PartsOutcome::Failed { index, source } => UploadError::PartFailed {
                index,
                upload_id,
                source,
                abort_error,
            },
            PartsOutcome::Interrupted => UploadError::Interrupted {
                upload_id,
                abort_error,
            },
        }
    }

    fn finish(
        &self,
        request: &UploadRequest,
        report: UploadReport,
    ) -> Result<UploadReport, UploadError> {
        self.emit(UploadEvent::Completed {
            archive_id: report.archive.archive_id.clone(),
            checksum: report.checksum.to_hex(),
            size: report.size,
        });

        let Some(ledger) = &self.ledger else {
            return Ok(report);
        };

        let record = ArchiveRecord::new(
            &request.vault,
            &request.description,
            &request.archive_path,
            report.size,
            &report.archive,
            report.upload_id.as_deref(),
        );

        match ledger.append(record) {
            Ok(()) => {
                self.emit(UploadEvent::LedgerRecorded {
                    archive_id: report.archive.archive_id.clone(),
                });
                Ok(report)
            }
            Err(source) => {
                self.emit(UploadEvent::LedgerFailed {
                    archive_id: report.archive.archive_id.clone(),
                    error: source.to_string(),
                });
                Err(UploadError::Ledger {
                    report: Box::new(report),
                    source,
                })
            }
        }
    }

    // None when the token is cancelled first, `future` is dropped
    async fn unless_cancelled<F: Future>(&self, future: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => None,
            output = future => Some(output),
        }
    }

    fn cancel_session(&self, session: &mut UploadSession, error: UploadError) -> UploadError {
        match self.transition(session, UploadState::Cancelled) {
            Ok(()) => error,
            Err(e) => e.into(),
        }
    }

    fn transition(
        &self,
        session: &mut UploadSession,
        next: UploadState,
    ) -> Result<(), StateError> {
        let from = session.transition(next)?;
        self.emit(UploadEvent::StateChanged { from, to: next });
        Ok(())
    }

    fn emit(&self, event: UploadEvent) {
        self.observer.on_event(&event);
    }
}

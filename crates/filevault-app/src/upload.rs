//! Batch upload coordination.

use std::sync::Arc;
use std::time::Duration;

use filevault_api_client::{ApiClient, UploadFile};
use filevault_core::constants::DEFAULT_UPLOAD_SUCCESS_MS;
use filevault_core::{ErrorMetadata, UploadReceipt, VaultError, VaultResult};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::listing::{ListingAggregator, RefreshError, RefreshOutcome};

/// Upload indicator shown next to the drop zone.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadStatus {
    Idle,
    Uploading { file_count: usize },
    /// Cleared automatically after the success window.
    Succeeded(UploadReceipt),
    /// Message shown verbatim until the next upload.
    Failed(String),
}

/// Result of a successful upload and the refresh it triggered.
#[derive(Debug)]
pub struct UploadOutcome {
    pub receipt: UploadReceipt,
    pub refresh: Result<RefreshOutcome, RefreshError>,
}

#[derive(Debug)]
struct StatusSlot {
    epoch: u64,
    status: UploadStatus,
    since: Instant,
}

#[derive(Debug, Clone)]
pub struct UploadCoordinator {
    client: ApiClient,
    listing: ListingAggregator,
    slot: Arc<Mutex<StatusSlot>>,
    success_window: Duration,
}

impl UploadCoordinator {
    pub fn new(client: ApiClient, listing: ListingAggregator) -> Self {
        Self::with_success_window(
            client,
            listing,
            Duration::from_millis(DEFAULT_UPLOAD_SUCCESS_MS),
        )
    }

    pub fn with_success_window(
        client: ApiClient,
        listing: ListingAggregator,
        success_window: Duration,
    ) -> Self {
        let slot = StatusSlot {
            epoch: client.session().epoch(),
            status: UploadStatus::Idle,
            since: Instant::now(),
        };
        Self {
            client,
            listing,
            slot: Arc::new(Mutex::new(slot)),
            success_window,
        }
    }

    pub async fn status(&self) -> UploadStatus {
        let slot = self.slot.lock().await;
        if slot.epoch != self.client.session().epoch() {
            return UploadStatus::Idle;
        }
        match &slot.status {
            UploadStatus::Succeeded(_) if slot.since.elapsed() >= self.success_window => {
                UploadStatus::Idle
            }
            status => status.clone(),
        }
    }

    pub async fn reset(&self) {
        self.set_status(self.client.session().epoch(), UploadStatus::Idle)
            .await;
    }

    /// Upload every file in one request, then refresh the listing and stats.
    ///
    /// An empty selection or a missing credential fails before any request is made.
    pub async fn upload(&self, files: Vec<UploadFile>) -> VaultResult<UploadOutcome> {
        if files.is_empty() {
            return Err(VaultError::InvalidInput("No files selected".to_string()));
        }
        let session = self.client.session().snapshot();
        if session.credential.is_none() {
            self.set_status(
                session.epoch,
                UploadStatus::Failed(VaultError::AuthRequired.client_message()),
            )
            .await;
            return Err(VaultError::AuthRequired);
        }

        let file_count = files.len();
        let total_bytes: u64 = files.iter().map(UploadFile::size).sum();
        tracing::info!(file_count, total_bytes, "Starting upload");
        self.set_status(session.epoch, UploadStatus::Uploading { file_count })
            .await;

        match self.client.upload_files(&files).await {
            Ok(receipt) => {
                tracing::info!(
                    file_count = receipt.files.len(),
                    message = %receipt.message,
                    "Upload accepted"
                );
                self.set_status(session.epoch, UploadStatus::Succeeded(receipt.clone()))
                    .await;
                let refresh = self.listing.refresh_current().await;
                Ok(UploadOutcome { receipt, refresh })
            }
            Err(e) => {
                tracing::warn!(file_count, error = %e, "Upload failed");
                self.set_status(session.epoch, UploadStatus::Failed(e.client_message()))
                    .await;
                Err(e)
            }
        }
    }

    /// Status belongs to the session of `epoch` and is hidden once it ends.
    async fn set_status(&self, epoch: u64, status: UploadStatus) {
        let mut slot = self.slot.lock().await;
        slot.epoch = epoch;
        slot.status = status;
        slot.since = Instant::now();
    }
}

//! Listing & stats aggregation.
//!
//! A refresh fetches the file listing and the storage stats concurrently and
//! applies both or neither. Every refresh takes a ticket from a [`RefreshLedger`];
//! a response is applied only if its ticket is still the latest issued and the
//! session has not changed identity since the refresh started.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use filevault_api_client::ApiClient;
use filevault_core::{
    FileRecord, FilterState, Pagination, QuotaUsage, StorageStats, VaultError,
};
use tokio::sync::RwLock;

/// Monotonic refresh tickets.
#[derive(Debug, Default)]
pub struct RefreshLedger {
    latest: AtomicU64,
}

impl RefreshLedger {
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_latest(&self, seq: u64) -> bool {
        self.latest() == seq
    }
}

/// One consistent listing + stats pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingSnapshot {
    pub seq: u64,
    pub files: Vec<FileRecord>,
    pub stats: StorageStats,
    pub quota: QuotaUsage,
    pub refreshed_at: DateTime<Utc>,
}

/// Failure of one refresh. At least one side is set.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", combined_message(.listing, .stats))]
pub struct RefreshError {
    pub listing: Option<VaultError>,
    pub stats: Option<VaultError>,
}

impl RefreshError {
    fn auth_required() -> Self {
        Self {
            listing: Some(VaultError::AuthRequired),
            stats: Some(VaultError::AuthRequired),
        }
    }

    /// The errors of both sides, listing first.
    pub fn errors(&self) -> impl Iterator<Item = &VaultError> {
        self.listing.iter().chain(self.stats.iter())
    }

    pub fn is_unauthorized(&self) -> bool {
        self.errors().any(|e| e.is_unauthorized())
    }

    pub fn message(&self) -> String {
        combined_message(&self.listing, &self.stats)
    }
}

/// Identical messages are shown once.
fn combined_message(listing: &Option<VaultError>, stats: &Option<VaultError>) -> String {
    match (listing, stats) {
        (Some(l), Some(s)) if l == s => l.to_string(),
        (Some(l), Some(s)) => format!("Files: {}; Storage stats: {}", l, s),
        (Some(l), None) => format!("Files: {}", l),
        (None, Some(s)) => format!("Storage stats: {}", s),
        (None, None) => "Refresh failed".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Applied(ListingSnapshot),
    /// A newer refresh was issued while this one was in flight.
    Superseded,
    /// The session ended or changed identity while this one was in flight.
    SessionChanged,
}

/// What the presentation layer renders.
///
/// `snapshot` is only ever replaced by a complete refresh. `error` is the
/// failure of the most recent refresh and is cleared by the next success.
/// `filter` and `pagination` are the applied selection; they change when a
/// refresh is issued, whatever its outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingView {
    pub snapshot: Option<ListingSnapshot>,
    pub error: Option<RefreshError>,
    pub filter: FilterState,
    pub pagination: Pagination,
}

impl ListingView {
    /// Files to render. None until a refresh has succeeded.
    pub fn files(&self) -> Option<&[FileRecord]> {
        self.snapshot.as_ref().map(|s| s.files.as_slice())
    }
}

#[derive(Debug, Default)]
struct ViewState {
    epoch: u64,
    view: ListingView,
}

#[derive(Debug, Clone)]
pub struct ListingAggregator {
    client: ApiClient,
    ledger: Arc<RefreshLedger>,
    state: Arc<RwLock<ViewState>>,
}

impl ListingAggregator {
    pub fn new(client: ApiClient) -> Self {
        Self::with_pagination(client, Pagination::default())
    }

    pub fn with_pagination(client: ApiClient, pagination: Pagination) -> Self {
        let state = ViewState {
            epoch: client.session().epoch(),
            view: ListingView {
                pagination,
                ..ListingView::default()
            },
        };
        Self {
            client,
            ledger: Arc::new(RefreshLedger::default()),
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Current view. State belonging to an earlier session is never returned.
    pub async fn view(&self) -> ListingView {
        let state = self.state.read().await;
        if state.epoch == self.client.session().epoch() {
            state.view.clone()
        } else {
            ListingView {
                pagination: state.view.pagination,
                ..ListingView::default()
            }
        }
    }

    /// Drop everything shown. In-flight refreshes are invalidated.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        self.ledger.issue();
        state.epoch = self.client.session().epoch();
        state.view = ListingView {
            pagination: state.view.pagination,
            ..ListingView::default()
        };
    }

    /// Refresh with the filter and page currently applied.
    pub async fn refresh_current(&self) -> Result<RefreshOutcome, RefreshError> {
        self.run(None, None).await
    }

    /// Apply `filter` on the current page and refresh.
    pub async fn apply_filter(&self, filter: FilterState) -> Result<RefreshOutcome, RefreshError> {
        self.run(Some(filter), None).await
    }

    /// Apply `filter` and `pagination`, then fetch listing and stats for them.
    ///
    /// The selection stays applied even if this refresh fails or is superseded,
    /// so later refreshes keep using it.
    pub async fn refresh(
        &self,
        filter: FilterState,
        pagination: Pagination,
    ) -> Result<RefreshOutcome, RefreshError> {
        self.run(Some(filter), Some(pagination)).await
    }

    #[tracing::instrument(skip(self, filter), fields(seq = tracing::field::Empty))]
    async fn run(
        &self,
        filter: Option<FilterState>,
        pagination: Option<Pagination>,
    ) -> Result<RefreshOutcome, RefreshError> {
        let session = self.client.session().snapshot();
        if session.credential.is_none() {
            return Err(RefreshError::auth_required());
        }

        // Selecting the filter and issuing the ticket happen under one lock, so
        // the latest ticket always carries the latest applied filter.
        let (seq, filter, pagination) = {
            let mut state = self.state.write().await;
            if state.epoch != session.epoch {
                state.epoch = session.epoch;
                state.view = ListingView {
                    pagination: state.view.pagination,
                    ..ListingView::default()
                };
            }
            if let Some(filter) = filter {
                state.view.filter = filter;
            }
            if let Some(pagination) = pagination {
                state.view.pagination = pagination;
            }
            let seq = self.ledger.issue();
            (seq, state.view.filter.clone(), state.view.pagination)
        };
        tracing::Span::current().record("seq", seq);

        let (files, stats) = tokio::join!(
            self.client.list_files(&filter, pagination),
            self.client.storage_stats()
        );

        let mut state = self.state.write().await;
        if !self.ledger.is_latest(seq) {
            tracing::debug!(seq, latest = self.ledger.latest(), "Discarding superseded refresh");
            return Ok(RefreshOutcome::Superseded);
        }
        if self.client.session().epoch() != session.epoch || state.epoch != session.epoch {
            let rejected = !self.client.session().is_authenticated()
                && (matches!(&files, Err(e) if e.is_unauthorized())
                    || matches!(&stats, Err(e) if e.is_unauthorized()));
            if rejected {
                return Err(RefreshError {
                    listing: files.err(),
                    stats: stats.err(),
                });
            }
            tracing::debug!(seq, "Discarding refresh from a previous session");
            return Ok(RefreshOutcome::SessionChanged);
        }

        match (files, stats) {
            (Ok(files), Ok(stats)) => {
                if !stats.is_consistent() {
                    tracing::warn!(?stats, "Storage stats savings do not add up");
                }
                let snapshot = ListingSnapshot {
                    seq,
                    quota: stats.quota_usage(),
                    files,
                    stats,
                    refreshed_at: Utc::now(),
                };
                tracing::info!(seq, file_count = snapshot.files.len(), "Listing refreshed");
                state.view.snapshot = Some(snapshot.clone());
                state.view.error = None;
                Ok(RefreshOutcome::Applied(snapshot))
            }
            (files, stats) => {
                let error = RefreshError {
                    listing: files.err(),
                    stats: stats.err(),
                };
                tracing::warn!(seq, error = %error, "Refresh failed");
                state.view.error = Some(error.clone());
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filevault_api_client::{Credential, Session};
    use mockito::{Matcher, Mock};

    #[test]
    fn only_latest_ticket_is_accepted() {
        let ledger = RefreshLedger::default();
        let first = ledger.issue();
        let second = ledger.issue();
        assert!(second > first);
        assert!(!ledger.is_latest(first));
        assert!(ledger.is_latest(second));
    }

    #[test]
    fn combined_message() {
        let err = RefreshError {
            listing: None,
            stats: Some(VaultError::Server {
                status: 500,
                message: "Failed to retrieve storage stats".to_string(),
            }),
        };
        assert_eq!(err.to_string(), "Storage stats: Failed to retrieve storage stats");

        let transport = VaultError::Transport("down".to_string());
        let both = RefreshError {
            listing: Some(transport.clone()),
            stats: Some(transport),
        };
        assert_eq!(both.message(), "down");
        assert_eq!(both.errors().count(), 2);
    }

    #[tokio::test]
    async fn refresh_without_credential_sends_nothing() {
        let client = ApiClient::new("http://127.0.0.1:9", Session::in_memory())
            .unwrap();
        let aggregator = ListingAggregator::new(client);
        let err = aggregator
            .refresh(FilterState::default(), Pagination::default())
            .await
            .unwrap_err();
        assert_eq!(err.listing, Some(VaultError::AuthRequired));
        assert!(aggregator.view().await.files().is_none());
    }

    async fn signed_in(server: &mockito::ServerGuard) -> ListingAggregator {
        let session = Session::in_memory();
        session.set_credential(Credential::new("t1")).await.unwrap();
        let client = ApiClient::new(format!("{}/api/v1", server.url()), session).unwrap();
        ListingAggregator::new(client)
    }

    async fn mock_listing(server: &mut mockito::ServerGuard, query: Matcher, id: u64) -> Mock {
        let body = serde_json::json!({"success": true, "message": "ok", "data": {"files": [{
            "id": id,
            "original_filename": format!("{}.txt", id),
            "created_at": "2024-05-01T10:00:00Z",
            "content": {"file_size": 10, "mime_type": "text/plain"}
        }]}});
        server
            .mock("GET", "/api/v1/files")
            .match_query(query)
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await
    }

    async fn mock_stats(server: &mut mockito::ServerGuard) -> Mock {
        let body = serde_json::json!({"success": true, "message": "ok", "data": {
            "total_storage_used": 10,
            "original_storage_usage": 10,
            "storage_savings_bytes": 0,
            "storage_savings_percentage": 0.0,
            "user_quota": 100
        }});
        server
            .mock("GET", "/api/v1/storage/stats")
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await
    }

    fn named(filename: &str) -> FilterState {
        FilterState {
            filename: Some(filename.to_string()),
            ..FilterState::default()
        }
    }

    #[tokio::test]
    async fn overlapping_refresh_applies_only_the_latest() {
        let mut server = mockito::Server::new_async().await;
        let _older = mock_listing(
            &mut server,
            Matcher::UrlEncoded("filename".into(), "older".into()),
            1,
        )
        .await;
        let _newer = mock_listing(
            &mut server,
            Matcher::UrlEncoded("filename".into(), "newer".into()),
            2,
        )
        .await;
        let _stats = mock_stats(&mut server).await;
        let aggregator = signed_in(&server).await;

        let (older, newer) = tokio::join!(
            aggregator.refresh(named("older"), Pagination::default()),
            aggregator.refresh(named("newer"), Pagination::default()),
        );

        assert_eq!(older.unwrap(), RefreshOutcome::Superseded);
        let RefreshOutcome::Applied(snapshot) = newer.unwrap() else {
            panic!("latest refresh was not applied");
        };
        let view = aggregator.view().await;
        assert_eq!(view.snapshot, Some(snapshot));
        assert_eq!(view.filter, named("newer"));
        assert_eq!(view.files().map(|f| f[0].id), Some(2));
    }

    #[tokio::test]
    async fn refresh_spanning_a_session_change_is_discarded() {
        let mut server = mockito::Server::new_async().await;
        let _files = mock_listing(&mut server, Matcher::Any, 1).await;
        let _stats = mock_stats(&mut server).await;
        let aggregator = signed_in(&server).await;
        let session = aggregator.client.session();

        let (outcome, switched) = tokio::join!(
            aggregator.refresh_current(),
            session.set_credential(Credential::new("t2")),
        );

        switched.unwrap();
        assert_eq!(outcome.unwrap(), RefreshOutcome::SessionChanged);
        let view = aggregator.view().await;
        assert!(view.snapshot.is_none());
        assert!(view.error.is_none());
    }
}

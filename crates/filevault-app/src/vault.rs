//! Application facade owning the session state machine.
//!
//! `Unauthenticated -> login/register -> Authenticated -> logout | 401 -> Unauthenticated`.
//! Uploads, filtering and refreshes are only reachable while authenticated; all
//! per-user state is dropped when the session ends.

use std::sync::Arc;

use bytes::Bytes;
use filevault_api_client::{
    ApiClient, Credential, FileCredentialStore, Session, SessionEndReason, SessionState,
    UploadFile,
};
use filevault_core::{
    AdminFileListing, AuditLog, ClientConfig, ErrorMetadata, Pagination, SystemStats,
    UserProfile, VaultError, VaultResult,
};

use crate::filter::FilterForm;
use crate::listing::{ListingAggregator, ListingView, RefreshError, RefreshOutcome};
use crate::notify::Notifier;
use crate::upload::{UploadCoordinator, UploadOutcome, UploadStatus};

#[derive(Debug, Clone)]
pub struct Vault {
    client: ApiClient,
    listing: ListingAggregator,
    uploads: UploadCoordinator,
    notifier: Notifier,
}

impl Vault {
    /// Open the vault with the credential persisted at `config.credentials_path`.
    pub async fn open(config: &ClientConfig) -> VaultResult<Self> {
        let store = Arc::new(FileCredentialStore::new(&config.credentials_path));
        let session = Session::restore(store).await?;
        Self::with_session(config, session)
    }

    pub fn with_session(config: &ClientConfig, session: Session) -> VaultResult<Self> {
        let client = ApiClient::from_config(config, session)?;
        let listing = ListingAggregator::with_pagination(
            client.clone(),
            Pagination::new(1, config.page_limit),
        );
        let uploads = UploadCoordinator::with_success_window(
            client.clone(),
            listing.clone(),
            config.upload_success_window(),
        );
        Ok(Self {
            client,
            listing,
            uploads,
            notifier: Notifier::from_config(config),
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn session(&self) -> &Session {
        self.client.session()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn state(&self) -> SessionState {
        self.session().snapshot().state()
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.session().profile()
    }

    pub async fn listing(&self) -> ListingView {
        self.listing.view().await
    }

    pub async fn upload_status(&self) -> UploadStatus {
        self.uploads.status().await
    }

    /// Validate a persisted credential and run the initial refresh.
    pub async fn start(&self) -> VaultResult<SessionState> {
        let state = self.validate_session().await?;
        if state == SessionState::Authenticated {
            self.refresh_and_report().await;
        }
        Ok(self.state())
    }

    /// Check the persisted credential against `GET /profile`.
    ///
    /// Any failure of the profile check drops the credential.
    pub async fn validate_session(&self) -> VaultResult<SessionState> {
        let snapshot = self.session().snapshot();
        if snapshot.credential.is_none() {
            return Ok(SessionState::Unauthenticated);
        }

        match self.client.profile().await {
            Ok(profile) => {
                self.session().set_profile(snapshot.epoch, profile);
            }
            Err(e) => {
                tracing::info!(error = %e, "Persisted credential rejected");
                if self.session().epoch() == snapshot.epoch {
                    self.session().clear(SessionEndReason::Invalid).await?;
                }
            }
        }
        Ok(self.state())
    }

    pub async fn login(&self, email: &str, password: &str) -> VaultResult<UserProfile> {
        let auth = self.client.login(email, password).await?;
        self.begin(auth.token, auth.user).await
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> VaultResult<UserProfile> {
        let auth = self.client.register(username, email, password).await?;
        self.begin(auth.token, auth.user).await
    }

    async fn begin(&self, token: String, user: UserProfile) -> VaultResult<UserProfile> {
        self.session()
            .authenticate(Credential::new(token), user.clone())
            .await?;
        self.listing.reset().await;
        self.uploads.reset().await;
        self.refresh_and_report().await;
        Ok(user)
    }

    pub async fn logout(&self) -> VaultResult<()> {
        self.session().clear(SessionEndReason::Logout).await?;
        self.listing.reset().await;
        self.uploads.reset().await;
        self.notifier.dismiss().await;
        Ok(())
    }

    /// Refresh with the currently applied filter.
    pub async fn refresh(&self) -> Result<RefreshOutcome, RefreshError> {
        self.listing.refresh_current().await
    }

    /// Parse the form, apply it and refresh. On a parse error nothing is sent
    /// and the applied filter stays as it was. A failed refresh still leaves the
    /// new filter applied.
    pub async fn apply_filters(
        &self,
        form: &FilterForm,
        pagination: Option<Pagination>,
    ) -> Result<RefreshOutcome, RefreshError> {
        let filter = form.apply().map_err(|e| RefreshError {
            listing: Some(e),
            stats: None,
        })?;
        match pagination {
            Some(pagination) => self.listing.refresh(filter, pagination).await,
            None => self.listing.apply_filter(filter).await,
        }
    }

    pub async fn upload(&self, files: Vec<UploadFile>) -> VaultResult<UploadOutcome> {
        match self.uploads.upload(files).await {
            Ok(outcome) => {
                self.notifier.success(outcome.receipt.message.clone()).await;
                if let Err(e) = &outcome.refresh {
                    self.notifier.error(e.message()).await;
                }
                Ok(outcome)
            }
            Err(e) => {
                self.notifier.error(e.client_message()).await;
                Err(e)
            }
        }
    }

    pub async fn delete(&self, id: u64) -> VaultResult<()> {
        self.require_auth()?;
        match self.client.delete_file(id).await {
            Ok(()) => {
                self.notifier.success("File deleted successfully.").await;
                self.refresh_and_report().await;
                Ok(())
            }
            Err(e) => {
                self.notifier
                    .error(format!("Error: {}", e.client_message()))
                    .await;
                Err(e)
            }
        }
    }

    pub async fn download(&self, id: u64) -> VaultResult<Bytes> {
        self.require_auth()?;
        match self.client.download_file(id).await {
            Ok(bytes) => {
                self.notifier
                    .success(format!("Downloaded {} bytes", bytes.len()))
                    .await;
                Ok(bytes)
            }
            Err(e) => {
                self.notifier
                    .error(format!("Error: {}", e.client_message()))
                    .await;
                Err(e)
            }
        }
    }

    /// Shareable download link carrying the credential as a query parameter.
    pub fn download_link(&self, id: u64) -> VaultResult<String> {
        self.client.download_url(id, true)
    }

    pub async fn admin_files(&self, pagination: Pagination) -> VaultResult<AdminFileListing> {
        self.require_auth()?;
        self.client.admin_files(pagination).await
    }

    pub async fn admin_stats(&self) -> VaultResult<SystemStats> {
        self.require_auth()?;
        self.client.admin_stats().await
    }

    pub async fn admin_users(&self) -> VaultResult<Vec<UserProfile>> {
        self.require_auth()?;
        self.client.admin_users().await
    }

    pub async fn admin_audit_logs(&self) -> VaultResult<Vec<AuditLog>> {
        self.require_auth()?;
        self.client.admin_audit_logs().await
    }

    fn require_auth(&self) -> VaultResult<()> {
        if self.session().is_authenticated() {
            Ok(())
        } else {
            Err(VaultError::AuthRequired)
        }
    }

    async fn refresh_and_report(&self) {
        if let Err(e) = self.listing.refresh_current().await {
            self.notifier.error(e.message()).await;
        }
    }
}

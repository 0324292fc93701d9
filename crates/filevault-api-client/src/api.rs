//! Typed endpoint methods on top of [`ApiClient`].
//!
//! Paths are relative to the configured base URL (`.../api/v1`).

use bytes::Bytes;
use filevault_core::constants::DOWNLOAD_TOKEN_PARAM;
use filevault_core::models::{
    AdminFileListing, AuditLog, AuthResponse, FileListData, FileRecord, FilterState,
    LoginRequest, Pagination, RegisterRequest, StorageStats, SystemStats, UploadReceipt,
    UploadedFile, UserProfile,
};
use filevault_core::{build_query, VaultError, VaultResult};
use reqwest::Method;

use crate::{ApiClient, UploadFile};

impl ApiClient {
    /// Exchange email and password for a credential. Does not touch the session.
    pub async fn login(&self, email: &str, password: &str) -> VaultResult<AuthResponse> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post_json("/auth/login", &body).await
    }

    /// Create an account. The response carries a credential like `login`.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> VaultResult<AuthResponse> {
        let body = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post_json("/auth/register", &body).await
    }

    pub async fn profile(&self) -> VaultResult<UserProfile> {
        self.get("/profile", &[]).await
    }

    /// List the caller's files matching `filter`, newest first.
    pub async fn list_files(
        &self,
        filter: &FilterState,
        pagination: Pagination,
    ) -> VaultResult<Vec<FileRecord>> {
        let query = build_query(filter, pagination);
        let data: FileListData<FileRecord> = self.get("/files", query.as_slice()).await?;
        Ok(data.files)
    }

    pub async fn storage_stats(&self) -> VaultResult<StorageStats> {
        self.get("/storage/stats", &[]).await
    }

    /// Send all files in one multipart request.
    ///
    /// An empty batch is rejected locally without contacting the backend.
    pub async fn upload_files(&self, files: &[UploadFile]) -> VaultResult<UploadReceipt> {
        if files.is_empty() {
            return Err(VaultError::InvalidInput("No files selected".to_string()));
        }
        tracing::info!(count = files.len(), "Uploading files");
        let envelope = self
            .post_multipart::<FileListData<UploadedFile>>("/files/upload", files.to_vec())
            .await?;
        let files = envelope.data.map(|d| d.files).unwrap_or_default();
        Ok(UploadReceipt {
            message: envelope.message,
            files,
        })
    }

    /// Delete one of the caller's files. 200 and 204 both count as success.
    pub async fn delete_file(&self, id: u64) -> VaultResult<()> {
        self.delete(&format!("/files/{}", id)).await
    }

    /// Absolute download URL. With `with_token`, the current credential is
    /// appended as a query parameter so the link works outside this client.
    pub fn download_url(&self, id: u64, with_token: bool) -> VaultResult<String> {
        let url = self.build_url(&format!("/files/{}/download", id));
        if !with_token {
            return Ok(url);
        }
        let credential = self.session().credential().ok_or(VaultError::AuthRequired)?;
        Ok(format!(
            "{}?{}={}",
            url,
            DOWNLOAD_TOKEN_PARAM,
            urlencoding::encode(credential.expose())
        ))
    }

    pub async fn download_file(&self, id: u64) -> VaultResult<Bytes> {
        self.request_bytes(Method::GET, &format!("/files/{}/download", id))
            .await
    }

    pub async fn admin_files(&self, pagination: Pagination) -> VaultResult<AdminFileListing> {
        let query = [
            ("page", pagination.page.to_string()),
            ("limit", pagination.limit.to_string()),
        ];
        self.get("/admin/files", &query).await
    }

    pub async fn admin_stats(&self) -> VaultResult<SystemStats> {
        self.get("/admin/stats", &[]).await
    }

    pub async fn admin_users(&self) -> VaultResult<Vec<UserProfile>> {
        self.get("/admin/users", &[]).await
    }

    pub async fn admin_audit_logs(&self) -> VaultResult<Vec<AuditLog>> {
        self.get("/admin/audit-logs", &[]).await
    }
}

//! HTTP gateway for the file vault backend.
//!
//! Every backend call goes through [`ApiClient`]: it injects the bearer credential,
//! normalizes failures into [`VaultError`] variants and tears the session down on 401.
//! Nothing else touches headers or raw status codes. Typed endpoint methods live in
//! [`api`].

pub mod api;
pub mod session;
pub mod upload;

use std::time::Duration;

use bytes::Bytes;
use filevault_core::constants::{
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TRANSPORT_RETRIES, UNKNOWN_ERROR_MESSAGE,
    UNREACHABLE_MESSAGE,
};
use filevault_core::models::ApiEnvelope;
use filevault_core::{ClientConfig, VaultError, VaultResult};
use reqwest::{header, Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;

pub use session::{
    Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore, Session,
    SessionEndReason, SessionSnapshot, SessionState,
};
pub use upload::UploadFile;

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Request payload.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    /// Raw file payload. Content type (and boundary) is left to the transport.
    Multipart(Vec<UploadFile>),
}

/// HTTP client bound to one backend and one session.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Session,
    transport_retries: u32,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Session) -> VaultResult<Self> {
        Self::build(
            base_url.into(),
            session,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            DEFAULT_TRANSPORT_RETRIES,
        )
    }

    pub fn from_config(config: &ClientConfig, session: Session) -> VaultResult<Self> {
        Self::build(
            config.api_base_url.clone(),
            session,
            config.request_timeout(),
            config.transport_retries,
        )
    }

    fn build(
        base_url: String,
        session: Session,
        timeout: Duration,
        transport_retries: u32,
    ) -> VaultResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VaultError::InvalidInput(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            transport_retries,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Issue a request and return the parsed JSON body (`Null` for 204 or an empty body).
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: RequestBody,
    ) -> VaultResult<serde_json::Value> {
        let response = self.send(method, path, query, &body).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(serde_json::Value::Null);
        }
        let text = response
            .text()
            .await
            .map_err(|e| VaultError::Decode(format!("Failed to read response body: {}", e)))?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&text).map_err(VaultError::from)
    }

    /// Issue a request and return the raw response bytes.
    pub async fn request_bytes(&self, method: Method, path: &str) -> VaultResult<Bytes> {
        let response = self.send(method, path, &[], &RequestBody::Empty).await?;
        response
            .bytes()
            .await
            .map_err(|e| VaultError::Decode(format!("Failed to read response body: {}", e)))
    }

    /// GET and unwrap the envelope's `data`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> VaultResult<T> {
        let value = self.request(Method::GET, path, query, RequestBody::Empty).await?;
        ApiEnvelope::<T>::from_value(value)?.into_data()
    }

    /// POST a JSON body and unwrap the envelope's `data`.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> VaultResult<T> {
        let body = serde_json::to_value(body)?;
        let value = self
            .request(Method::POST, path, &[], RequestBody::Json(body))
            .await?;
        ApiEnvelope::<T>::from_value(value)?.into_data()
    }

    /// POST a multipart payload and return the whole envelope.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        files: Vec<UploadFile>,
    ) -> VaultResult<ApiEnvelope<T>> {
        let value = self
            .request(Method::POST, path, &[], RequestBody::Multipart(files))
            .await?;
        ApiEnvelope::from_value(value)
    }

    /// DELETE. Success with or without a body.
    pub async fn delete(&self, path: &str) -> VaultResult<()> {
        self.request(Method::DELETE, path, &[], RequestBody::Empty)
            .await
            .map(|_| ())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: &RequestBody,
    ) -> VaultResult<Response> {
        let snapshot = self.session.snapshot();
        let url = self.build_url(path);
        let max_attempts = if is_idempotent(&method) {
            1 + self.transport_retries
        } else {
            1
        };

        let mut attempt = 0;
        let response = loop {
            attempt += 1;
            let mut request = self.client.request(method.clone(), &url);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(credential) = &snapshot.credential {
                request = request.bearer_auth(credential.expose());
            }
            request = match body {
                RequestBody::Empty => request.header(header::CONTENT_TYPE, "application/json"),
                RequestBody::Json(value) => request.json(value),
                RequestBody::Multipart(files) => request.multipart(upload::build_form(files)?),
            };

            tracing::debug!(%method, path, attempt, "Sending request");
            match request.send().await {
                Ok(response) => break response,
                Err(e) if attempt < max_attempts && (e.is_connect() || e.is_timeout()) => {
                    tracing::warn!(%method, path, attempt, error = %e, "Transport failure, retrying");
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
                Err(e) => {
                    tracing::warn!(%method, path, attempt, error = %e, "Backend unreachable");
                    return Err(VaultError::Transport(UNREACHABLE_MESSAGE.to_string()));
                }
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error = error_from_response(response).await;
        if status == StatusCode::UNAUTHORIZED {
            match self.session.expire_if_current(snapshot.epoch).await {
                Ok(true) => {}
                Ok(false) => tracing::debug!(path, "Ignoring 401 for a superseded session"),
                Err(e) => tracing::error!(error = %e, "Failed to remove persisted credential"),
            }
        }
        tracing::debug!(%method, path, status = status.as_u16(), error = %error, "Request failed");
        Err(error)
    }
}

fn is_idempotent(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::DELETE)
}

/// Map a non-success response to a `VaultError`, preferring the body's `error` field.
async fn error_from_response(response: Response) -> VaultError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value) => value
            .get("error")
            .and_then(|e| e.as_str())
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed with status {}", status)),
        Err(_) => UNKNOWN_ERROR_MESSAGE.to_string(),
    };
    VaultError::from_status(status, message)
}

//! Shared constants for the file vault client.

/// Default versioned base address of the backend REST API.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";

/// Key under which the bearer credential is persisted.
pub const CREDENTIAL_KEY: &str = "token";

/// Multipart field name carrying uploaded files.
pub const UPLOAD_FIELD: &str = "files";

/// Query parameter used to pass the credential on plain download links.
pub const DOWNLOAD_TOKEN_PARAM: &str = "token";

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_LIMIT: u32 = 100;
/// Upper bound the backend accepts for `limit`.
pub const MAX_PAGE_LIMIT: u32 = 100;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_TRANSPORT_RETRIES: u32 = 1;
pub const DEFAULT_NOTIFICATION_TTL_MS: u64 = 4000;
pub const DEFAULT_UPLOAD_SUCCESS_MS: u64 = 5000;

/// Tolerance (in percentage points) when checking a reported savings percentage.
pub const SAVINGS_PERCENTAGE_TOLERANCE: f64 = 0.01;

/// Message used when the backend cannot be reached at all.
pub const UNREACHABLE_MESSAGE: &str = "Cannot connect to server. Is the backend running?";

/// Message used when a failed response carries no parseable JSON body.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

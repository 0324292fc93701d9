//! File Vault Core Library
//!
//! This crate provides the domain models, error types, configuration and query
//! building that are shared by the API client, the application layer and the CLI.

pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod models;
pub mod query;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{ErrorMetadata, LogLevel, VaultError, VaultResult};
pub use format::format_bytes;
pub use models::{
    AdminFileListing, AuditLog, FileRecord, FilterState, Pagination, QuotaUsage, StorageStats,
    SystemStats, UploadReceipt, UploadedFile, UserProfile,
};
pub use query::{build_query, QueryParams};

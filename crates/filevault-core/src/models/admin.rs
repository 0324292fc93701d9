//! Admin-only views: all files, system totals, users and the audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{savings_percentage, FileRecord, UserProfile};

/// `data` of `GET /admin/files`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminFileListing {
    #[serde(default)]
    pub files: Vec<FileRecord>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

/// System-wide deduplication totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    pub total_users: i64,
    pub total_files: i64,
    pub total_storage_used: i64,
    pub original_total_size: i64,
    pub deduplication_saved: i64,
    pub savings_percentage: f64,
}

impl SystemStats {
    /// Same savings invariant as per-user statistics.
    pub fn is_consistent(&self) -> bool {
        let expected = self.original_total_size - self.total_storage_used;
        self.deduplication_saved == expected
            && (self.savings_percentage - savings_percentage(expected, self.original_total_size))
                .abs()
                <= crate::constants::SAVINGS_PERCENTAGE_TOLERANCE
    }
}

/// Entry of `GET /admin/audit-logs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: u64,
    pub user_id: Option<u64>,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<u64>,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub details: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

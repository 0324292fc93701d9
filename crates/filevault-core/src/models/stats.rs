//! Deduplicated storage accounting as reported by the backend.

use serde::{Deserialize, Serialize};

use crate::constants::SAVINGS_PERCENTAGE_TOLERANCE;

/// Per-user storage statistics. Computed server-side; the client only checks,
/// formats and visualizes them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StorageStats {
    /// Bytes actually stored after deduplication.
    pub total_storage_used: i64,
    /// Naive sum of all file sizes.
    pub original_storage_usage: i64,
    pub storage_savings_bytes: i64,
    pub storage_savings_percentage: f64,
    pub user_quota: i64,
}

impl StorageStats {
    /// `original_storage_usage - total_storage_used`.
    pub fn expected_savings_bytes(&self) -> i64 {
        self.original_storage_usage - self.total_storage_used
    }

    /// Savings as a percentage of the original usage; 0 when nothing is stored.
    pub fn expected_savings_percentage(&self) -> f64 {
        savings_percentage(self.expected_savings_bytes(), self.original_storage_usage)
    }

    /// Whether the reported savings agree with the reported usage figures.
    pub fn is_consistent(&self) -> bool {
        self.storage_savings_bytes == self.expected_savings_bytes()
            && (self.storage_savings_percentage - self.expected_savings_percentage()).abs()
                <= SAVINGS_PERCENTAGE_TOLERANCE
    }

    /// Usage against quota. Not enforced client-side; the server is authoritative.
    pub fn is_over_quota(&self) -> bool {
        self.user_quota > 0 && self.total_storage_used > self.user_quota
    }

    pub fn quota_usage(&self) -> QuotaUsage {
        QuotaUsage::from_stats(self)
    }
}

/// Shared savings formula, also used for system-wide admin statistics.
pub fn savings_percentage(savings_bytes: i64, original_bytes: i64) -> f64 {
    if original_bytes <= 0 {
        return 0.0;
    }
    savings_bytes as f64 / original_bytes as f64 * 100.0
}

/// "Used vs free" proportions for the quota bar and chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuotaUsage {
    pub used_bytes: i64,
    pub free_bytes: i64,
    pub quota_bytes: i64,
    /// `used / quota * 100`, or 0 when the quota is 0. May exceed 100.
    pub used_percentage: f64,
}

impl QuotaUsage {
    pub fn from_stats(stats: &StorageStats) -> Self {
        let used_percentage = if stats.user_quota > 0 {
            stats.total_storage_used as f64 / stats.user_quota as f64 * 100.0
        } else {
            0.0
        };
        Self {
            used_bytes: stats.total_storage_used,
            free_bytes: (stats.user_quota - stats.total_storage_used).max(0),
            quota_bytes: stats.user_quota,
            used_percentage,
        }
    }

    /// Width of the usage bar, clamped to `0..=100`.
    pub fn bar_percentage(&self) -> f64 {
        self.used_percentage.clamp(0.0, 100.0)
    }
}

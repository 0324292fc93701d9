use filevault_core::format::format_percentage;
use filevault_core::{format_bytes, FileRecord, QuotaUsage, StorageStats, SystemStats};

const BAR_WIDTH: usize = 40;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// File listing as a fixed-width table.
pub fn render_files_table(files: &[FileRecord]) -> String {
    if files.is_empty() {
        return "No files found.\n".to_string();
    }

    let mut out = format!(
        "{:<8} {:<40} {:<24} {:>12} {:<16} {:>9} {:<19}\n",
        "ID", "Filename", "Type", "Size", "Owner", "Downloads", "Uploaded At"
    );
    out.push_str(&"-".repeat(134));
    out.push('\n');
    for file in files {
        out.push_str(&format!(
            "{:<8} {:<40} {:<24} {:>12} {:<16} {:>9} {:<19}\n",
            file.id,
            truncate_string(&file.original_filename, 40),
            truncate_string(&file.mime_type, 24),
            format_bytes(file.size, 2),
            truncate_string(&file.owner_username, 16),
            file.download_count,
            file.created_at.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    out
}

/// `[#####-----]` proportion of the quota in use.
pub fn usage_bar(quota: &QuotaUsage, width: usize) -> String {
    let filled = ((quota.bar_percentage() / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

pub fn render_stats(stats: &StorageStats) -> String {
    let quota = stats.quota_usage();
    let mut out = String::from("=== Storage ===\n");
    out.push_str(&format!(
        "Used:      {} (before deduplication: {})\n",
        format_bytes(stats.total_storage_used, 2),
        format_bytes(stats.original_storage_usage, 2)
    ));
    out.push_str(&format!(
        "Saved:     {} ({})\n",
        format_bytes(stats.storage_savings_bytes, 2),
        format_percentage(stats.storage_savings_percentage)
    ));
    if stats.user_quota > 0 {
        out.push_str(&format!(
            "Quota:     {} of {} ({} used, {} free)\n",
            format_bytes(quota.used_bytes, 2),
            format_bytes(quota.quota_bytes, 2),
            format_percentage(quota.used_percentage),
            format_bytes(quota.free_bytes, 2)
        ));
        out.push_str(&format!("           {}\n", usage_bar(&quota, BAR_WIDTH)));
        if stats.is_over_quota() {
            out.push_str("Warning: storage quota exceeded\n");
        }
    } else {
        out.push_str("Quota:     none\n");
    }
    out
}

pub fn render_system_stats(stats: &SystemStats) -> String {
    format!(
        "=== System ===\nUsers:     {}\nFiles:     {}\nStored:    {}\nLogical:   {}\nSaved:     {} ({})\n",
        stats.total_users,
        stats.total_files,
        format_bytes(stats.total_storage_used, 2),
        format_bytes(stats.original_total_size, 2),
        format_bytes(stats.deduplication_saved, 2),
        format_percentage(stats.savings_percentage)
    )
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

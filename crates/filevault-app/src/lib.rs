//! Application layer of the file vault client.
//!
//! Sits between the HTTP gateway and any presentation: coordinates uploads,
//! keeps the file listing and storage stats consistent with each other, and
//! carries user-facing notifications.

pub mod filter;
pub mod listing;
pub mod notify;
pub mod upload;
pub mod vault;

pub use filter::FilterForm;
pub use listing::{
    ListingAggregator, ListingSnapshot, ListingView, RefreshError, RefreshLedger, RefreshOutcome,
};
pub use notify::{DismissPolicy, Notification, NotificationKind, Notifier};
pub use upload::{UploadCoordinator, UploadOutcome, UploadStatus};
pub use vault::Vault;

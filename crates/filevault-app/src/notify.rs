//! Notification surface: one visible message at a time.
//!
//! A new notification replaces whatever is showing. Messages auto-dismiss after
//! a fixed time-to-live; with [`DismissPolicy::ErrorsRequireAck`] errors stay
//! until acknowledged.

use std::sync::Arc;
use std::time::Duration;

use filevault_core::constants::DEFAULT_NOTIFICATION_TTL_MS;
use filevault_core::ClientConfig;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissPolicy {
    /// Success and error both expire after the TTL.
    Uniform,
    ErrorsRequireAck,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    posted_at: Instant,
}

#[derive(Debug, Default)]
struct Slot {
    next_id: u64,
    current: Option<Notification>,
}

#[derive(Debug, Clone)]
pub struct Notifier {
    slot: Arc<Mutex<Slot>>,
    ttl: Duration,
    policy: DismissPolicy,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_NOTIFICATION_TTL_MS),
            DismissPolicy::Uniform,
        )
    }
}

impl Notifier {
    pub fn new(ttl: Duration, policy: DismissPolicy) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::default())),
            ttl,
            policy,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let policy = if config.errors_require_ack {
            DismissPolicy::ErrorsRequireAck
        } else {
            DismissPolicy::Uniform
        };
        Self::new(config.notification_ttl(), policy)
    }

    pub fn policy(&self) -> DismissPolicy {
        self.policy
    }

    /// Post a notification, replacing the visible one. Returns its id.
    pub async fn notify(&self, message: impl Into<String>, kind: NotificationKind) -> u64 {
        let message = message.into();
        let mut slot = self.slot.lock().await;
        slot.next_id += 1;
        let id = slot.next_id;
        match kind {
            NotificationKind::Success => tracing::info!(id, %message, "Notification"),
            NotificationKind::Error => tracing::warn!(id, %message, "Notification"),
        }
        slot.current = Some(Notification {
            id,
            message,
            kind,
            posted_at: Instant::now(),
        });
        id
    }

    pub async fn success(&self, message: impl Into<String>) -> u64 {
        self.notify(message, NotificationKind::Success).await
    }

    pub async fn error(&self, message: impl Into<String>) -> u64 {
        self.notify(message, NotificationKind::Error).await
    }

    /// The notification currently visible, if any.
    pub async fn current(&self) -> Option<Notification> {
        let mut slot = self.slot.lock().await;
        let expired = match &slot.current {
            Some(n) => self.is_expired(n),
            None => return None,
        };
        if expired {
            slot.current = None;
        }
        slot.current.clone()
    }

    /// Dismiss the notification with `id`. False if it is no longer visible.
    pub async fn acknowledge(&self, id: u64) -> bool {
        let mut slot = self.slot.lock().await;
        match &slot.current {
            Some(n) if n.id == id && !self.is_expired(n) => {
                slot.current = None;
                true
            }
            _ => false,
        }
    }

    pub async fn dismiss(&self) {
        self.slot.lock().await.current = None;
    }

    fn is_expired(&self, notification: &Notification) -> bool {
        if self.policy == DismissPolicy::ErrorsRequireAck
            && notification.kind == NotificationKind::Error
        {
            return false;
        }
        notification.posted_at.elapsed() >= self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn auto_dismisses_after_ttl() {
        let notifier = Notifier::default();
        notifier.success("File deleted successfully.").await;

        tokio::time::advance(Duration::from_millis(3999)).await;
        assert!(notifier.current().await.is_some());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(notifier.current().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn latest_overwrites_pending() {
        let notifier = Notifier::default();
        notifier.success("first").await;
        tokio::time::advance(Duration::from_millis(3000)).await;
        notifier.error("second").await;

        tokio::time::advance(Duration::from_millis(3000)).await;
        let current = notifier.current().await.unwrap();
        assert_eq!(current.message, "second");
        assert_eq!(current.kind, NotificationKind::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_wait_for_ack_when_configured() {
        let notifier = Notifier::new(Duration::from_secs(4), DismissPolicy::ErrorsRequireAck);
        let id = notifier.error("Error: File not found").await;

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(notifier.current().await.is_some());
        assert!(!notifier.acknowledge(id + 1).await);
        assert!(notifier.acknowledge(id).await);
        assert!(notifier.current().await.is_none());

        notifier.success("done").await;
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(notifier.current().await.is_none());
    }
}

//! Outbound notifications for plan expiry, blocking and data deletion.
//!
//! Delivery is a collaborator behind the [`Notifier`] trait. Jobs call it once
//! per affected subscriber and only log failures; nothing is retried inline.

use crate::errors::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// Who a notification goes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    /// Subscriber's user id
    pub user_id: String,
    /// Delivery address
    pub email: String,
}

/// What happened to the subscriber's plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// The plan expires soon
    ExpiryWarning {
        /// Whole days until expiry
        days_left: i64,
        /// End of the paid period
        expires_at: DateTime<Utc>,
    },
    /// The plan expired and the account is now blocked
    Blocked {
        /// When the plan ran out
        expired_at: DateTime<Utc>,
    },
    /// The grace period ended and the account's data was removed
    DataDeleted,
}

impl Notification {
    /// Email subject line
    #[must_use]
    pub fn subject(&self) -> String {
        match self {
            Self::ExpiryWarning { days_left, .. } => {
                format!("Your plan expires in {days_left} day(s)")
            }
            Self::Blocked { .. } => "Your account has been blocked".to_string(),
            Self::DataDeleted => "Your account data has been deleted".to_string(),
        }
    }
}

/// Delivers notifications to subscribers.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends one notification; errors are reported to the caller, who logs them.
    async fn notify(&self, recipient: &Recipient, notification: &Notification) -> Result<()>;
}

/// Writes notifications to the log instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, recipient: &Recipient, notification: &Notification) -> Result<()> {
        info!(
            user_id = %recipient.user_id,
            email = %recipient.email,
            "Notification: {}",
            notification.subject()
        );
        Ok(())
    }
}

//! Status change notifications
//!
//! The workflow emits one [`ClaimNotification`] per committed status change,
//! after the store has accepted the write. Delivery is best-effort: a failed
//! publish is logged at debug level and never reaches the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use core_kernel::{ClaimId, LecturerId};

use crate::claim::{Claim, ClaimStatus};

/// Default capacity of the broadcast channel
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 256;

/// Message published when a claim changes status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimNotification {
    pub claim_id: ClaimId,
    pub lecturer_id: LecturerId,
    pub status: ClaimStatus,
    pub occurred_at: DateTime<Utc>,
}

impl ClaimNotification {
    pub fn for_claim(claim: &Claim) -> Self {
        Self {
            claim_id: claim.id,
            lecturer_id: claim.lecturer_id.clone(),
            status: claim.status,
            occurred_at: claim.updated_at,
        }
    }
}

/// Fire-and-forget sink for status changes
pub trait NotificationPort: Send + Sync {
    fn notify(&self, notification: ClaimNotification);
}

/// Publishes notifications on a tokio broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<ClaimNotification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to notifications published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<ClaimNotification> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_CAPACITY)
    }
}

impl NotificationPort for BroadcastNotifier {
    fn notify(&self, notification: ClaimNotification) {
        let claim_id = notification.claim_id;
        // an error only means nobody is listening
        if self.sender.send(notification).is_err() {
            debug!(claim_id = %claim_id, "No subscribers for claim notification");
        }
    }
}

/// Discards every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl NotificationPort for NoopNotifier {
    fn notify(&self, _notification: ClaimNotification) {}
}

//! Detached notification delivery.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::{LeadNotification, Notifier};

/// Hands notifications to a background worker.
///
/// [`dispatch`](Self::dispatch) never waits on delivery. Each notification
/// is delivered on its own task with no deadline, so one slow channel call
/// does not hold up the next.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<LeadNotification>,
}

impl Dispatcher {
    /// Starts the worker for `notifier`. Must be called inside a Tokio
    /// runtime.
    #[must_use]
    pub fn spawn<N: Notifier>(notifier: N) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<LeadNotification>();
        let notifier = Arc::new(notifier);

        tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                let notifier = Arc::clone(&notifier);
                tokio::spawn(async move {
                    deliver(notifier.as_ref(), &notification).await;
                });
            }
            debug!("Notification dispatcher stopped");
        });

        Self { tx }
    }

    /// Queues a notification for delivery.
    pub fn dispatch(&self, notification: LeadNotification) {
        let lead_id = notification.lead_id;
        if self.tx.send(notification).is_err() {
            warn!(lead = %lead_id, "Notification dispatcher is closed; dropping notification");
        }
    }
}

async fn deliver<N: Notifier>(notifier: &N, notification: &LeadNotification) {
    match notifier.notify(notification).await {
        Ok(()) => info!(
            lead = %notification.lead_id,
            priority = notification.priority.as_str(),
            "Lead notification delivered"
        ),
        Err(e) => error!(
            lead = %notification.lead_id,
            error = %e,
            "Failed to deliver lead notification"
        ),
    }
}

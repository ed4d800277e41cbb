//! Best-effort lead notifications.
//!
//! Lead creation hands a [`LeadNotification`] to a [`Dispatcher`], which
//! delivers it on a background task through a [`Notifier`] channel. Delivery
//! failures are logged and never reach the submitter.

mod dispatcher;
mod email;

use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

use crate::lead::{InquiryType, Lead, LeadId, LeadPriority};

pub use dispatcher::Dispatcher;
pub use email::{EmailNotifier, EmailSettings, OutgoingMessage, SmtpSecurity};

/// Everything a notification channel needs to know about a new lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadNotification {
    /// Lead identifier.
    pub lead_id: LeadId,
    /// Submitter's name.
    pub full_name: String,
    /// Submitter's email address.
    pub email: String,
    /// Submitter's organization.
    pub organization: String,
    /// Declared category of interest.
    pub inquiry_type: InquiryType,
    /// Free-text message.
    pub message: String,
    /// Classified priority.
    pub priority: LeadPriority,
    /// Optional phone number.
    pub phone: Option<String>,
    /// When the lead was received.
    pub received_at: DateTime<Utc>,
}

impl From<&Lead> for LeadNotification {
    fn from(lead: &Lead) -> Self {
        Self {
            lead_id: lead.id,
            full_name: lead.full_name.clone(),
            email: lead.email.clone(),
            organization: lead.organization.clone(),
            inquiry_type: lead.inquiry_type,
            message: lead.message.clone(),
            priority: lead.priority,
            phone: lead.phone.clone(),
            received_at: lead.created_at,
        }
    }
}

/// Errors raised by a notification channel.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// SMTP delivery failed.
    #[error("SMTP error: {0}")]
    Smtp(#[from] leadgate_smtp::Error),

    /// Channel settings are unusable.
    #[error("Invalid notification settings: {0}")]
    Config(String),
}

/// A delivery channel for lead notifications.
pub trait Notifier: Send + Sync + 'static {
    /// Delivers one notification.
    fn notify(
        &self,
        notification: &LeadNotification,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Channel used when email is not configured: logs a warning per lead.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, notification: &LeadNotification) -> Result<(), NotifyError> {
        warn!(
            lead = %notification.lead_id,
            priority = notification.priority.as_str(),
            organization = %notification.organization,
            "Email notifications are not configured; lead not emailed"
        );
        Ok(())
    }
}

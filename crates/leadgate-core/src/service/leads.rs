//! Lead intake and management.

use serde::Serialize;
use tracing::{info, warn};

use crate::db;
use crate::lead::{Lead, LeadFilter, LeadId, LeadPriority, LeadRepository, LeadUpdate, NewLead};
use crate::notify::{Dispatcher, LeadNotification};
use crate::page::{self, Page};
use crate::validation::validate_new_lead;
use crate::{Error, Result};

/// Acknowledgement returned to the submitter.
pub const THANK_YOU: &str = "Thank you for your inquiry. We will be in touch shortly.";

/// Response to a successful lead submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedLead {
    /// Acknowledgement text.
    pub message: &'static str,
    /// Identity of the stored lead.
    pub lead_id: LeadId,
    /// Assigned priority.
    pub priority: LeadPriority,
}

/// Orchestrates lead intake and the admin lead views.
#[derive(Debug, Clone)]
pub struct LeadService {
    repo: LeadRepository,
    dispatcher: Dispatcher,
}

impl LeadService {
    /// Creates the service.
    #[must_use]
    pub const fn new(repo: LeadRepository, dispatcher: Dispatcher) -> Self {
        Self { repo, dispatcher }
    }

    /// Validates, classifies and stores a submission, then queues a
    /// notification without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] with every failing field, or a database
    /// error. Nothing is stored or dispatched on error.
    pub async fn create(&self, submission: NewLead) -> Result<CreatedLead> {
        validate_new_lead(&submission)?;

        let lead = Lead::from_submission(submission, db::now());
        self.repo.insert(&lead).await?;

        info!(
            lead = %lead.id,
            email = %lead.email,
            priority = lead.priority.as_str(),
            "New lead created"
        );
        if lead.priority == LeadPriority::Critical {
            warn!(
                lead = %lead.id,
                email = %lead.email,
                organization = %lead.organization,
                "Critical lead: government domain detected"
            );
        }

        self.dispatcher.dispatch(LeadNotification::from(&lead));

        Ok(CreatedLead {
            message: THANK_YOU,
            lead_id: lead.id,
            priority: lead.priority,
        })
    }

    /// Lists leads, most urgent and newest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a zero page or page size, or a
    /// database error.
    pub async fn list(&self, mut filter: LeadFilter) -> Result<Page<Lead>> {
        let (page, page_size) = page::normalize(filter.page, filter.page_size)?;
        filter.page = page;
        filter.page_size = page_size;
        self.repo.list(&filter).await
    }

    /// Fetches one lead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LeadNotFound`] for an unknown id, or a database error.
    pub async fn get(&self, id: LeadId) -> Result<Lead> {
        self.repo.get(id).await?.ok_or(Error::LeadNotFound(id))
    }

    /// Changes status and/or notes. Omitted fields are left alone and
    /// `updated_at` always advances.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LeadNotFound`] for an unknown id, or a database error.
    pub async fn update(&self, id: LeadId, update: LeadUpdate) -> Result<Lead> {
        let mut lead = self.get(id).await?;
        lead.apply(update, db::now());

        if !self.repo.save(&lead).await? {
            return Err(Error::LeadNotFound(id));
        }
        info!(lead = %id, status = lead.status.as_str(), "Lead updated");
        Ok(lead)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lead::{InquiryType, LeadStatus};
    use crate::notify::{Notifier, NotifyError};
    use crate::validation::ValidationError;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Recording(mpsc::UnboundedSender<LeadNotification>);

    impl Notifier for Recording {
        async fn notify(
            &self,
            notification: &LeadNotification,
        ) -> std::result::Result<(), NotifyError> {
            self.0.send(notification.clone()).unwrap();
            Ok(())
        }
    }

    struct Broken;

    impl Notifier for Broken {
        async fn notify(&self, _: &LeadNotification) -> std::result::Result<(), NotifyError> {
            Err(NotifyError::Config("relay down".into()))
        }
    }

    fn submission(email: &str, kind: InquiryType) -> NewLead {
        NewLead {
            full_name: "Jane Doe".into(),
            email: email.into(),
            organization: "Acme".into(),
            inquiry_type: Some(kind),
            message: "Tell me more".into(),
            phone: None,
        }
    }

    async fn service() -> (LeadService, mpsc::UnboundedReceiver<LeadNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let repo = LeadRepository::in_memory().await.unwrap();
        (LeadService::new(repo, Dispatcher::spawn(Recording(tx))), rx)
    }

    #[tokio::test]
    async fn create_stores_classifies_and_notifies() {
        let (service, mut rx) = service().await;
        let created = service
            .create(submission("john@army.mil", InquiryType::Other))
            .await
            .unwrap();
        assert_eq!(created.priority, LeadPriority::Critical);
        assert_eq!(created.message, THANK_YOU);

        let stored = service.get(created.lead_id).await.unwrap();
        assert_eq!(stored.status, LeadStatus::New);
        assert_eq!(stored.priority, LeadPriority::Critical);

        let sent = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sent.lead_id, created.lead_id);
        assert_eq!(sent.priority, LeadPriority::Critical);
        assert_eq!(sent.email, "john@army.mil");
    }

    #[tokio::test]
    async fn priority_scenarios() {
        let (service, _rx) = service().await;
        for (email, kind, expected) in [
            ("jane@state.gov", InquiryType::Media, LeadPriority::Critical),
            ("a@fund.com", InquiryType::Investor, LeadPriority::High),
            ("a@city.org", InquiryType::StateLocal, LeadPriority::Medium),
            ("a@news.com", InquiryType::Media, LeadPriority::Standard),
        ] {
            let created = service.create(submission(email, kind)).await.unwrap();
            assert_eq!(created.priority, expected, "{email}");
        }
    }

    #[tokio::test]
    async fn invalid_submission_stores_nothing() {
        let (service, mut rx) = service().await;
        let err = service
            .create(NewLead {
                full_name: String::new(),
                ..submission("not-an-email", InquiryType::Other)
            })
            .await
            .unwrap_err();

        let Error::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.0.contains(&ValidationError::Required("fullName")));
        assert!(errors.0.contains(&ValidationError::InvalidEmail));
        assert_eq!(service.list(LeadFilter::default()).await.unwrap().total_count, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_creation() {
        let repo = LeadRepository::in_memory().await.unwrap();
        let service = LeadService::new(repo, Dispatcher::spawn(Broken));
        let created = service
            .create(submission("a@example.com", InquiryType::Other))
            .await
            .unwrap();
        assert!(service.get(created.lead_id).await.is_ok());
    }

    #[tokio::test]
    async fn list_validates_and_clamps_paging() {
        let (service, _rx) = service().await;
        service
            .create(submission("a@example.com", InquiryType::Other))
            .await
            .unwrap();

        let err = service
            .list(LeadFilter {
                page: 0,
                ..LeadFilter::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let page = service
            .list(LeadFilter {
                page_size: 1000,
                ..LeadFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(page.page_size, crate::MAX_PAGE_SIZE);
        assert_eq!(page.total_count, 1);
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let (service, _rx) = service().await;
        let created = service
            .create(submission("a@fund.com", InquiryType::Investor))
            .await
            .unwrap();
        let original = service.get(created.lead_id).await.unwrap();

        let updated = service
            .update(
                created.lead_id,
                LeadUpdate {
                    status: Some(LeadStatus::Contacted),
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, LeadStatus::Contacted);
        assert_eq!(updated.notes, None);
        assert!(updated.updated_at > original.updated_at);

        let noted = service
            .update(
                created.lead_id,
                LeadUpdate {
                    status: None,
                    notes: Some("Follow up Friday".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(noted.status, LeadStatus::Contacted);
        assert_eq!(noted.notes.as_deref(), Some("Follow up Friday"));
        assert!(noted.updated_at > updated.updated_at);
        assert_eq!(noted.priority, original.priority);
        assert_eq!(noted.created_at, original.created_at);
        assert_eq!(service.get(created.lead_id).await.unwrap(), noted);
    }

    #[tokio::test]
    async fn unknown_lead_is_not_found() {
        let (service, _rx) = service().await;
        let id = LeadId::generate();
        assert!(matches!(service.get(id).await, Err(Error::LeadNotFound(_))));
        assert!(matches!(
            service.update(id, LeadUpdate::default()).await,
            Err(Error::LeadNotFound(_))
        ));
    }
}

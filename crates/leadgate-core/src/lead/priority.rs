//! Lead priority classification.

use super::model::{InquiryType, LeadPriority};

/// Email domain suffixes that mark a government sender.
const GOVERNMENT_SUFFIXES: [&str; 2] = [".mil", ".gov"];

/// Classifies a lead by its email address and inquiry type.
///
/// Government senders are `Critical` regardless of inquiry type. Otherwise
/// federal and investor inquiries are `High`, state and local are `Medium`
/// and everything else is `Standard`. The suffix test is case-insensitive.
#[must_use]
pub fn classify(email: &str, inquiry_type: InquiryType) -> LeadPriority {
    let email = email.trim().to_lowercase();
    if GOVERNMENT_SUFFIXES
        .iter()
        .any(|suffix| email.ends_with(suffix))
    {
        return LeadPriority::Critical;
    }

    match inquiry_type {
        InquiryType::FederalDefense | InquiryType::Investor => LeadPriority::High,
        InquiryType::StateLocal => LeadPriority::Medium,
        InquiryType::Media | InquiryType::Other => LeadPriority::Standard,
    }
}

//! Lead intake and management.
//!
//! This module provides:
//! - **Models**: [`Lead`], the public [`NewLead`] submission and the admin
//!   [`LeadUpdate`]
//! - **Classifier**: [`classify`] assigns a [`LeadPriority`] from the email
//!   domain and inquiry type
//! - **Storage**: [`LeadRepository`] with filtered, paginated listing
//!
//! # Example
//!
//! ```ignore
//! use leadgate_core::lead::{classify, InquiryType, LeadPriority};
//!
//! assert_eq!(classify("ops@army.mil", InquiryType::Other), LeadPriority::Critical);
//! assert_eq!(classify("cfo@fund.com", InquiryType::Investor), LeadPriority::High);
//! ```

mod model;
mod priority;
mod repository;

pub use model::{
    InquiryType, Lead, LeadFilter, LeadId, LeadPriority, LeadStatus, LeadUpdate, NewLead,
};
pub use priority::classify;
pub use repository::LeadRepository;

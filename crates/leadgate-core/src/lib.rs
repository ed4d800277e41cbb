//! # leadgate-core
//!
//! Core business logic for the leadgate API.
//!
//! This crate provides:
//! - **Lead intake** - validation, priority classification, persistence and
//!   best-effort notification of public inquiries
//! - **Lead management** - filtered, paginated listing and status/notes updates
//! - **Investor accounts** - registration, credential verification with lockout,
//!   the approval state machine and the status gate
//! - **Notifications** - a detached dispatcher with email and log-only channels
//! - Local storage (`SQLite`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
mod db;
mod error;
pub mod lead;
pub mod notify;
mod page;
pub mod service;
pub mod validation;

pub use account::{
    AccessDenied, Account, AccountFilter, AccountId, AccountRepository, AccountStatus,
    AuthFailure, ProfileUpdate, Registration, Role,
};
pub use db::{open, open_in_memory};
pub use error::{Error, Result};
pub use lead::{
    InquiryType, Lead, LeadFilter, LeadId, LeadPriority, LeadRepository, LeadStatus, LeadUpdate,
    NewLead, classify,
};
pub use notify::{
    Dispatcher, EmailNotifier, EmailSettings, LeadNotification, LogNotifier, Notifier,
    NotifyError, SmtpSecurity,
};
pub use page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page};
pub use service::{AccountService, CreatedLead, LeadService};
pub use validation::{ValidationError, ValidationErrors, ValidationResult};

//! Core services.
//!
//! This module provides the service layer that bridges the HTTP API with
//! validation, storage and notification.

pub mod accounts;
pub mod leads;

pub use accounts::AccountService;
pub use leads::{CreatedLead, LeadService};

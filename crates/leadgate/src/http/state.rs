//! Shared handler state.

use std::sync::Arc;

use leadgate_auth::TokenIssuer;
use leadgate_core::{AccountService, LeadService};

/// Services shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Lead intake and admin lead views.
    pub leads: LeadService,
    /// Accounts and the review workflow.
    pub accounts: AccountService,
    /// Token issuance and validation.
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    /// Bundles the services.
    #[must_use]
    pub fn new(leads: LeadService, accounts: AccountService, tokens: TokenIssuer) -> Self {
        Self {
            leads,
            accounts,
            tokens: Arc::new(tokens),
        }
    }
}

//! # leadgate
//!
//! HTTP API for lead intake and the investor portal.
//!
//! [`build_state`] opens the database, starts the notification dispatcher
//! and provisions the bootstrap admin; [`router`] exposes the services over
//! HTTP.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod http;
pub mod shutdown;

use anyhow::Context;
use leadgate_auth::TokenIssuer;
use leadgate_core::{
    AccountRepository, AccountService, Dispatcher, EmailNotifier, LeadRepository, LeadService,
    LogNotifier,
};
use tracing::{info, warn};

pub use config::Settings;
pub use http::{AppState, router};

/// Wires the services described by `settings`.
///
/// # Errors
///
/// Returns an error if the database cannot be opened, the token or email
/// settings are unusable, or the bootstrap admin cannot be provisioned.
pub async fn build_state(settings: &Settings) -> anyhow::Result<AppState> {
    if let Some(parent) = settings.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }

    let database = settings.database_path.to_string_lossy();
    let pool = leadgate_core::open(&database)
        .await
        .with_context(|| format!("opening database {database}"))?;
    info!(path = %database, "Database opened");

    let leads = LeadRepository::from_pool(pool.clone()).await?;
    let accounts = AccountService::new(AccountRepository::from_pool(pool).await?);

    let dispatcher = if let Some(email) = &settings.email {
        info!(host = %email.host, recipient = email.recipient(), "Email notifications enabled");
        Dispatcher::spawn(EmailNotifier::new(email.clone())?)
    } else {
        warn!("No email settings; lead notifications will only be logged");
        Dispatcher::spawn(LogNotifier)
    };

    if let Some(admin) = &settings.admin {
        if accounts
            .ensure_admin(&admin.email, &admin.password, &admin.full_name)
            .await
            .context("provisioning admin account")?
        {
            info!(email = %admin.email, "Bootstrap admin created");
        }
    }

    let tokens = TokenIssuer::new(settings.jwt.clone())?;
    Ok(AppState::new(
        LeadService::new(leads, dispatcher),
        accounts,
        tokens,
    ))
}

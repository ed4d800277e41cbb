//! `/api/auth` handlers: registration, login and token refresh.

use axum::Json;
use axum::extract::State;
use leadgate_auth::{Subject, TokenPair};
use leadgate_core::service::accounts::REGISTERED;
use leadgate_core::{Account, AccountId, AuthFailure, Registration};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ApiError;
use super::extract::ApiJson;
use super::state::AppState;

/// Body of `POST /api/auth/login`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// Body of `POST /api/auth/refresh`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    access_token: String,
    refresh_token: String,
}

/// Response to a successful registration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registered {
    message: &'static str,
    user_id: AccountId,
}

fn subject(account: &Account) -> Subject {
    Subject {
        id: account.id.0,
        email: account.email.clone(),
        name: account.full_name.clone(),
        role: account.role.as_str().to_string(),
        status: account.status.as_str().to_string(),
    }
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    ApiJson(registration): ApiJson<Registration>,
) -> Result<Json<Registered>, ApiError> {
    let account = state.accounts.register(registration).await?;
    Ok(Json(Registered {
        message: REGISTERED,
        user_id: account.id,
    }))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let account = state.accounts.login(&request.email, &request.password).await?;
    Ok(Json(state.tokens.issue(&subject(&account))?))
}

/// `POST /api/auth/refresh`: exchanges a possibly expired access token
/// for a new pair. The account is re-read, so the status gate applies.
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    if request.refresh_token.trim().is_empty() {
        return Err(ApiError::unauthorized(AuthFailure::InvalidToken));
    }
    let claims = state.tokens.validate_for_refresh(&request.access_token)?;
    let account = state.accounts.refresh(AccountId(claims.sub)).await?;
    debug!(account = %account.id, "Token refreshed");
    Ok(Json(state.tokens.issue(&subject(&account))?))
}

//! `/api/users` handlers: the caller's own profile and the admin review
//! workflow.

use axum::Json;
use axum::extract::State;
use leadgate_core::{Account, AccountFilter, AccountId, Page, ProfileUpdate};
use serde::Serialize;
use uuid::Uuid;

use super::error::ApiError;
use super::extract::{AdminUser, ApiJson, ApiPath, ApiQuery, AuthUser};
use super::state::AppState;

/// Outcome of an approve or reject call.
#[derive(Debug, Serialize)]
pub struct Reviewed {
    message: &'static str,
    user: Account,
}

/// Number of accounts awaiting review.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCount {
    pending_count: u64,
}

/// `GET /api/users/me`
pub async fn me(user: AuthUser, State(state): State<AppState>) -> Result<Json<Account>, ApiError> {
    Ok(Json(state.accounts.current(user.account_id()).await?))
}

/// `PUT /api/users/me`
pub async fn update_me(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<Account>, ApiError> {
    Ok(Json(
        state
            .accounts
            .update_current(user.account_id(), update)
            .await?,
    ))
}

/// `GET /api/users`
pub async fn list(
    _admin: AdminUser,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<AccountFilter>,
) -> Result<Json<Page<Account>>, ApiError> {
    Ok(Json(state.accounts.list(filter).await?))
}

/// `PUT /api/users/:id/approve`
pub async fn approve(
    admin: AdminUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Reviewed>, ApiError> {
    let user = state
        .accounts
        .approve(AccountId(id), admin.account_id())
        .await?;
    Ok(Json(Reviewed {
        message: "User approved successfully",
        user,
    }))
}

/// `PUT /api/users/:id/reject`
pub async fn reject(
    admin: AdminUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Reviewed>, ApiError> {
    let user = state
        .accounts
        .reject(AccountId(id), admin.account_id())
        .await?;
    Ok(Json(Reviewed {
        message: "User rejected successfully",
        user,
    }))
}

/// `GET /api/users/pending-count`
pub async fn pending_count(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<PendingCount>, ApiError> {
    Ok(Json(PendingCount {
        pending_count: state.accounts.pending_count().await?,
    }))
}

//! `/api/leads` handlers.

use axum::Json;
use axum::extract::State;
use leadgate_core::{CreatedLead, Lead, LeadFilter, LeadId, LeadUpdate, NewLead, Page};
use uuid::Uuid;

use super::error::ApiError;
use super::extract::{AdminUser, ApiJson, ApiPath, ApiQuery};
use super::state::AppState;

/// `POST /api/leads`: public contact form submission.
pub async fn create(
    State(state): State<AppState>,
    ApiJson(submission): ApiJson<NewLead>,
) -> Result<Json<CreatedLead>, ApiError> {
    Ok(Json(state.leads.create(submission).await?))
}

/// `GET /api/leads`
pub async fn list(
    _admin: AdminUser,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<LeadFilter>,
) -> Result<Json<Page<Lead>>, ApiError> {
    Ok(Json(state.leads.list(filter).await?))
}

/// `GET /api/leads/:id`
pub async fn get(
    _admin: AdminUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Lead>, ApiError> {
    Ok(Json(state.leads.get(LeadId(id)).await?))
}

/// `PUT /api/leads/:id`: status and notes only.
pub async fn update(
    _admin: AdminUser,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<LeadUpdate>,
) -> Result<Json<Lead>, ApiError> {
    Ok(Json(state.leads.update(LeadId(id), update).await?))
}

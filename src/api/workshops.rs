//! Workshop API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::filter::apply_text_filter;
use crate::models::{CompanyListQuery, CreateWorkshopRequest, UpdateWorkshopRequest, Workshop};
use crate::AppState;

/// GET /api/workshops - List workshops.
pub async fn list_workshops(
    State(state): State<AppState>,
    Query(query): Query<CompanyListQuery>,
) -> ApiResult<Vec<Workshop>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_workshops(&query).await {
        Ok(workshops) => success(apply_text_filter(workshops, query.q.as_deref()), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/workshops/:id - Get a single workshop.
pub async fn get_workshop(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Workshop> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_workshop(&id).await {
        Ok(Some(workshop)) => success(workshop, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Workshop {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/workshops - Create a new workshop.
pub async fn create_workshop(
    State(state): State<AppState>,
    Json(request): Json<CreateWorkshopRequest>,
) -> ApiResult<Workshop> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.create_workshop(&request).await {
        Ok(workshop) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(workshop, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/workshops/:id - Update a workshop.
pub async fn update_workshop(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateWorkshopRequest>,
) -> ApiResult<Workshop> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.update_workshop(&id, &request).await {
        Ok(workshop) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(workshop, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/workshops/:id - Delete a workshop.
pub async fn delete_workshop(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_workshop(&id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

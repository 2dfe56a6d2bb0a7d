//! Vehicle API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::filter::apply_text_filter;
use crate::models::{CreateVehicleRequest, UpdateVehicleRequest, Vehicle, VehicleListQuery};
use crate::AppState;

/// GET /api/vehicles - List vehicles.
pub async fn list_vehicles(
    State(state): State<AppState>,
    Query(query): Query<VehicleListQuery>,
) -> ApiResult<Vec<Vehicle>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_vehicles(&query).await {
        Ok(vehicles) => success(apply_text_filter(vehicles, query.q.as_deref()), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/vehicles/:id - Get a single vehicle.
pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vehicle> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_vehicle(&id).await {
        Ok(Some(vehicle)) => success(vehicle, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Vehicle {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/vehicles - Create a new vehicle.
pub async fn create_vehicle(
    State(state): State<AppState>,
    Json(request): Json<CreateVehicleRequest>,
) -> ApiResult<Vehicle> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.create_vehicle(&request).await {
        Ok(vehicle) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(vehicle, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/vehicles/:id - Update a vehicle.
pub async fn update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateVehicleRequest>,
) -> ApiResult<Vehicle> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.update_vehicle(&id, &request).await {
        Ok(vehicle) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(vehicle, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/vehicles/:id - Delete a vehicle.
pub async fn delete_vehicle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_vehicle(&id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

//! Geography lookup endpoints.

use axum::extract::{Path, State};

use super::{error, success, ApiResult};
use crate::geo::{City, State as Uf};
use crate::AppState;

/// GET /api/geo/states - All states.
pub async fn list_states(State(state): State<AppState>) -> ApiResult<Vec<Uf>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.geo.states().await {
        Ok(states) => success(states, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/geo/states/:uf/cities - Cities of one state.
pub async fn list_cities(
    State(state): State<AppState>,
    Path(uf): Path<String>,
) -> ApiResult<Vec<City>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.geo.cities(&uf).await {
        Ok(cities) => success(cities, revision_id),
        Err(e) => error(e, revision_id),
    }
}

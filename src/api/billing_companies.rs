//! Billing company API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::filter::apply_text_filter;
use crate::models::{
    BillingCompany, CompanyListQuery, CreateBillingCompanyRequest, UpdateBillingCompanyRequest,
};
use crate::AppState;

/// GET /api/billing-companies - List billing companies.
pub async fn list_billing_companies(
    State(state): State<AppState>,
    Query(query): Query<CompanyListQuery>,
) -> ApiResult<Vec<BillingCompany>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_billing_companies(&query).await {
        Ok(companies) => success(apply_text_filter(companies, query.q.as_deref()), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/billing-companies/:id - Get a single billing company.
pub async fn get_billing_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<BillingCompany> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_billing_company(&id).await {
        Ok(Some(company)) => success(company, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Billing company {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/billing-companies - Create a new billing company.
pub async fn create_billing_company(
    State(state): State<AppState>,
    Json(request): Json<CreateBillingCompanyRequest>,
) -> ApiResult<BillingCompany> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.create_billing_company(&request).await {
        Ok(company) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(company, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/billing-companies/:id - Update a billing company.
pub async fn update_billing_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateBillingCompanyRequest>,
) -> ApiResult<BillingCompany> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.update_billing_company(&id, &request).await {
        Ok(company) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(company, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/billing-companies/:id - Delete a billing company.
pub async fn delete_billing_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_billing_company(&id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

//! Quotation API endpoints, including supplier invitations and offers.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::filter::apply_text_filter;
use crate::models::{
    CreateOfferRequest, CreateQuotationRequest, InviteSupplierRequest, Quotation,
    QuotationListQuery, QuotationSupplier, Supplier, SupplierOffer, UpdateQuotationRequest,
};
use crate::AppState;

/// GET /api/quotations - List quotations.
pub async fn list_quotations(
    State(state): State<AppState>,
    Query(query): Query<QuotationListQuery>,
) -> ApiResult<Vec<Quotation>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_quotations(&query).await {
        Ok(quotations) => success(apply_text_filter(quotations, query.q.as_deref()), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/quotations/:id - Get a single quotation.
pub async fn get_quotation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Quotation> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_quotation(&id).await {
        Ok(Some(quotation)) => success(quotation, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Quotation {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/quotations - Create a new quotation.
pub async fn create_quotation(
    State(state): State<AppState>,
    Json(request): Json<CreateQuotationRequest>,
) -> ApiResult<Quotation> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.create_quotation(&request).await {
        Ok(quotation) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(quotation, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/quotations/:id - Update a quotation.
pub async fn update_quotation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateQuotationRequest>,
) -> ApiResult<Quotation> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.update_quotation(&id, &request).await {
        Ok(quotation) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(quotation, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/quotations/:id - Delete a quotation.
pub async fn delete_quotation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_quotation(&id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/quotations/:id/suppliers - Invite a supplier to quote.
pub async fn invite_supplier(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<InviteSupplierRequest>,
) -> ApiResult<QuotationSupplier> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.invite_supplier(&id, &request.supplier_id).await {
        Ok(link) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(link, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/quotations/:id/suppliers - Suppliers invited to a quotation.
pub async fn list_quotation_suppliers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Supplier>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_quotation_suppliers(&id).await {
        Ok(suppliers) => success(suppliers, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/quotations/:id/offers - Record a supplier's price for a part.
pub async fn create_offer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CreateOfferRequest>,
) -> ApiResult<SupplierOffer> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.create_offer(&id, &request).await {
        Ok(offer) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(offer, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/quotations/:id/offers - Offers on a quotation, cheapest first.
pub async fn list_offers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<SupplierOffer>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_offers(&id).await {
        Ok(offers) => success(offers, revision_id),
        Err(e) => error(e, revision_id),
    }
}

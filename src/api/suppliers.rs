//! Supplier API endpoints, including the CSV import and the contact link.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{error, success, ApiResult};
use crate::contact;
use crate::errors::AppError;
use crate::filter::apply_text_filter;
use crate::import::{parse_suppliers_csv, ImportReport};
use crate::models::{
    CreateSupplierRequest, Supplier, SupplierDeleteReport, SupplierListQuery,
    UpdateSupplierRequest,
};
use crate::AppState;

/// GET /api/suppliers - List suppliers.
pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(query): Query<SupplierListQuery>,
) -> ApiResult<Vec<Supplier>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_suppliers(&query).await {
        Ok(suppliers) => success(apply_text_filter(suppliers, query.q.as_deref()), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/suppliers/:id - Get a single supplier.
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Supplier> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_supplier(&id).await {
        Ok(Some(supplier)) => success(supplier, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Supplier {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/suppliers - Create a new supplier.
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(request): Json<CreateSupplierRequest>,
) -> ApiResult<Supplier> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.create_supplier(&request).await {
        Ok(supplier) => {
            if let Err(e) = state.search.index_supplier(&supplier).await {
                tracing::warn!("Failed to index supplier: {}", e);
            }

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(supplier, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/suppliers/:id - Update a supplier.
pub async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSupplierRequest>,
) -> ApiResult<Supplier> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.update_supplier(&id, &request).await {
        Ok(supplier) => {
            if let Err(e) = state.search.index_supplier(&supplier).await {
                tracing::warn!("Failed to re-index supplier: {}", e);
            }

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(supplier, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/suppliers/:id - Delete a supplier and the rows that depend on it.
pub async fn delete_supplier(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SupplierDeleteReport> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_supplier(&id).await {
        Ok(report) => {
            if let Err(e) = state.search.remove_supplier(&id).await {
                tracing::warn!("Failed to remove supplier from index: {}", e);
            }

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(report, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/suppliers/import - Import suppliers from CSV text.
pub async fn import_suppliers(State(state): State<AppState>, body: String) -> ApiResult<ImportReport> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let parsed = match parse_suppliers_csv(&body) {
        Ok(parsed) => parsed,
        Err(e) => return error(e, revision_id),
    };

    let (imported, mut skipped) = state.repo.import_suppliers(parsed.rows).await;
    skipped.extend(parsed.errors);
    skipped.sort_by_key(|s| s.line);

    if !imported.is_empty() {
        if let Err(e) = state.search.index_suppliers(&imported).await {
            tracing::warn!("Failed to index imported suppliers: {}", e);
        }
    }

    let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
    success(
        ImportReport {
            imported,
            skipped,
            ignored_headers: parsed.ignored_headers,
        },
        new_revision,
    )
}

/// Query parameters for the contact link.
#[derive(Debug, Deserialize)]
pub struct ContactLinkQuery {
    #[serde(default)]
    pub message: Option<String>,
}

/// Messaging link for a supplier.
#[derive(Debug, Serialize)]
pub struct ContactLink {
    pub url: String,
}

/// GET /api/suppliers/:id/contact-link - WhatsApp link for the supplier's phone.
pub async fn supplier_contact_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ContactLinkQuery>,
) -> ApiResult<ContactLink> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let supplier = match state.repo.get_supplier(&id).await {
        Ok(Some(supplier)) => supplier,
        Ok(None) => {
            return error(
                AppError::NotFound(format!("Supplier {} not found", id)),
                revision_id,
            )
        }
        Err(e) => return error(e, revision_id),
    };

    let Some(phone) = supplier.phone.as_deref() else {
        return error(
            AppError::Validation(format!("Supplier {} has no phone", supplier.name)),
            revision_id,
        );
    };

    match contact::whatsapp_link(phone, query.message.as_deref()) {
        Ok(url) => success(ContactLink { url }, revision_id),
        Err(e) => error(e, revision_id),
    }
}

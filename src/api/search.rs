//! Supplier search API endpoint.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::{error, success, ApiResult};
use crate::models::Supplier;
use crate::search::MAX_SEARCH_LIMIT;
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query string.
    pub q: String,
    /// Maximum number of results (default: 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

/// Search result with suppliers and metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    /// Number of suppliers matching the query across all pages.
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Single search result item.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub supplier: Supplier,
    pub score: f32,
}

/// GET /api/search - Search suppliers.
pub async fn search_suppliers(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let limit = params.limit.min(MAX_SEARCH_LIMIT);

    let page = match state.search.search(&params.q, limit, params.offset) {
        Ok(page) => page,
        Err(e) => return error(e, revision_id),
    };

    // Hits whose row disappeared since indexing are dropped.
    let mut results = Vec::with_capacity(page.hits.len());
    for hit in page.hits {
        if let Ok(Some(supplier)) = state.repo.get_supplier(&hit.supplier_id).await {
            results.push(SearchResultItem {
                supplier,
                score: hit.score,
            });
        }
    }

    success(
        SearchResponse {
            results,
            total: page.total,
            limit,
            offset: params.offset,
        },
        revision_id,
    )
}

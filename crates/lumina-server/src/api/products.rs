use axum::{
    extract::{Query, State},
    Extension, Json,
};
use lumina_core::NormalizedProduct;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    pub q: Option<String>,
}

/// GET /api/v1/products/top: first products of the catalog.
pub(super) async fn top_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<NormalizedProduct>>> {
    let catalog = state.catalog.snapshot().await;
    Json(ApiResponse::new(catalog.top_products(), req_id.0))
}

/// GET /api/v1/search?q=: staged brand/recommendation/substring search.
pub(super) async fn search_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SearchQuery>,
) -> Json<ApiResponse<Vec<NormalizedProduct>>> {
    let q = query.q.unwrap_or_default();
    let catalog = state.catalog.snapshot().await;
    let results = catalog.search_staged(&q);

    tracing::debug!(
        query = %q,
        stage = ?results.stage,
        hits = results.products.len(),
        "search served"
    );

    Json(ApiResponse::new(results.products, req_id.0))
}

use axum::{extract::State, Extension, Json};
use lumina_core::LoadReport;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct ReloadData {
    products: usize,
    names: usize,
    recommendations: usize,
    report: LoadReport,
}

/// POST /api/v1/catalog/reload: re-read the data directory and swap the catalog.
pub(super) async fn reload_catalog(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<ReloadData>>, ApiError> {
    let (catalog, report) = state.catalog.reload().await.map_err(|e| {
        tracing::error!(error = %e, data_dir = %state.catalog.data_dir().display(), "catalog reload failed");
        ApiError::new(req_id.0.clone(), "internal_error", "catalog reload failed")
    })?;

    Ok(Json(ApiResponse::new(
        ReloadData {
            products: catalog.len(),
            names: catalog.name_count(),
            recommendations: catalog.recommendation_count(),
            report,
        },
        req_id.0,
    )))
}

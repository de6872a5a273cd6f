//! Catalog loading from a data directory.
//!
//! Loading never fails: every problem degrades to empty structures and is
//! reported through [`LoadReport`] and a `tracing` diagnostic.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::catalog::{Catalog, ProductRecord, RecommendationStub, MISSING_ID, NULL_ID};
use crate::error::CatalogError;

/// Product matrix file names, in priority order.
pub const MATRIX_CANDIDATES: [&str; 2] = ["product_matrix.json", "product_index_map.json"];
pub const RECOMMENDATIONS_FILE: &str = "precomputed_hybrid.json";

/// Outcome of reading one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Loaded { path: PathBuf, records: usize },
    Absent,
    ParseError { path: PathBuf, reason: String },
}

impl SourceStatus {
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, SourceStatus::Loaded { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub products: SourceStatus,
    pub recommendations: SourceStatus,
}

/// Build a [`Catalog`] from the files in `data_dir`.
#[must_use]
pub fn load_catalog(data_dir: &Path) -> (Catalog, LoadReport) {
    let mut catalog = Catalog::new();

    if !data_dir.is_dir() {
        tracing::warn!(data_dir = %data_dir.display(), "data directory not found; catalog is empty");
        return (
            catalog,
            LoadReport {
                products: SourceStatus::Absent,
                recommendations: SourceStatus::Absent,
            },
        );
    }

    let products = load_products(data_dir, &mut catalog);

    let (table, recommendations) = load_recommendations(data_dir);
    catalog.set_recommendations(table);

    (
        catalog,
        LoadReport {
            products,
            recommendations,
        },
    )
}

fn load_products(data_dir: &Path, catalog: &mut Catalog) -> SourceStatus {
    let Some(path) = find_matrix_file(data_dir) else {
        tracing::warn!(
            data_dir = %data_dir.display(),
            candidates = ?MATRIX_CANDIDATES,
            "no product matrix file found; catalog is empty"
        );
        return SourceStatus::Absent;
    };

    match read_json(&path) {
        Ok(raw) => {
            index_products(catalog, raw);
            tracing::info!(path = %path.display(), products = catalog.len(), "product catalog loaded");
            SourceStatus::Loaded {
                path,
                records: catalog.len(),
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "product matrix unreadable; catalog is empty");
            SourceStatus::ParseError {
                path,
                reason: e.to_string(),
            }
        }
    }
}

fn load_recommendations(data_dir: &Path) -> (HashMap<String, Vec<RecommendationStub>>, SourceStatus) {
    let path = data_dir.join(RECOMMENDATIONS_FILE);
    if !path.is_file() {
        tracing::warn!(path = %path.display(), "recommendation file not found; recommendations disabled");
        return (HashMap::new(), SourceStatus::Absent);
    }

    match read_json(&path) {
        Ok(raw) => {
            let table = parse_recommendations(raw);
            tracing::info!(path = %path.display(), anchors = table.len(), "recommendations loaded");
            let records = table.len();
            (table, SourceStatus::Loaded { path, records })
        }
        Err(e) => {
            tracing::warn!(error = %e, "recommendation file unreadable; recommendations disabled");
            (
                HashMap::new(),
                SourceStatus::ParseError {
                    path,
                    reason: e.to_string(),
                },
            )
        }
    }
}

fn find_matrix_file(data_dir: &Path) -> Option<PathBuf> {
    MATRIX_CANDIDATES
        .iter()
        .map(|name| data_dir.join(name))
        .find(|path| path.is_file())
}

fn read_json(path: &Path) -> Result<Value, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CatalogError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Index every object in `raw` (a list of records or an id→record map).
///
/// Non-object entries and records without a usable id are skipped.
fn index_products(catalog: &mut Catalog, raw: Value) {
    let entries: Vec<Value> = match raw {
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        _ => Vec::new(),
    };

    let mut skipped = 0usize;
    for entry in entries {
        let Value::Object(fields) = entry else {
            skipped += 1;
            continue;
        };
        let record = ProductRecord::new(fields);
        let id = record.catalog_id();
        if id == NULL_ID || id == MISSING_ID {
            skipped += 1;
            continue;
        }
        catalog.insert(id, record);
    }

    if skipped > 0 {
        tracing::debug!(skipped, "skipped matrix entries without a usable id");
    }
}

fn parse_recommendations(raw: Value) -> HashMap<String, Vec<RecommendationStub>> {
    let Value::Object(map) = raw else {
        tracing::warn!("recommendation file is not an object keyed by product id; ignoring");
        return HashMap::new();
    };

    map.into_iter()
        .filter_map(|(id, value)| {
            let stubs = value
                .as_array()?
                .iter()
                .filter_map(RecommendationStub::from_value)
                .collect();
            Some((id, stubs))
        })
        .collect()
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod tests;

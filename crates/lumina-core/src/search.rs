//! Staged product search.
//!
//! Stages run in order and the first one that produces results wins:
//!
//! 1. exact (case-insensitive) brand match
//! 2. recommendations of the first product whose name contains the query
//! 3. substring scoring over name and brand
//!
//! Every stage caps its output at [`MAX_RESULTS`].

use serde::Serialize;

use crate::catalog::{Catalog, ProductRecord};
use crate::normalize::{normalize_product, NormalizedProduct};

pub const MAX_RESULTS: usize = 20;

const NAME_MATCH_SCORE: u32 = 10;
const BRAND_MATCH_SCORE: u32 = 5;

/// Which stage produced a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStage {
    /// Blank query; nothing was evaluated.
    EmptyQuery,
    Brand,
    Recommendations,
    Scored,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub stage: SearchStage,
    pub products: Vec<NormalizedProduct>,
}

#[must_use]
pub fn search(catalog: &Catalog, query: &str) -> Vec<NormalizedProduct> {
    search_staged(catalog, query).products
}

/// Runs the staged search and reports which stage answered.
#[must_use]
pub fn search_staged(catalog: &Catalog, query: &str) -> SearchResults {
    let lowered = query.to_lowercase();
    let query = lowered.trim();
    if query.is_empty() {
        return SearchResults {
            stage: SearchStage::EmptyQuery,
            products: Vec::new(),
        };
    }

    let brand = brand_matches(catalog, query);
    if !brand.is_empty() {
        return finish(SearchStage::Brand, brand);
    }

    let recommended = recommended_for_anchor(catalog, query);
    if !recommended.is_empty() {
        return finish(SearchStage::Recommendations, recommended);
    }

    finish(SearchStage::Scored, scored_matches(catalog, query))
}

/// First [`MAX_RESULTS`] records in catalog order.
#[must_use]
pub fn top_products(catalog: &Catalog) -> Vec<NormalizedProduct> {
    catalog
        .iter()
        .take(MAX_RESULTS)
        .map(|(_, record)| normalize_product(record))
        .collect()
}

fn finish(stage: SearchStage, records: Vec<&ProductRecord>) -> SearchResults {
    SearchResults {
        stage,
        products: records
            .into_iter()
            .take(MAX_RESULTS)
            .map(normalize_product)
            .collect(),
    }
}

fn brand_matches<'a>(catalog: &'a Catalog, query: &str) -> Vec<&'a ProductRecord> {
    catalog
        .iter()
        .map(|(_, record)| record)
        .filter(|record| record.brand().is_some_and(|b| b.to_lowercase() == query))
        .take(MAX_RESULTS)
        .collect()
}

fn name_contains(record: &ProductRecord, query: &str) -> bool {
    record
        .name()
        .is_some_and(|n| n.to_lowercase().contains(query))
}

fn brand_contains(record: &ProductRecord, query: &str) -> bool {
    record
        .brand()
        .is_some_and(|b| b.to_lowercase().contains(query))
}

/// Resolves the anchor's recommendation stubs through the name index.
///
/// Only the first name match is considered as anchor.
fn recommended_for_anchor<'a>(catalog: &'a Catalog, query: &str) -> Vec<&'a ProductRecord> {
    let Some(anchor) = catalog
        .iter()
        .find(|(_, record)| name_contains(record, query))
        .map(|(id, _)| id)
    else {
        return Vec::new();
    };

    let Some(stubs) = catalog.recommendations_for(anchor) else {
        return Vec::new();
    };

    stubs
        .iter()
        .filter_map(|stub| stub.product_name.as_deref())
        .filter_map(|name| catalog.id_for_name(name))
        .filter_map(|id| catalog.get(id))
        .take(MAX_RESULTS)
        .collect()
}

fn scored_matches<'a>(catalog: &'a Catalog, query: &str) -> Vec<&'a ProductRecord> {
    let mut scored: Vec<(u32, &ProductRecord)> = catalog
        .iter()
        .filter_map(|(_, record)| {
            let mut score = 0;
            if name_contains(record, query) {
                score += NAME_MATCH_SCORE;
            }
            if brand_contains(record, query) {
                score += BRAND_MATCH_SCORE;
            }
            (score > 0).then_some((score, record))
        })
        .collect();

    // Stable: equal scores keep catalog order.
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(MAX_RESULTS)
        .map(|(_, record)| record)
        .collect()
}

#[cfg(test)]
#[path = "search_test.rs"]
mod tests;

//! In-memory product catalog: records in file order, the name index and the
//! recommendation table.
//!
//! A [`Catalog`] is built once by [`crate::load_catalog`] and never mutated
//! afterwards; reloads construct a new value and swap it in whole.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::normalize::NormalizedProduct;
use crate::search::{self, SearchResults};

/// Source field names as they appear in the product matrix.
pub mod fields {
    pub const NUMERIC_ID: &str = "product_id_numeric";
    pub const ID: &str = "product_id";
    pub const NAME: &str = "product_name";
    pub const BRAND: &str = "Brand";
    pub const RATING: &str = "rating";
    pub const ACTUAL_PRICE: &str = "actual_price";
    pub const DISCOUNTED_PRICE: &str = "discounted_price";
    pub const IMAGE_LINK: &str = "img_link";
    pub const PRODUCT_LINK: &str = "product_link";
}

/// Id text produced for a JSON `null` (or a missing numeric id on output).
pub const NULL_ID: &str = "None";
/// Id text used when a record carries neither id field.
pub const MISSING_ID: &str = "N/A";

/// A raw catalog entry, kept exactly as it appeared in the source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductRecord(Map<String, Value>);

impl ProductRecord {
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Scalar field rendered as text. `null`, arrays and objects count as absent.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<Cow<'_, str>> {
        match self.0.get(key)? {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Bool(b) => Some(Cow::Borrowed(title_case_bool(*b))),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<Cow<'_, str>> {
        self.text(fields::NAME)
    }

    #[must_use]
    pub fn brand(&self) -> Option<Cow<'_, str>> {
        self.text(fields::BRAND)
    }

    /// Catalog key: the numeric id if that key is present at all, else the
    /// generic id, else [`MISSING_ID`].
    #[must_use]
    pub fn catalog_id(&self) -> String {
        self.0
            .get(fields::NUMERIC_ID)
            .or_else(|| self.0.get(fields::ID))
            .map_or_else(|| MISSING_ID.to_string(), stringify_id)
    }
}

impl From<Map<String, Value>> for ProductRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Render an id value the way the data files' producers wrote ids out.
#[must_use]
pub fn stringify_id(value: &Value) -> String {
    match value {
        Value::Null => NULL_ID.to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => title_case_bool(*b).to_string(),
        other => other.to_string(),
    }
}

fn title_case_bool(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

/// A lightweight pointer from an anchor product to a recommended one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationStub {
    pub product_name: Option<String>,
}

impl RecommendationStub {
    /// Lenient decode: any JSON object is a stub, non-string names become `None`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(Self {
            product_name: object
                .get(fields::NAME)
                .and_then(Value::as_str)
                .map(ToOwned::to_owned),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<(String, ProductRecord)>,
    positions: HashMap<String, usize>,
    names: HashMap<String, String>,
    recommendations: HashMap<String, Vec<RecommendationStub>>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under `id`.
    ///
    /// A repeated id overwrites the earlier record but keeps its position.
    /// The trimmed name is bound to `id` in the name index, later bindings
    /// replacing earlier ones.
    pub fn insert(&mut self, id: String, record: ProductRecord) {
        let name_key = record
            .name()
            .map(|n| n.trim().to_string())
            .unwrap_or_default();

        if let Some(&pos) = self.positions.get(&id) {
            self.records[pos].1 = record;
        } else {
            self.positions.insert(id.clone(), self.records.len());
            self.records.push((id.clone(), record));
        }

        self.names.insert(name_key, id);
    }

    pub fn set_recommendations(&mut self, table: HashMap<String, Vec<RecommendationStub>>) {
        self.recommendations = table;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn recommendation_count(&self) -> usize {
        self.recommendations.len()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ProductRecord> {
        self.positions.get(id).map(|&pos| &self.records[pos].1)
    }

    /// Records in insertion order, paired with their catalog id.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProductRecord)> {
        self.records.iter().map(|(id, record)| (id.as_str(), record))
    }

    #[must_use]
    pub fn id_for_name(&self, name: &str) -> Option<&str> {
        self.names.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn recommendations_for(&self, id: &str) -> Option<&[RecommendationStub]> {
        self.recommendations.get(id).map(Vec::as_slice)
    }

    #[must_use]
    pub fn search(&self, query: &str) -> Vec<NormalizedProduct> {
        search::search(self, query)
    }

    #[must_use]
    pub fn search_staged(&self, query: &str) -> SearchResults {
        search::search_staged(self, query)
    }

    #[must_use]
    pub fn top_products(&self) -> Vec<NormalizedProduct> {
        search::top_products(self)
    }
}

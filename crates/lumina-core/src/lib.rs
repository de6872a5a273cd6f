pub mod app_config;
pub mod catalog;
pub mod config;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod search;

pub use app_config::{AppConfig, Environment};
pub use catalog::{Catalog, ProductRecord, RecommendationStub};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{CatalogError, ConfigError};
pub use loader::{load_catalog, LoadReport, SourceStatus};
pub use normalize::{normalize_product, NormalizedProduct};
pub use search::{search, search_staged, top_products, SearchResults, SearchStage, MAX_RESULTS};

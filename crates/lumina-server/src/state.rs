use std::path::{Path, PathBuf};
use std::sync::Arc;

use lumina_core::{load_catalog, Catalog, LoadReport};
use tokio::sync::RwLock;

/// Shared handle to the live catalog.
///
/// Readers take a snapshot `Arc` and release the lock before doing any work;
/// a reload builds the replacement off-lock and installs it with one write.
#[derive(Debug, Clone)]
pub struct CatalogHandle {
    current: Arc<RwLock<Arc<Catalog>>>,
    data_dir: Arc<Path>,
}

impl CatalogHandle {
    #[must_use]
    pub fn new(catalog: Catalog, data_dir: PathBuf) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(catalog))),
            data_dir: Arc::from(data_dir),
        }
    }

    /// Loads the catalog from `data_dir` on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns an error only if the blocking task panics or is cancelled.
    pub async fn load(data_dir: PathBuf) -> anyhow::Result<(Self, LoadReport)> {
        let (catalog, report) = load_blocking(data_dir.clone()).await?;
        Ok((Self::new(catalog, data_dir), report))
    }

    pub async fn snapshot(&self) -> Arc<Catalog> {
        Arc::clone(&*self.current.read().await)
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Re-reads the data directory and swaps the new catalog in.
    ///
    /// # Errors
    ///
    /// Returns an error only if the blocking task panics or is cancelled; the
    /// live catalog is left untouched in that case.
    pub async fn reload(&self) -> anyhow::Result<(Arc<Catalog>, LoadReport)> {
        let (catalog, report) = load_blocking(self.data_dir.to_path_buf()).await?;
        let catalog = Arc::new(catalog);
        *self.current.write().await = Arc::clone(&catalog);
        tracing::info!(
            products = catalog.len(),
            recommendations = catalog.recommendation_count(),
            "catalog reloaded"
        );
        Ok((catalog, report))
    }
}

async fn load_blocking(data_dir: PathBuf) -> anyhow::Result<(Catalog, LoadReport)> {
    Ok(tokio::task::spawn_blocking(move || load_catalog(&data_dir)).await?)
}

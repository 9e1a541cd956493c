//! Catalog file commands.

use std::path::Path;

use pideai_storefront::catalog::{CatalogError, JsonCatalog};
use thiserror::Error;

/// Errors that can occur while checking a catalog.
#[derive(Debug, Error)]
pub enum CatalogCheckError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("{0} modifier group(s) cannot be satisfied")]
    Invalid(usize),
}

/// Load a catalog and report every modifier group that would be hidden from
/// customers.
///
/// # Errors
///
/// Returns `CatalogCheckError::Invalid` if any group fails its checks, or
/// `CatalogCheckError::Catalog` if the file cannot be read.
pub async fn check(path: &Path) -> Result<(), CatalogCheckError> {
    let catalog = JsonCatalog::from_path(path).await?;
    let problems = catalog.check();

    for (product_id, problem) in &problems {
        tracing::warn!(%product_id, "{problem}");
    }

    if problems.is_empty() {
        tracing::info!(
            products = catalog.products().count(),
            "Catalog {} is valid",
            path.display()
        );
        Ok(())
    } else {
        Err(CatalogCheckError::Invalid(problems.len()))
    }
}

//! Seed the `PostgreSQL` catalog from a JSON file.
//!
//! The file is a JSON array of products in the wire format served by
//! `GET /api/v1/products`. Existing products are updated in place, so the
//! command can be re-run after editing the file.

use std::path::Path;

use tracing::info;

use qkart_storefront::db::{PgStore, Store, create_pool, load_catalog};

use super::{CommandError, database_url};

/// Load `file` and upsert every product.
///
/// The whole file is parsed and checked for duplicate ids before the
/// database is touched.
///
/// # Errors
///
/// Returns `CommandError` if the file is invalid or the database write fails.
pub async fn catalog(file: &Path, dry_run: bool) -> Result<(), CommandError> {
    info!(path = %file.display(), "Loading catalog");
    let products = load_catalog(file).await?;
    info!(products = products.len(), "Parsed catalog");

    if dry_run {
        info!("Dry run, nothing written");
        return Ok(());
    }

    let pool = create_pool(&database_url()?).await?;
    let store = Store::from(PgStore::new(pool));
    let written = store.upsert_products(&products).await?;

    info!(written, "Catalog seeded");
    Ok(())
}

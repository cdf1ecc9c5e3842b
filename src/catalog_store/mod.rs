mod error;
mod models;
mod schema;
mod store;
mod trait_def;
mod validation;

pub use error::{CatalogError, CatalogResult};
pub use models::*;
pub use schema::CATALOG_VERSIONED_SCHEMAS;
pub use store::SqliteListingStore;
pub use trait_def::ListingCatalogStore;
pub use validation::{ValidationError, MAX_PRICE_EXCLUSIVE, PRICE_SCALE};

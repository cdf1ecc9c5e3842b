//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestCatalog, APARTMENT_SLUG};
//!
//! #[test]
//! fn test_something() {
//!     let catalog = TestCatalog::seeded();
//!     let listing = catalog.create_listing("flat-1", catalog.ids.apartment, "1000");
//!     assert_eq!(listing.slug, "flat-1");
//! }
//! ```

mod constants;
mod fixtures;

pub use constants::*;
pub use fixtures::{SeededIds, TestCatalog};

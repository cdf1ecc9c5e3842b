//! Listing Catalog Library
//!
//! Persistence and admin layer for a real-estate listing catalog.

pub mod admin;
pub mod catalog_store;
pub mod config;
pub mod context;
pub mod sqlite_persistence;

//! Admin surface: generic list/get/add/change/delete over every catalog entity.

mod entities;
mod model;
mod registry;

pub use entities::{
    AssetCategoryAdmin, AssetTypeAdmin, ContactRequestAdmin, FeatureAdmin, ListingAdmin,
    ListingImageAdmin, LocationAdmin, UserAdmin,
};
pub use model::{AdminEntity, AdminError, AdminModel, AdminResult, ModelAdmin};
pub use registry::AdminRegistry;

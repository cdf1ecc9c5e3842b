use crate::admin::{
    AdminRegistry, AssetCategoryAdmin, AssetTypeAdmin, ContactRequestAdmin, FeatureAdmin,
    ListingAdmin, ListingImageAdmin, LocationAdmin, UserAdmin,
};
use crate::catalog_store::ListingCatalogStore;
use std::sync::Arc;
use tracing::info;

/// Everything an admin session needs: the store and the registered handlers.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn ListingCatalogStore>,
    pub admin: AdminRegistry,
}

impl AppContext {
    pub fn new(store: Arc<dyn ListingCatalogStore>) -> Self {
        let mut admin = AdminRegistry::new();
        admin.register_entity::<AssetCategoryAdmin>();
        admin.register_entity::<AssetTypeAdmin>();
        admin.register_entity::<LocationAdmin>();
        admin.register_entity::<ListingAdmin>();
        admin.register_entity::<ListingImageAdmin>();
        admin.register_entity::<FeatureAdmin>();
        admin.register_entity::<ContactRequestAdmin>();
        admin.register_entity::<UserAdmin>();
        info!("Registered {} admin models", admin.len());

        AppContext { store, admin }
    }
}

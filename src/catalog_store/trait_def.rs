//! ListingCatalogStore trait definition.
//!
//! Abstracts catalog persistence so the admin layer can be driven by any
//! backend; `SqliteListingStore` is the production implementation.

use super::error::CatalogResult;
use super::models::*;

/// Trait for listing catalog storage backends.
///
/// Every write runs in its own transaction, cascades included. Lookups of a
/// single row fail with `NotFound` rather than returning `None`.
pub trait ListingCatalogStore: Send + Sync {
    // =========================================================================
    // Users
    // =========================================================================

    fn create_user(&self, user: &NewUser) -> CatalogResult<User>;
    fn get_user(&self, id: i64) -> CatalogResult<User>;
    fn list_users(&self) -> CatalogResult<Vec<User>>;
    fn update_user(&self, id: i64, user: &NewUser) -> CatalogResult<User>;

    /// Deletes the user, their contact requests and every listing they sell.
    fn delete_user(&self, id: i64) -> CatalogResult<()>;

    // =========================================================================
    // Categories and Asset Types
    // =========================================================================

    fn create_category(&self, category: &NewCategory) -> CatalogResult<AssetCategory>;
    fn get_category(&self, id: i64) -> CatalogResult<AssetCategory>;
    fn list_categories(&self) -> CatalogResult<Vec<AssetCategory>>;
    fn update_category(&self, id: i64, category: &NewCategory) -> CatalogResult<AssetCategory>;

    /// Deletes the category together with its asset types and their listings.
    fn delete_category(&self, id: i64) -> CatalogResult<()>;

    fn create_asset_type(&self, asset_type: &NewAssetType) -> CatalogResult<AssetType>;
    fn get_asset_type(&self, id: i64) -> CatalogResult<AssetType>;
    fn list_asset_types(&self, category_id: Option<i64>) -> CatalogResult<Vec<AssetType>>;
    fn update_asset_type(&self, id: i64, asset_type: &NewAssetType) -> CatalogResult<AssetType>;

    /// Deletes the asset type and every listing of that type, with the
    /// listings' images, contact requests and feature memberships.
    fn delete_asset_type(&self, id: i64) -> CatalogResult<()>;

    // =========================================================================
    // Locations
    // =========================================================================

    fn create_location(&self, location: &NewLocation) -> CatalogResult<Location>;
    fn get_location(&self, id: i64) -> CatalogResult<Location>;
    fn list_locations(&self) -> CatalogResult<Vec<Location>>;
    fn update_location(&self, id: i64, location: &NewLocation) -> CatalogResult<Location>;

    /// Deletes the location; listings referencing it keep existing with no location.
    fn delete_location(&self, id: i64) -> CatalogResult<()>;

    // =========================================================================
    // Listings
    // =========================================================================

    fn create_listing(&self, listing: &NewListing) -> CatalogResult<Listing>;
    fn get_listing(&self, id: i64) -> CatalogResult<Listing>;
    fn update_listing(&self, id: i64, update: ListingUpdate) -> CatalogResult<Listing>;
    fn delete_listing(&self, id: i64) -> CatalogResult<()>;

    /// Listings matching `filter`, in creation order.
    fn list_listings(&self, filter: &ListingFilter) -> CatalogResult<Vec<Listing>>;

    // =========================================================================
    // Images
    // =========================================================================

    fn add_image(&self, image: &NewListingImage) -> CatalogResult<ListingImage>;
    fn get_image(&self, id: i64) -> CatalogResult<ListingImage>;
    fn list_images(&self) -> CatalogResult<Vec<ListingImage>>;
    fn listing_images(&self, listing_id: i64) -> CatalogResult<Vec<ListingImage>>;

    /// First image flagged as main, if any. Several may carry the flag.
    fn main_image(&self, listing_id: i64) -> CatalogResult<Option<ListingImage>>;
    fn update_image(&self, id: i64, image: &NewListingImage) -> CatalogResult<ListingImage>;
    fn delete_image(&self, id: i64) -> CatalogResult<()>;

    // =========================================================================
    // Features
    // =========================================================================

    fn create_feature(&self, feature: &NewFeature) -> CatalogResult<Feature>;
    fn get_feature(&self, id: i64) -> CatalogResult<Feature>;
    fn list_features(&self) -> CatalogResult<Vec<Feature>>;
    fn update_feature(&self, id: i64, feature: &NewFeature) -> CatalogResult<Feature>;
    fn delete_feature(&self, id: i64) -> CatalogResult<()>;

    /// Adds the feature to the listing. No-op if already attached.
    fn attach_feature(&self, listing_id: i64, feature_id: i64) -> CatalogResult<()>;

    /// Removes the feature from the listing. No-op if not attached.
    fn detach_feature(&self, listing_id: i64, feature_id: i64) -> CatalogResult<()>;

    fn listing_features(&self, listing_id: i64) -> CatalogResult<Vec<Feature>>;

    // =========================================================================
    // Contact Requests
    // =========================================================================

    fn create_contact_request(&self, request: &NewContactRequest)
        -> CatalogResult<ContactRequest>;
    fn get_contact_request(&self, id: i64) -> CatalogResult<ContactRequest>;
    fn list_contact_requests(&self, listing_id: Option<i64>)
        -> CatalogResult<Vec<ContactRequest>>;
    fn update_contact_request(
        &self,
        id: i64,
        update: &ContactRequestUpdate,
    ) -> CatalogResult<ContactRequest>;
    fn delete_contact_request(&self, id: i64) -> CatalogResult<()>;

    /// Marks the request as read. Marking an already read request is a no-op.
    fn mark_read(&self, id: i64) -> CatalogResult<()>;

    fn unread_contact_requests_count(&self, listing_id: i64) -> CatalogResult<usize>;

    // =========================================================================
    // Counts
    // =========================================================================

    fn counts(&self) -> CatalogResult<CatalogCounts>;
}

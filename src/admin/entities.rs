//! Admin handlers for the catalog entities.

use super::model::AdminEntity;
use crate::catalog_store::*;

pub struct UserAdmin;

impl AdminEntity for UserAdmin {
    type Record = User;
    type Draft = NewUser;
    type Changes = NewUser;

    const NAME: &'static str = "user";
    const VERBOSE_NAME_PLURAL: &'static str = "Users";

    fn list(store: &dyn ListingCatalogStore) -> CatalogResult<Vec<User>> {
        store.list_users()
    }

    fn get(store: &dyn ListingCatalogStore, id: i64) -> CatalogResult<User> {
        store.get_user(id)
    }

    fn create(store: &dyn ListingCatalogStore, draft: NewUser) -> CatalogResult<User> {
        store.create_user(&draft)
    }

    fn update(store: &dyn ListingCatalogStore, id: i64, changes: NewUser) -> CatalogResult<User> {
        store.update_user(id, &changes)
    }

    fn delete(store: &dyn ListingCatalogStore, id: i64) -> CatalogResult<()> {
        store.delete_user(id)
    }
}

pub struct AssetCategoryAdmin;

impl AdminEntity for AssetCategoryAdmin {
    type Record = AssetCategory;
    type Draft = NewCategory;
    type Changes = NewCategory;

    const NAME: &'static str = "assetcategory";
    const VERBOSE_NAME_PLURAL: &'static str = "Asset categories";

    fn list(store: &dyn ListingCatalogStore) -> CatalogResult<Vec<AssetCategory>> {
        store.list_categories()
    }

    fn get(store: &dyn ListingCatalogStore, id: i64) -> CatalogResult<AssetCategory> {
        store.get_category(id)
    }

    fn create(store: &dyn ListingCatalogStore, draft: NewCategory) -> CatalogResult<AssetCategory> {
        store.create_category(&draft)
    }

    fn update(
        store: &dyn ListingCatalogStore,
        id: i64,
        changes: NewCategory,
    ) -> CatalogResult<AssetCategory> {
        store.update_category(id, &changes)
    }

    fn delete(store: &dyn ListingCatalogStore, id: i64) -> CatalogResult<()> {
        store.delete_category(id)
    }
}

pub struct AssetTypeAdmin;

impl AdminEntity for AssetTypeAdmin {
    type Record = AssetType;
    type Draft = NewAssetType;
    type Changes = NewAssetType;

    const NAME: &'static str = "assettype";
    const VERBOSE_NAME_PLURAL: &'static str = "Asset types";

    fn list(store: &dyn ListingCatalogStore) -> CatalogResult<Vec<AssetType>> {
        store.list_asset_types(None)
    }

    fn get(store: &dyn ListingCatalogStore, id: i64) -> CatalogResult<AssetType> {
        store.get_asset_type(id)
    }

    fn create(store: &dyn ListingCatalogStore, draft: NewAssetType) -> CatalogResult<AssetType> {
        store.create_asset_type(&draft)
    }

    fn update(
        store: &dyn ListingCatalogStore,
        id: i64,
        changes: NewAssetType,
    ) -> CatalogResult<AssetType> {
        store.update_asset_type(id, &changes)
    }

    fn delete(store: &dyn ListingCatalogStore, id: i64) -> CatalogResult<()> {
        store.delete_asset_type(id)
    }
}

pub struct LocationAdmin;

impl AdminEntity for LocationAdmin {
    type Record = Location;
    type Draft = NewLocation;
    type Changes = NewLocation;

    const NAME: &'static str = "location";
    const VERBOSE_NAME_PLURAL: &'static str = "Locations";

    fn list(store: &dyn ListingCatalogStore) -> CatalogResult<Vec<Location>> {
        store.list_locations()
    }

    fn get(store: &dyn ListingCatalogStore, id: i64) -> CatalogResult<Location> {
        store.get_location(id)
    }

    fn create(store: &dyn ListingCatalogStore, draft: NewLocation) -> CatalogResult<Location> {
        store.create_location(&draft)
    }

    fn update(
        store: &dyn ListingCatalogStore,
        id: i64,
        changes: NewLocation,
    ) -> CatalogResult<Location> {
        store.update_location(id, &changes)
    }

    fn delete(store: &dyn ListingCatalogStore, id: i64) -> CatalogResult<()> {
        store.delete_location(id)
    }
}

pub struct ListingAdmin;

impl AdminEntity for ListingAdmin {
    type Record = Listing;
    type Draft = NewListing;
    type Changes = ListingUpdate;

    const NAME: &'static str = "listing";
    const VERBOSE_NAME_PLURAL: &'static str = "Listings";

    fn list(store: &dyn ListingCatalogStore) -> CatalogResult<Vec<Listing>> {
        store.list_listings(&ListingFilter::default())
    }

    fn get(store: &dyn ListingCatalogStore, id: i64) -> CatalogResult<Listing> {
        store.get_listing(id)
    }

    fn create(store: &dyn ListingCatalogStore, draft: NewListing) -> CatalogResult<Listing> {
        store.create_listing(&draft)
    }

    fn update(
        store: &dyn ListingCatalogStore,
        id: i64,
        changes: ListingUpdate,
    ) -> CatalogResult<Listing> {
        store.update_listing(id, changes)
    }

    fn delete(store: &dyn ListingCatalogStore, id: i64) -> CatalogResult<()> {
        store.delete_listing(id)
    }
}

pub struct ListingImageAdmin;

impl AdminEntity for ListingImageAdmin {
    type Record = ListingImage;
    type Draft = NewListingImage;
    type Changes = NewListingImage;

    const NAME: &'static str = "listingimage";
    const VERBOSE_NAME_PLURAL: &'static str = "Listing images";

    fn list(store: &dyn ListingCatalogStore) -> CatalogResult<Vec<ListingImage>> {
        store.list_images()
    }

    fn get(store: &dyn ListingCatalogStore, id: i64) -> CatalogResult<ListingImage> {
        store.get_image(id)
    }

    fn create(
        store: &dyn ListingCatalogStore,
        draft: NewListingImage,
    ) -> CatalogResult<ListingImage> {
        store.add_image(&draft)
    }

    fn update(
        store: &dyn ListingCatalogStore,
        id: i64,
        changes: NewListingImage,
    ) -> CatalogResult<ListingImage> {
        store.update_image(id, &changes)
    }

    fn delete(store: &dyn ListingCatalogStore, id: i64) -> CatalogResult<()> {
        store.delete_image(id)
    }
}

pub struct FeatureAdmin;

impl AdminEntity for FeatureAdmin {
    type Record = Feature;
    type Draft = NewFeature;
    type Changes = NewFeature;

    const NAME: &'static str = "feature";
    const VERBOSE_NAME_PLURAL: &'static str = "Features";

    fn list(store: &dyn ListingCatalogStore) -> CatalogResult<Vec<Feature>> {
        store.list_features()
    }

    fn get(store: &dyn ListingCatalogStore, id: i64) -> CatalogResult<Feature> {
        store.get_feature(id)
    }

    fn create(store: &dyn ListingCatalogStore, draft: NewFeature) -> CatalogResult<Feature> {
        store.create_feature(&draft)
    }

    fn update(
        store: &dyn ListingCatalogStore,
        id: i64,
        changes: NewFeature,
    ) -> CatalogResult<Feature> {
        store.update_feature(id, &changes)
    }

    fn delete(store: &dyn ListingCatalogStore, id: i64) -> CatalogResult<()> {
        store.delete_feature(id)
    }
}

pub struct ContactRequestAdmin;

impl AdminEntity for ContactRequestAdmin {
    type Record = ContactRequest;
    type Draft = NewContactRequest;
    type Changes = ContactRequestUpdate;

    const NAME: &'static str = "contactrequest";
    const VERBOSE_NAME_PLURAL: &'static str = "Contact requests";

    fn list(store: &dyn ListingCatalogStore) -> CatalogResult<Vec<ContactRequest>> {
        store.list_contact_requests(None)
    }

    fn get(store: &dyn ListingCatalogStore, id: i64) -> CatalogResult<ContactRequest> {
        store.get_contact_request(id)
    }

    fn create(
        store: &dyn ListingCatalogStore,
        draft: NewContactRequest,
    ) -> CatalogResult<ContactRequest> {
        store.create_contact_request(&draft)
    }

    fn update(
        store: &dyn ListingCatalogStore,
        id: i64,
        changes: ContactRequestUpdate,
    ) -> CatalogResult<ContactRequest> {
        store.update_contact_request(id, &changes)
    }

    fn delete(store: &dyn ListingCatalogStore, id: i64) -> CatalogResult<()> {
        store.delete_contact_request(id)
    }
}

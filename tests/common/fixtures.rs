//! Scratch catalog databases for tests.

#![allow(dead_code)]

use super::constants::*;
use listing_catalog::catalog_store::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;

/// Ids of the rows created by `TestCatalog::seeded`.
#[derive(Clone, Copy, Debug)]
pub struct SeededIds {
    pub seller: i64,
    pub buyer: i64,
    pub residential: i64,
    pub commercial: i64,
    pub apartment: i64,
    pub house: i64,
    pub office: i64,
    pub lisbon: i64,
    pub porto: i64,
}

/// A store on a temporary database file, deleted on drop.
pub struct TestCatalog {
    pub store: Arc<SqliteListingStore>,
    pub ids: SeededIds,
    // Held for its Drop
    _temp_dir: TempDir,
}

fn category(name: &str, slug: &str) -> NewCategory {
    NewCategory {
        name: name.to_string(),
        slug: slug.to_string(),
        icon: None,
    }
}

fn asset_type(category_id: i64, name: &str, slug: &str) -> NewAssetType {
    NewAssetType {
        category_id,
        name: name.to_string(),
        slug: slug.to_string(),
    }
}

fn location(city: &str, address: &str) -> NewLocation {
    NewLocation {
        city: city.to_string(),
        district: None,
        region: None,
        address: Some(address.to_string()),
        latitude: None,
        longitude: None,
    }
}

impl TestCatalog {
    /// Empty catalog.
    pub fn empty() -> (TempDir, SqliteListingStore) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = SqliteListingStore::new(temp_dir.path().join("catalog.db"), 2)
            .expect("Failed to open catalog store");
        (temp_dir, store)
    }

    /// Catalog with two users, two categories with three asset types, and two
    /// locations. No listings.
    pub fn seeded() -> Self {
        let (temp_dir, store) = Self::empty();

        let seller = store
            .create_user(&NewUser {
                handle: SELLER_HANDLE.to_string(),
            })
            .unwrap();
        let buyer = store
            .create_user(&NewUser {
                handle: BUYER_HANDLE.to_string(),
            })
            .unwrap();

        let residential = store
            .create_category(&category("Residential", RESIDENTIAL_SLUG))
            .unwrap();
        let commercial = store
            .create_category(&category("Commercial", COMMERCIAL_SLUG))
            .unwrap();

        let apartment = store
            .create_asset_type(&asset_type(residential.id, "Apartment", APARTMENT_SLUG))
            .unwrap();
        let house = store
            .create_asset_type(&asset_type(residential.id, "House", HOUSE_SLUG))
            .unwrap();
        let office = store
            .create_asset_type(&asset_type(commercial.id, "Office", OFFICE_SLUG))
            .unwrap();

        let lisbon = store
            .create_location(&location(LISBON, "Rua Augusta 1"))
            .unwrap();
        let porto = store
            .create_location(&location(PORTO, "Rua de Santa Catarina 2"))
            .unwrap();

        TestCatalog {
            store: Arc::new(store),
            ids: SeededIds {
                seller: seller.id,
                buyer: buyer.id,
                residential: residential.id,
                commercial: commercial.id,
                apartment: apartment.id,
                house: house.id,
                office: office.id,
                lisbon: lisbon.id,
                porto: porto.id,
            },
            _temp_dir: temp_dir,
        }
    }

    /// A valid listing draft sold by the seeded seller, with no location.
    pub fn draft(&self, slug: &str, asset_type_id: i64, price: &str) -> NewListing {
        NewListing {
            title: format!("Listing {}", slug),
            slug: slug.to_string(),
            description: String::new(),
            price: Decimal::from_str(price).unwrap(),
            is_negotiable: false,
            area: 50.0,
            rooms: Some(2),
            floor: None,
            total_floors: None,
            year_built: None,
            condition: String::new(),
            status: ListingStatus::Available,
            asset_type_id,
            location_id: None,
            seller_id: self.ids.seller,
        }
    }

    pub fn create_listing(&self, slug: &str, asset_type_id: i64, price: &str) -> Listing {
        self.store
            .create_listing(&self.draft(slug, asset_type_id, price))
            .unwrap()
    }

    pub fn create_listing_in(&self, slug: &str, location_id: i64) -> Listing {
        let mut draft = self.draft(slug, self.ids.apartment, "100000");
        draft.location_id = Some(location_id);
        self.store.create_listing(&draft).unwrap()
    }

    pub fn request_contact(&self, listing_id: i64, message: &str) -> ContactRequest {
        self.store
            .create_contact_request(&NewContactRequest {
                listing_id,
                user_id: self.ids.buyer,
                message: message.to_string(),
                phone: String::new(),
            })
            .unwrap()
    }

    pub fn add_image(&self, listing_id: i64, image: &str, is_main: bool) -> ListingImage {
        self.store
            .add_image(&NewListingImage {
                listing_id,
                image: image.to_string(),
                is_main,
            })
            .unwrap()
    }
}

//! Integration tests for the admin registry.
//!
//! Drives every operation through JSON, the way the admin shell does.

mod common;

use common::{TestCatalog, LISBON};
use listing_catalog::admin::AdminError;
use listing_catalog::catalog_store::{CatalogError, ListingCatalogStore};
use listing_catalog::context::AppContext;
use serde_json::json;

fn context(catalog: &TestCatalog) -> AppContext {
    AppContext::new(catalog.store.clone())
}

#[test]
fn test_all_catalog_models_registered() {
    let catalog = TestCatalog::seeded();
    let ctx = context(&catalog);

    assert_eq!(
        ctx.admin.names(),
        vec![
            "assetcategory",
            "assettype",
            "contactrequest",
            "feature",
            "listing",
            "listingimage",
            "location",
            "user",
        ]
    );
    assert_eq!(
        ctx.admin.get("assetcategory").unwrap().verbose_name_plural(),
        "Asset categories"
    );
}

#[test]
fn test_unknown_model_error() {
    let catalog = TestCatalog::seeded();
    let ctx = context(&catalog);

    match ctx.admin.get("property") {
        Err(AdminError::UnknownModel(name)) => assert_eq!(name, "property"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("legacy model must not be registered"),
    }
}

#[test]
fn test_feature_add_change_delete() {
    let catalog = TestCatalog::seeded();
    let ctx = context(&catalog);
    let store = ctx.store.as_ref();
    let features = ctx.admin.get("feature").unwrap();

    let added = features.add(store, json!({"name": "Garage"})).unwrap();
    let id = added["id"].as_i64().unwrap();
    assert_eq!(added["name"], "Garage");

    let changed = features
        .change(store, id, json!({"name": "Double garage"}))
        .unwrap();
    assert_eq!(changed, json!({"id": id, "name": "Double garage"}));
    assert_eq!(features.list(store).unwrap(), vec![changed]);

    features.delete(store, id).unwrap();
    match features.get(store, id) {
        Err(AdminError::Catalog(CatalogError::NotFound { entity, .. })) => {
            assert_eq!(entity, "Feature")
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn test_listing_add_and_partial_change() {
    let catalog = TestCatalog::seeded();
    let ctx = context(&catalog);
    let store = ctx.store.as_ref();
    let listings = ctx.admin.get("listing").unwrap();

    let added = listings
        .add(
            store,
            json!({
                "title": "Riverside loft",
                "slug": "riverside-loft",
                "price": "250000.00",
                "area": 72.5,
                "rooms": 3,
                "asset_type_id": catalog.ids.apartment,
                "location_id": catalog.ids.lisbon,
                "seller_id": catalog.ids.seller,
            }),
        )
        .unwrap();
    let id = added["id"].as_i64().unwrap();
    assert_eq!(added["status"], "available");
    assert_eq!(added["price"], "250000.00");

    let changed = listings
        .change(store, id, json!({"status": "reserved", "location_id": null}))
        .unwrap();
    assert_eq!(changed["status"], "reserved");
    assert_eq!(changed["location_id"], json!(null));
    assert_eq!(changed["title"], added["title"]);
    assert_eq!(changed["created_at"], added["created_at"]);

    let stored = catalog.store.get_listing(id).unwrap();
    assert_eq!(stored.location_id, None);
    assert_eq!(stored.rooms, Some(3));
}

#[test]
fn test_invalid_payloads_rejected() {
    let catalog = TestCatalog::seeded();
    let ctx = context(&catalog);
    let store = ctx.store.as_ref();
    let locations = ctx.admin.get("location").unwrap();

    // Missing required city
    let err = locations.add(store, json!({"address": "Nowhere"})).unwrap_err();
    assert!(matches!(err, AdminError::InvalidPayload(_)));

    // Well-formed but invalid
    let err = locations
        .add(store, json!({"city": LISBON, "latitude": 120.0, "longitude": 0.0}))
        .unwrap_err();
    assert!(matches!(
        err,
        AdminError::Catalog(CatalogError::Validation(_))
    ));

    let err = locations
        .change(store, catalog.ids.lisbon, json!("not an object"))
        .unwrap_err();
    assert!(matches!(err, AdminError::InvalidPayload(_)));
}

#[test]
fn test_duplicate_slug_through_admin() {
    let catalog = TestCatalog::seeded();
    let ctx = context(&catalog);
    let store = ctx.store.as_ref();
    let asset_types = ctx.admin.get("assettype").unwrap();

    let err = asset_types
        .add(
            store,
            json!({"category_id": catalog.ids.commercial, "name": "Warehouse", "slug": "house"}),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        AdminError::Catalog(CatalogError::UniqueConstraintViolation { .. })
    ));
}

#[test]
fn test_contact_request_marked_read_via_change() {
    let catalog = TestCatalog::seeded();
    let listing = catalog.create_listing("flat", catalog.ids.apartment, "1000");
    let request = catalog.request_contact(listing.id, "Still available?");

    let ctx = context(&catalog);
    let store = ctx.store.as_ref();
    let requests = ctx.admin.get("contactrequest").unwrap();

    let changed = requests
        .change(store, request.id, json!({"is_read": true}))
        .unwrap();
    assert_eq!(changed["is_read"], true);
    assert_eq!(changed["message"], "Still available?");
    assert_eq!(
        ctx.store.unread_contact_requests_count(listing.id).unwrap(),
        0
    );
}

#[test]
fn test_delete_category_through_admin_cascades() {
    let catalog = TestCatalog::seeded();
    catalog.create_listing("villa", catalog.ids.house, "5000");

    let ctx = context(&catalog);
    let store = ctx.store.as_ref();
    ctx.admin
        .get("assetcategory")
        .unwrap()
        .delete(store, catalog.ids.residential)
        .unwrap();

    assert!(ctx.admin.get("listing").unwrap().list(store).unwrap().is_empty());
    assert_eq!(
        ctx.admin.get("assettype").unwrap().list(store).unwrap().len(),
        1
    );
}

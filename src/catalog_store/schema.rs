//! SQLite schema for the listing catalog.
//!
//! Primary keys are integer rowids, so ascending `id` is creation order.
//! Prices are stored as integer cents.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

const USER_FK: ForeignKey = ForeignKey {
    foreign_table: "users",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const CATEGORY_FK: ForeignKey = ForeignKey {
    foreign_table: "asset_categories",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const ASSET_TYPE_FK: ForeignKey = ForeignKey {
    foreign_table: "asset_types",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const LOCATION_FK: ForeignKey = ForeignKey {
    foreign_table: "locations",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::SetNull,
};

const LISTING_FK: ForeignKey = ForeignKey {
    foreign_table: "listings",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const FEATURE_FK: ForeignKey = ForeignKey {
    foreign_table: "features",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

// =============================================================================
// Core Tables
// =============================================================================

const USERS_TABLE: Table = Table {
    name: "users",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_autoincrement = true
        ),
        sqlite_column!("handle", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

const ASSET_CATEGORIES_TABLE: Table = Table {
    name: "asset_categories",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_autoincrement = true
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("slug", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("icon", &SqlType::Text),
    ],
    indices: &[],
    unique_constraints: &[],
};

const ASSET_TYPES_TABLE: Table = Table {
    name: "asset_types",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_autoincrement = true
        ),
        sqlite_column!(
            "category_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&CATEGORY_FK)
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("slug", &SqlType::Text, non_null = true, is_unique = true),
    ],
    indices: &[("idx_asset_types_category", "category_id")],
    unique_constraints: &[],
};

const LOCATIONS_TABLE: Table = Table {
    name: "locations",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_autoincrement = true
        ),
        sqlite_column!("city", &SqlType::Text, non_null = true),
        sqlite_column!("district", &SqlType::Text),
        sqlite_column!("region", &SqlType::Text),
        sqlite_column!("address", &SqlType::Text),
        sqlite_column!("latitude", &SqlType::Real),
        sqlite_column!("longitude", &SqlType::Real),
    ],
    indices: &[("idx_locations_city", "city COLLATE NOCASE")],
    unique_constraints: &[],
};

const LISTINGS_TABLE: Table = Table {
    name: "listings",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_autoincrement = true
        ),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("slug", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!(
            "description",
            &SqlType::Text,
            non_null = true,
            default_value = Some("''")
        ),
        sqlite_column!("price_cents", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "is_negotiable",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("area", &SqlType::Real, non_null = true),
        sqlite_column!("rooms", &SqlType::Integer),
        sqlite_column!("floor", &SqlType::Integer),
        sqlite_column!("total_floors", &SqlType::Integer),
        sqlite_column!("year_built", &SqlType::Integer),
        sqlite_column!(
            "condition",
            &SqlType::Text,
            non_null = true,
            default_value = Some("''")
        ),
        sqlite_column!(
            "status",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'available'")
        ), // 'available', 'sold', 'reserved', 'archived'
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "asset_type_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ASSET_TYPE_FK)
        ),
        sqlite_column!(
            "location_id",
            &SqlType::Integer,
            foreign_key = Some(&LOCATION_FK)
        ),
        sqlite_column!(
            "seller_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
    ],
    indices: &[
        ("idx_listings_asset_type", "asset_type_id"),
        ("idx_listings_location", "location_id"),
        ("idx_listings_seller", "seller_id"),
        ("idx_listings_status", "status"),
        ("idx_listings_price", "price_cents"),
    ],
    unique_constraints: &[],
};

const LISTING_IMAGES_TABLE: Table = Table {
    name: "listing_images",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_autoincrement = true
        ),
        sqlite_column!(
            "listing_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&LISTING_FK)
        ),
        sqlite_column!("image", &SqlType::Text, non_null = true),
        sqlite_column!(
            "is_main",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[("idx_listing_images_listing", "listing_id")],
    unique_constraints: &[],
};

const FEATURES_TABLE: Table = Table {
    name: "features",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_autoincrement = true
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

const CONTACT_REQUESTS_TABLE: Table = Table {
    name: "contact_requests",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_autoincrement = true
        ),
        sqlite_column!(
            "listing_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&LISTING_FK)
        ),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USER_FK)
        ),
        sqlite_column!("message", &SqlType::Text, non_null = true),
        sqlite_column!(
            "phone",
            &SqlType::Text,
            non_null = true,
            default_value = Some("''")
        ),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "is_read",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[
        ("idx_contact_requests_listing", "listing_id"),
        ("idx_contact_requests_user", "user_id"),
    ],
    unique_constraints: &[],
};

// =============================================================================
// Junction Tables
// =============================================================================

/// Listing <-> Feature membership
const LISTING_FEATURES_TABLE: Table = Table {
    name: "listing_features",
    columns: &[
        sqlite_column!(
            "listing_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&LISTING_FK)
        ),
        sqlite_column!(
            "feature_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&FEATURE_FK)
        ),
    ],
    indices: &[("idx_listing_features_feature", "feature_id")],
    unique_constraints: &[&["listing_id", "feature_id"]],
};

// =============================================================================
// Versioned Schema Definition
// =============================================================================

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        USERS_TABLE,
        ASSET_CATEGORIES_TABLE,
        ASSET_TYPES_TABLE,
        LOCATIONS_TABLE,
        LISTINGS_TABLE,
        LISTING_IMAGES_TABLE,
        FEATURES_TABLE,
        CONTACT_REQUESTS_TABLE,
        LISTING_FEATURES_TABLE,
    ],
    migration: None,
}];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::{params, Connection};

    fn fresh_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        CATALOG_VERSIONED_SCHEMAS[0].create(&conn).unwrap();
        conn
    }

    #[test]
    fn test_schema_creates_successfully() {
        let conn = fresh_db();
        CATALOG_VERSIONED_SCHEMAS[0].validate(&conn).unwrap();
    }

    #[test]
    fn test_listing_defaults_applied() {
        let conn = fresh_db();
        conn.execute("INSERT INTO users (handle) VALUES ('seller')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO asset_categories (name, slug) VALUES ('Residential', 'residential')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO asset_types (category_id, name, slug) VALUES (1, 'Apartment', 'apartment')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO listings (title, slug, price_cents, area, asset_type_id, seller_id)
             VALUES ('Flat', 'flat', 100000, 50.0, 1, 1)",
            [],
        )
        .unwrap();

        let (status, is_negotiable, created_at): (String, i32, i64) = conn
            .query_row(
                "SELECT status, is_negotiable, created_at FROM listings WHERE id = 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!(status, "available");
        assert_eq!(is_negotiable, 0);
        assert!(created_at > 0);
    }

    #[test]
    fn test_feature_membership_is_unique() {
        let conn = fresh_db();
        conn.execute("INSERT INTO users (handle) VALUES ('seller')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO asset_categories (name, slug) VALUES ('Land', 'land')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO asset_types (category_id, name, slug) VALUES (1, 'Plot', 'plot')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO listings (title, slug, price_cents, area, asset_type_id, seller_id)
             VALUES ('Plot', 'plot-1', 100, 500.0, 1, 1)",
            [],
        )
        .unwrap();
        conn.execute("INSERT INTO features (name) VALUES ('Garden')", [])
            .unwrap();

        conn.execute(
            "INSERT INTO listing_features (listing_id, feature_id) VALUES (?1, ?2)",
            params![1, 1],
        )
        .unwrap();
        assert!(conn
            .execute(
                "INSERT INTO listing_features (listing_id, feature_id) VALUES (?1, ?2)",
                params![1, 1],
            )
            .is_err());
    }
}

//! SQLite-backed listing catalog store.
//!
//! One write connection serializes all writes, each in its own IMMEDIATE
//! transaction. Reads go through a small round-robin pool of read-only
//! connections, which WAL mode lets run alongside the writer.

use super::error::{CatalogError, CatalogResult};
use super::models::*;
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use super::trait_def::ListingCatalogStore;
use super::validation::{self, ValidationError};
use crate::sqlite_persistence;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OpenFlags, Params, Row, TransactionBehavior};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

const USER: &str = "User";
const CATEGORY: &str = "AssetCategory";
const ASSET_TYPE: &str = "AssetType";
const LOCATION: &str = "Location";
const LISTING: &str = "Listing";
const IMAGE: &str = "ListingImage";
const FEATURE: &str = "Feature";
const CONTACT_REQUEST: &str = "ContactRequest";

const USER_COLUMNS: &str = "id, handle, created_at";
const CATEGORY_COLUMNS: &str = "id, name, slug, icon";
const ASSET_TYPE_COLUMNS: &str = "id, category_id, name, slug";
const LOCATION_COLUMNS: &str = "id, city, district, region, address, latitude, longitude";
const LISTING_COLUMNS: &str = "l.id, l.title, l.slug, l.description, l.price_cents, \
     l.is_negotiable, l.area, l.rooms, l.floor, l.total_floors, l.year_built, l.condition, \
     l.status, l.created_at, l.asset_type_id, l.location_id, l.seller_id";
const IMAGE_COLUMNS: &str = "id, listing_id, image, is_main";
const FEATURE_COLUMNS: &str = "id, name";
const CONTACT_REQUEST_COLUMNS: &str =
    "id, listing_id, user_id, message, phone, created_at, is_read";

/// SQLite-backed listing catalog store.
#[derive(Clone)]
pub struct SqliteListingStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    write_conn: Arc<Mutex<Connection>>,
    read_index: Arc<AtomicUsize>,
    db_path: PathBuf,
}

fn lock(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    // A panic mid-transaction drops the Transaction, which rolls back, so the
    // connection behind a poisoned lock is still consistent.
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SqliteListingStore {
    /// Open (creating if needed) the catalog database at `db_path`.
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file
    /// * `read_pool_size` - Number of read-only connections (at least one is opened)
    pub fn new<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open catalog database {:?}", db_path))?;

        write_conn.pragma_update(None, "foreign_keys", "ON")?;
        sqlite_persistence::bootstrap(&mut write_conn, CATALOG_VERSIONED_SCHEMAS, "catalog")?;
        write_conn.pragma_update(None, "journal_mode", "WAL")?;

        let pool_size = read_pool_size.max(1);
        let mut read_pool = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let read_conn = Connection::open_with_flags(
                db_path,
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .context("Failed to open catalog read connection")?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        let store = SqliteListingStore {
            read_pool,
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_index: Arc::new(AtomicUsize::new(0)),
            db_path: db_path.to_path_buf(),
        };

        let counts = store.counts()?;
        info!(
            "Opened listing catalog {:?}: {} categories, {} asset types, {} listings, {} contact requests",
            db_path, counts.categories, counts.asset_types, counts.listings, counts.contact_requests
        );
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    fn read<T>(&self, f: impl FnOnce(&Connection) -> CatalogResult<T>) -> CatalogResult<T> {
        let read_conn = self.get_read_conn();
        let conn = lock(&read_conn);
        f(&conn)
    }

    /// Run `f` in one IMMEDIATE transaction; any error rolls everything back.
    fn write<T>(&self, f: impl FnOnce(&Connection) -> CatalogResult<T>) -> CatalogResult<T> {
        let mut conn = lock(&self.write_conn);
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    // =========================================================================
    // Internal Helper Methods
    // =========================================================================

    fn fetch_one<T>(
        conn: &Connection,
        sql: &str,
        id: i64,
        entity: &'static str,
        parse: fn(&Row) -> rusqlite::Result<T>,
    ) -> CatalogResult<T> {
        let mut stmt = conn.prepare_cached(sql)?;
        match stmt.query_row(params![id], parse) {
            Ok(value) => Ok(value),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(CatalogError::not_found(entity, id)),
            Err(e) => Err(e.into()),
        }
    }

    fn fetch_all<T, P: Params>(
        conn: &Connection,
        sql: &str,
        params: P,
        parse: fn(&Row) -> rusqlite::Result<T>,
    ) -> CatalogResult<Vec<T>> {
        let mut stmt = conn.prepare_cached(sql)?;
        let rows = stmt
            .query_map(params, parse)?
            .collect::<Result<Vec<T>, _>>()?;
        Ok(rows)
    }

    fn exists(conn: &Connection, table: &str, id: i64) -> CatalogResult<bool> {
        Ok(conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", table),
            params![id],
            |r| r.get(0),
        )?)
    }

    fn require(conn: &Connection, table: &str, entity: &'static str, id: i64) -> CatalogResult<()> {
        if Self::exists(conn, table, id)? {
            Ok(())
        } else {
            Err(CatalogError::not_found(entity, id))
        }
    }

    /// Fails if another row (other than `except_id`) already has `value` in `column`.
    fn ensure_unique(
        conn: &Connection,
        table: &str,
        column: &str,
        value: &str,
        entity: &'static str,
        except_id: Option<i64>,
    ) -> CatalogResult<()> {
        let taken: bool = conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1 AND id IS NOT ?2)",
                table, column
            ),
            params![value, except_id],
            |r| r.get(0),
        )?;
        if taken {
            return Err(CatalogError::duplicate(entity, column, value));
        }
        Ok(())
    }

    fn count(conn: &Connection, table: &str) -> CatalogResult<usize> {
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))?;
        Ok(count as usize)
    }

    fn timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
        let secs: i64 = row.get(idx)?;
        DateTime::from_timestamp(secs, 0)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, secs))
    }

    fn price_to_cents(price: Decimal) -> CatalogResult<i64> {
        (price * Decimal::ONE_HUNDRED).trunc().to_i64().ok_or_else(|| {
            ValidationError::OutOfRange {
                field: "price",
                value: price.to_f64().unwrap_or(f64::MAX),
                min: 0.0,
                max: validation::MAX_PRICE_EXCLUSIVE as f64,
            }
            .into()
        })
    }

    fn cents_to_price(cents: i64) -> Decimal {
        Decimal::new(cents, validation::PRICE_SCALE)
    }

    /// Lower bound in cents, rounding up so a listing is never below `min`.
    fn min_bound_cents(min: Decimal) -> i64 {
        (min * Decimal::ONE_HUNDRED)
            .ceil()
            .to_i64()
            .unwrap_or(if min.is_sign_negative() { i64::MIN } else { i64::MAX })
    }

    /// Upper bound in cents, rounding down so a listing is never above `max`.
    fn max_bound_cents(max: Decimal) -> i64 {
        (max * Decimal::ONE_HUNDRED)
            .floor()
            .to_i64()
            .unwrap_or(if max.is_sign_negative() { i64::MIN } else { i64::MAX })
    }

    // =========================================================================
    // Row Parsing
    // =========================================================================

    fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            handle: row.get(1)?,
            created_at: Self::timestamp_at(row, 2)?,
        })
    }

    fn parse_category_row(row: &Row) -> rusqlite::Result<AssetCategory> {
        Ok(AssetCategory {
            id: row.get(0)?,
            name: row.get(1)?,
            slug: row.get(2)?,
            icon: row.get(3)?,
        })
    }

    fn parse_asset_type_row(row: &Row) -> rusqlite::Result<AssetType> {
        Ok(AssetType {
            id: row.get(0)?,
            category_id: row.get(1)?,
            name: row.get(2)?,
            slug: row.get(3)?,
        })
    }

    fn parse_location_row(row: &Row) -> rusqlite::Result<Location> {
        Ok(Location {
            id: row.get(0)?,
            city: row.get(1)?,
            district: row.get(2)?,
            region: row.get(3)?,
            address: row.get(4)?,
            latitude: row.get(5)?,
            longitude: row.get(6)?,
        })
    }

    fn parse_listing_row(row: &Row) -> rusqlite::Result<Listing> {
        let status_str: String = row.get(12)?;
        let status = ListingStatus::from_db_str(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                12,
                Type::Text,
                format!("unknown listing status '{}'", status_str).into(),
            )
        })?;

        Ok(Listing {
            id: row.get(0)?,
            title: row.get(1)?,
            slug: row.get(2)?,
            description: row.get(3)?,
            price: Self::cents_to_price(row.get(4)?),
            is_negotiable: row.get(5)?,
            area: row.get(6)?,
            rooms: row.get(7)?,
            floor: row.get(8)?,
            total_floors: row.get(9)?,
            year_built: row.get(10)?,
            condition: row.get(11)?,
            status,
            created_at: Self::timestamp_at(row, 13)?,
            asset_type_id: row.get(14)?,
            location_id: row.get(15)?,
            seller_id: row.get(16)?,
        })
    }

    fn parse_image_row(row: &Row) -> rusqlite::Result<ListingImage> {
        Ok(ListingImage {
            id: row.get(0)?,
            listing_id: row.get(1)?,
            image: row.get(2)?,
            is_main: row.get(3)?,
        })
    }

    fn parse_feature_row(row: &Row) -> rusqlite::Result<Feature> {
        Ok(Feature {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }

    fn parse_contact_request_row(row: &Row) -> rusqlite::Result<ContactRequest> {
        Ok(ContactRequest {
            id: row.get(0)?,
            listing_id: row.get(1)?,
            user_id: row.get(2)?,
            message: row.get(3)?,
            phone: row.get(4)?,
            created_at: Self::timestamp_at(row, 5)?,
            is_read: row.get(6)?,
        })
    }

    // =========================================================================
    // Single-row Reads (usable inside a write transaction)
    // =========================================================================

    fn user_inner(conn: &Connection, id: i64) -> CatalogResult<User> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        Self::fetch_one(conn, &sql, id, USER, Self::parse_user_row)
    }

    fn category_inner(conn: &Connection, id: i64) -> CatalogResult<AssetCategory> {
        let sql = format!("SELECT {} FROM asset_categories WHERE id = ?1", CATEGORY_COLUMNS);
        Self::fetch_one(conn, &sql, id, CATEGORY, Self::parse_category_row)
    }

    fn asset_type_inner(conn: &Connection, id: i64) -> CatalogResult<AssetType> {
        let sql = format!("SELECT {} FROM asset_types WHERE id = ?1", ASSET_TYPE_COLUMNS);
        Self::fetch_one(conn, &sql, id, ASSET_TYPE, Self::parse_asset_type_row)
    }

    fn location_inner(conn: &Connection, id: i64) -> CatalogResult<Location> {
        let sql = format!("SELECT {} FROM locations WHERE id = ?1", LOCATION_COLUMNS);
        Self::fetch_one(conn, &sql, id, LOCATION, Self::parse_location_row)
    }

    fn listing_inner(conn: &Connection, id: i64) -> CatalogResult<Listing> {
        let sql = format!("SELECT {} FROM listings l WHERE l.id = ?1", LISTING_COLUMNS);
        Self::fetch_one(conn, &sql, id, LISTING, Self::parse_listing_row)
    }

    fn image_inner(conn: &Connection, id: i64) -> CatalogResult<ListingImage> {
        let sql = format!("SELECT {} FROM listing_images WHERE id = ?1", IMAGE_COLUMNS);
        Self::fetch_one(conn, &sql, id, IMAGE, Self::parse_image_row)
    }

    fn feature_inner(conn: &Connection, id: i64) -> CatalogResult<Feature> {
        let sql = format!("SELECT {} FROM features WHERE id = ?1", FEATURE_COLUMNS);
        Self::fetch_one(conn, &sql, id, FEATURE, Self::parse_feature_row)
    }

    fn contact_request_inner(conn: &Connection, id: i64) -> CatalogResult<ContactRequest> {
        let sql = format!(
            "SELECT {} FROM contact_requests WHERE id = ?1",
            CONTACT_REQUEST_COLUMNS
        );
        Self::fetch_one(conn, &sql, id, CONTACT_REQUEST, Self::parse_contact_request_row)
    }

    // =========================================================================
    // Write Helpers
    // =========================================================================

    fn check_category(conn: &Connection, category: &NewCategory, except_id: Option<i64>) -> CatalogResult<()> {
        validation::require_non_empty("name", &category.name)?;
        validation::validate_slug(&category.slug)?;
        Self::ensure_unique(conn, "asset_categories", "name", &category.name, CATEGORY, except_id)?;
        Self::ensure_unique(conn, "asset_categories", "slug", &category.slug, CATEGORY, except_id)
    }

    fn check_asset_type(conn: &Connection, asset_type: &NewAssetType, except_id: Option<i64>) -> CatalogResult<()> {
        validation::require_non_empty("name", &asset_type.name)?;
        validation::validate_slug(&asset_type.slug)?;
        Self::require(conn, "asset_categories", CATEGORY, asset_type.category_id)?;
        Self::ensure_unique(conn, "asset_types", "slug", &asset_type.slug, ASSET_TYPE, except_id)
    }

    /// Field validation plus every reference a listing holds.
    fn check_listing(conn: &Connection, listing: &NewListing, except_id: Option<i64>) -> CatalogResult<()> {
        validation::validate_listing(listing)?;
        Self::require(conn, "asset_types", ASSET_TYPE, listing.asset_type_id)?;
        Self::require(conn, "users", USER, listing.seller_id)?;
        if let Some(location_id) = listing.location_id {
            Self::require(conn, "locations", LOCATION, location_id)?;
        }
        Self::ensure_unique(conn, "listings", "slug", &listing.slug, LISTING, except_id)
    }

    fn listing_ids_where(conn: &Connection, column: &str, value: i64) -> CatalogResult<Vec<i64>> {
        let sql = format!("SELECT id FROM listings WHERE {} = ?1 ORDER BY id", column);
        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params![value], |r| r.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    /// Delete listings along with everything they own. Returns the number deleted.
    fn purge_listings(conn: &Connection, listing_ids: &[i64]) -> CatalogResult<usize> {
        for listing_id in listing_ids {
            conn.execute(
                "DELETE FROM listing_images WHERE listing_id = ?1",
                params![listing_id],
            )?;
            conn.execute(
                "DELETE FROM contact_requests WHERE listing_id = ?1",
                params![listing_id],
            )?;
            conn.execute(
                "DELETE FROM listing_features WHERE listing_id = ?1",
                params![listing_id],
            )?;
            conn.execute("DELETE FROM listings WHERE id = ?1", params![listing_id])?;
        }
        Ok(listing_ids.len())
    }

    fn purge_asset_type(conn: &Connection, asset_type_id: i64) -> CatalogResult<usize> {
        let listing_ids = Self::listing_ids_where(conn, "asset_type_id", asset_type_id)?;
        let purged = Self::purge_listings(conn, &listing_ids)?;
        conn.execute("DELETE FROM asset_types WHERE id = ?1", params![asset_type_id])?;
        Ok(purged)
    }

    fn write_listing(conn: &Connection, listing: &NewListing, id: Option<i64>) -> CatalogResult<i64> {
        let price_cents = Self::price_to_cents(listing.price)?;
        let status = listing.status.to_db_str();
        let values = params![
            &listing.title,
            &listing.slug,
            &listing.description,
            price_cents,
            listing.is_negotiable,
            listing.area,
            listing.rooms,
            listing.floor,
            listing.total_floors,
            listing.year_built,
            &listing.condition,
            status,
            listing.asset_type_id,
            listing.location_id,
            listing.seller_id,
        ];
        let result = match id {
            None => conn
                .execute(
                    "INSERT INTO listings (title, slug, description, price_cents, is_negotiable,
                        area, rooms, floor, total_floors, year_built, condition, status,
                        asset_type_id, location_id, seller_id)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                    values,
                )
                .map(|_| conn.last_insert_rowid()),
            Some(id) => conn
                .execute(
                    &format!(
                        "UPDATE listings SET title = ?1, slug = ?2, description = ?3,
                            price_cents = ?4, is_negotiable = ?5, area = ?6, rooms = ?7,
                            floor = ?8, total_floors = ?9, year_built = ?10, condition = ?11,
                            status = ?12, asset_type_id = ?13, location_id = ?14, seller_id = ?15
                         WHERE id = {}",
                        id
                    ),
                    values,
                )
                .map(|_| id),
        };
        result.map_err(|e| CatalogError::from(e).for_entity(LISTING, &listing.slug))
    }
}

impl ListingCatalogStore for SqliteListingStore {
    // =========================================================================
    // Users
    // =========================================================================

    fn create_user(&self, user: &NewUser) -> CatalogResult<User> {
        validation::require_non_empty("handle", &user.handle)?;
        self.write(|conn| {
            Self::ensure_unique(conn, "users", "handle", &user.handle, USER, None)?;
            conn.execute("INSERT INTO users (handle) VALUES (?1)", params![&user.handle])
                .map_err(|e| CatalogError::from(e).for_entity(USER, &user.handle))?;
            let id = conn.last_insert_rowid();
            debug!("Created user {} ({})", id, user.handle);
            Self::user_inner(conn, id)
        })
    }

    fn get_user(&self, id: i64) -> CatalogResult<User> {
        self.read(|conn| Self::user_inner(conn, id))
    }

    fn list_users(&self) -> CatalogResult<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        self.read(|conn| Self::fetch_all(conn, &sql, [], Self::parse_user_row))
    }

    fn update_user(&self, id: i64, user: &NewUser) -> CatalogResult<User> {
        validation::require_non_empty("handle", &user.handle)?;
        self.write(|conn| {
            Self::require(conn, "users", USER, id)?;
            Self::ensure_unique(conn, "users", "handle", &user.handle, USER, Some(id))?;
            conn.execute(
                "UPDATE users SET handle = ?1 WHERE id = ?2",
                params![&user.handle, id],
            )
            .map_err(|e| CatalogError::from(e).for_entity(USER, &user.handle))?;
            Self::user_inner(conn, id)
        })
    }

    fn delete_user(&self, id: i64) -> CatalogResult<()> {
        self.write(|conn| {
            Self::require(conn, "users", USER, id)?;
            let requests = conn.execute(
                "DELETE FROM contact_requests WHERE user_id = ?1",
                params![id],
            )?;
            let listing_ids = Self::listing_ids_where(conn, "seller_id", id)?;
            let listings = Self::purge_listings(conn, &listing_ids)?;
            conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
            info!(
                "Deleted user {} with {} listings and {} contact requests",
                id, listings, requests
            );
            Ok(())
        })
    }

    // =========================================================================
    // Categories and Asset Types
    // =========================================================================

    fn create_category(&self, category: &NewCategory) -> CatalogResult<AssetCategory> {
        self.write(|conn| {
            Self::check_category(conn, category, None)?;
            conn.execute(
                "INSERT INTO asset_categories (name, slug, icon) VALUES (?1, ?2, ?3)",
                params![&category.name, &category.slug, &category.icon],
            )
            .map_err(|e| CatalogError::from(e).for_entity(CATEGORY, &category.slug))?;
            let id = conn.last_insert_rowid();
            debug!("Created category {} ({})", id, category.slug);
            Self::category_inner(conn, id)
        })
    }

    fn get_category(&self, id: i64) -> CatalogResult<AssetCategory> {
        self.read(|conn| Self::category_inner(conn, id))
    }

    fn list_categories(&self) -> CatalogResult<Vec<AssetCategory>> {
        let sql = format!("SELECT {} FROM asset_categories ORDER BY id", CATEGORY_COLUMNS);
        self.read(|conn| Self::fetch_all(conn, &sql, [], Self::parse_category_row))
    }

    fn update_category(&self, id: i64, category: &NewCategory) -> CatalogResult<AssetCategory> {
        self.write(|conn| {
            Self::require(conn, "asset_categories", CATEGORY, id)?;
            Self::check_category(conn, category, Some(id))?;
            conn.execute(
                "UPDATE asset_categories SET name = ?1, slug = ?2, icon = ?3 WHERE id = ?4",
                params![&category.name, &category.slug, &category.icon, id],
            )
            .map_err(|e| CatalogError::from(e).for_entity(CATEGORY, &category.slug))?;
            Self::category_inner(conn, id)
        })
    }

    fn delete_category(&self, id: i64) -> CatalogResult<()> {
        self.write(|conn| {
            Self::require(conn, "asset_categories", CATEGORY, id)?;
            let mut stmt = conn.prepare("SELECT id FROM asset_types WHERE category_id = ?1")?;
            let type_ids = stmt
                .query_map(params![id], |r| r.get(0))?
                .collect::<Result<Vec<i64>, _>>()?;
            let mut listings = 0;
            for type_id in &type_ids {
                listings += Self::purge_asset_type(conn, *type_id)?;
            }
            conn.execute("DELETE FROM asset_categories WHERE id = ?1", params![id])?;
            info!(
                "Deleted category {} with {} asset types and {} listings",
                id,
                type_ids.len(),
                listings
            );
            Ok(())
        })
    }

    fn create_asset_type(&self, asset_type: &NewAssetType) -> CatalogResult<AssetType> {
        self.write(|conn| {
            Self::check_asset_type(conn, asset_type, None)?;
            conn.execute(
                "INSERT INTO asset_types (category_id, name, slug) VALUES (?1, ?2, ?3)",
                params![asset_type.category_id, &asset_type.name, &asset_type.slug],
            )
            .map_err(|e| CatalogError::from(e).for_entity(ASSET_TYPE, &asset_type.slug))?;
            let id = conn.last_insert_rowid();
            debug!("Created asset type {} ({})", id, asset_type.slug);
            Self::asset_type_inner(conn, id)
        })
    }

    fn get_asset_type(&self, id: i64) -> CatalogResult<AssetType> {
        self.read(|conn| Self::asset_type_inner(conn, id))
    }

    fn list_asset_types(&self, category_id: Option<i64>) -> CatalogResult<Vec<AssetType>> {
        let sql = format!(
            "SELECT {} FROM asset_types WHERE ?1 IS NULL OR category_id = ?1 ORDER BY id",
            ASSET_TYPE_COLUMNS
        );
        self.read(|conn| {
            Self::fetch_all(conn, &sql, params![category_id], Self::parse_asset_type_row)
        })
    }

    fn update_asset_type(&self, id: i64, asset_type: &NewAssetType) -> CatalogResult<AssetType> {
        self.write(|conn| {
            Self::require(conn, "asset_types", ASSET_TYPE, id)?;
            Self::check_asset_type(conn, asset_type, Some(id))?;
            conn.execute(
                "UPDATE asset_types SET category_id = ?1, name = ?2, slug = ?3 WHERE id = ?4",
                params![asset_type.category_id, &asset_type.name, &asset_type.slug, id],
            )
            .map_err(|e| CatalogError::from(e).for_entity(ASSET_TYPE, &asset_type.slug))?;
            Self::asset_type_inner(conn, id)
        })
    }

    fn delete_asset_type(&self, id: i64) -> CatalogResult<()> {
        self.write(|conn| {
            Self::require(conn, "asset_types", ASSET_TYPE, id)?;
            let listings = Self::purge_asset_type(conn, id)?;
            info!("Deleted asset type {} with {} listings", id, listings);
            Ok(())
        })
    }

    // =========================================================================
    // Locations
    // =========================================================================

    fn create_location(&self, location: &NewLocation) -> CatalogResult<Location> {
        validation::validate_location(location)?;
        self.write(|conn| {
            conn.execute(
                "INSERT INTO locations (city, district, region, address, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    &location.city,
                    &location.district,
                    &location.region,
                    &location.address,
                    location.latitude,
                    location.longitude
                ],
            )?;
            let id = conn.last_insert_rowid();
            debug!("Created location {} ({})", id, location.city);
            Self::location_inner(conn, id)
        })
    }

    fn get_location(&self, id: i64) -> CatalogResult<Location> {
        self.read(|conn| Self::location_inner(conn, id))
    }

    fn list_locations(&self) -> CatalogResult<Vec<Location>> {
        let sql = format!("SELECT {} FROM locations ORDER BY id", LOCATION_COLUMNS);
        self.read(|conn| Self::fetch_all(conn, &sql, [], Self::parse_location_row))
    }

    fn update_location(&self, id: i64, location: &NewLocation) -> CatalogResult<Location> {
        validation::validate_location(location)?;
        self.write(|conn| {
            Self::require(conn, "locations", LOCATION, id)?;
            conn.execute(
                "UPDATE locations SET city = ?1, district = ?2, region = ?3, address = ?4,
                    latitude = ?5, longitude = ?6
                 WHERE id = ?7",
                params![
                    &location.city,
                    &location.district,
                    &location.region,
                    &location.address,
                    location.latitude,
                    location.longitude,
                    id
                ],
            )?;
            Self::location_inner(conn, id)
        })
    }

    fn delete_location(&self, id: i64) -> CatalogResult<()> {
        self.write(|conn| {
            Self::require(conn, "locations", LOCATION, id)?;
            let detached = conn.execute(
                "UPDATE listings SET location_id = NULL WHERE location_id = ?1",
                params![id],
            )?;
            conn.execute("DELETE FROM locations WHERE id = ?1", params![id])?;
            info!("Deleted location {}, detached {} listings", id, detached);
            Ok(())
        })
    }

    // =========================================================================
    // Listings
    // =========================================================================

    fn create_listing(&self, listing: &NewListing) -> CatalogResult<Listing> {
        self.write(|conn| {
            Self::check_listing(conn, listing, None)?;
            let id = Self::write_listing(conn, listing, None)?;
            debug!("Created listing {} ({})", id, listing.slug);
            Self::listing_inner(conn, id)
        })
    }

    fn get_listing(&self, id: i64) -> CatalogResult<Listing> {
        self.read(|conn| Self::listing_inner(conn, id))
    }

    fn update_listing(&self, id: i64, update: ListingUpdate) -> CatalogResult<Listing> {
        self.write(|conn| {
            let current = Self::listing_inner(conn, id)?;
            let updated = update.apply_to(&current);
            Self::check_listing(conn, &updated, Some(id))?;
            Self::write_listing(conn, &updated, Some(id))?;
            debug!("Updated listing {} ({})", id, updated.slug);
            Self::listing_inner(conn, id)
        })
    }

    fn delete_listing(&self, id: i64) -> CatalogResult<()> {
        self.write(|conn| {
            Self::require(conn, "listings", LISTING, id)?;
            Self::purge_listings(conn, &[id])?;
            debug!("Deleted listing {}", id);
            Ok(())
        })
    }

    fn list_listings(&self, filter: &ListingFilter) -> CatalogResult<Vec<Listing>> {
        let mut sql = format!(
            "SELECT {} FROM listings l
             JOIN asset_types t ON t.id = l.asset_type_id
             LEFT JOIN locations loc ON loc.id = l.location_id
             WHERE 1 = 1",
            LISTING_COLUMNS
        );
        let mut values: Vec<Value> = Vec::new();
        let mut push = |clause: &str, value: Value| {
            values.push(value);
            sql.push_str(&format!(" AND {} ?{}", clause, values.len()));
        };

        if let Some(category_id) = filter.category_id {
            push("t.category_id =", Value::Integer(category_id));
        }
        if let Some(asset_type_id) = filter.asset_type_id {
            push("l.asset_type_id =", Value::Integer(asset_type_id));
        }
        if let Some(status) = filter.status {
            push("l.status =", Value::Text(status.to_db_str().to_string()));
        }
        if let Some(range) = &filter.price_range {
            if let Some(min) = range.min {
                push("l.price_cents >=", Value::Integer(Self::min_bound_cents(min)));
            }
            if let Some(max) = range.max {
                push("l.price_cents <=", Value::Integer(Self::max_bound_cents(max)));
            }
        }
        if let Some(city) = &filter.location_city {
            push("loc.city COLLATE NOCASE =", Value::Text(city.clone()));
        }
        if let Some(after_id) = filter.after_id {
            push("l.id >", Value::Integer(after_id));
        }

        sql.push_str(" ORDER BY l.id");
        if let Some(limit) = filter.limit {
            values.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
            sql.push_str(&format!(" LIMIT ?{}", values.len()));
        }

        self.read(|conn| {
            Self::fetch_all(conn, &sql, params_from_iter(values.iter()), Self::parse_listing_row)
        })
    }

    // =========================================================================
    // Images
    // =========================================================================

    fn add_image(&self, image: &NewListingImage) -> CatalogResult<ListingImage> {
        validation::require_non_empty("image", &image.image)?;
        self.write(|conn| {
            Self::require(conn, "listings", LISTING, image.listing_id)?;
            conn.execute(
                "INSERT INTO listing_images (listing_id, image, is_main) VALUES (?1, ?2, ?3)",
                params![image.listing_id, &image.image, image.is_main],
            )?;
            let id = conn.last_insert_rowid();
            debug!("Added image {} to listing {}", id, image.listing_id);
            Self::image_inner(conn, id)
        })
    }

    fn get_image(&self, id: i64) -> CatalogResult<ListingImage> {
        self.read(|conn| Self::image_inner(conn, id))
    }

    fn list_images(&self) -> CatalogResult<Vec<ListingImage>> {
        let sql = format!("SELECT {} FROM listing_images ORDER BY id", IMAGE_COLUMNS);
        self.read(|conn| Self::fetch_all(conn, &sql, [], Self::parse_image_row))
    }

    fn listing_images(&self, listing_id: i64) -> CatalogResult<Vec<ListingImage>> {
        let sql = format!(
            "SELECT {} FROM listing_images WHERE listing_id = ?1 ORDER BY id",
            IMAGE_COLUMNS
        );
        self.read(|conn| {
            Self::require(conn, "listings", LISTING, listing_id)?;
            Self::fetch_all(conn, &sql, params![listing_id], Self::parse_image_row)
        })
    }

    fn main_image(&self, listing_id: i64) -> CatalogResult<Option<ListingImage>> {
        let sql = format!(
            "SELECT {} FROM listing_images WHERE listing_id = ?1 AND is_main = 1 ORDER BY id LIMIT 1",
            IMAGE_COLUMNS
        );
        self.read(|conn| {
            Self::require(conn, "listings", LISTING, listing_id)?;
            let mut images =
                Self::fetch_all(conn, &sql, params![listing_id], Self::parse_image_row)?;
            Ok(images.pop())
        })
    }

    fn update_image(&self, id: i64, image: &NewListingImage) -> CatalogResult<ListingImage> {
        validation::require_non_empty("image", &image.image)?;
        self.write(|conn| {
            Self::require(conn, "listing_images", IMAGE, id)?;
            Self::require(conn, "listings", LISTING, image.listing_id)?;
            conn.execute(
                "UPDATE listing_images SET listing_id = ?1, image = ?2, is_main = ?3 WHERE id = ?4",
                params![image.listing_id, &image.image, image.is_main, id],
            )?;
            Self::image_inner(conn, id)
        })
    }

    fn delete_image(&self, id: i64) -> CatalogResult<()> {
        self.write(|conn| {
            Self::require(conn, "listing_images", IMAGE, id)?;
            conn.execute("DELETE FROM listing_images WHERE id = ?1", params![id])?;
            Ok(())
        })
    }

    // =========================================================================
    // Features
    // =========================================================================

    fn create_feature(&self, feature: &NewFeature) -> CatalogResult<Feature> {
        validation::require_non_empty("name", &feature.name)?;
        self.write(|conn| {
            conn.execute("INSERT INTO features (name) VALUES (?1)", params![&feature.name])?;
            let id = conn.last_insert_rowid();
            debug!("Created feature {} ({})", id, feature.name);
            Self::feature_inner(conn, id)
        })
    }

    fn get_feature(&self, id: i64) -> CatalogResult<Feature> {
        self.read(|conn| Self::feature_inner(conn, id))
    }

    fn list_features(&self) -> CatalogResult<Vec<Feature>> {
        let sql = format!("SELECT {} FROM features ORDER BY id", FEATURE_COLUMNS);
        self.read(|conn| Self::fetch_all(conn, &sql, [], Self::parse_feature_row))
    }

    fn update_feature(&self, id: i64, feature: &NewFeature) -> CatalogResult<Feature> {
        validation::require_non_empty("name", &feature.name)?;
        self.write(|conn| {
            Self::require(conn, "features", FEATURE, id)?;
            conn.execute(
                "UPDATE features SET name = ?1 WHERE id = ?2",
                params![&feature.name, id],
            )?;
            Self::feature_inner(conn, id)
        })
    }

    fn delete_feature(&self, id: i64) -> CatalogResult<()> {
        self.write(|conn| {
            Self::require(conn, "features", FEATURE, id)?;
            let memberships = conn.execute(
                "DELETE FROM listing_features WHERE feature_id = ?1",
                params![id],
            )?;
            conn.execute("DELETE FROM features WHERE id = ?1", params![id])?;
            debug!("Deleted feature {}, detached from {} listings", id, memberships);
            Ok(())
        })
    }

    fn attach_feature(&self, listing_id: i64, feature_id: i64) -> CatalogResult<()> {
        self.write(|conn| {
            Self::require(conn, "listings", LISTING, listing_id)?;
            Self::require(conn, "features", FEATURE, feature_id)?;
            conn.execute(
                "INSERT OR IGNORE INTO listing_features (listing_id, feature_id) VALUES (?1, ?2)",
                params![listing_id, feature_id],
            )?;
            Ok(())
        })
    }

    fn detach_feature(&self, listing_id: i64, feature_id: i64) -> CatalogResult<()> {
        self.write(|conn| {
            Self::require(conn, "listings", LISTING, listing_id)?;
            Self::require(conn, "features", FEATURE, feature_id)?;
            conn.execute(
                "DELETE FROM listing_features WHERE listing_id = ?1 AND feature_id = ?2",
                params![listing_id, feature_id],
            )?;
            Ok(())
        })
    }

    fn listing_features(&self, listing_id: i64) -> CatalogResult<Vec<Feature>> {
        self.read(|conn| {
            Self::require(conn, "listings", LISTING, listing_id)?;
            Self::fetch_all(
                conn,
                "SELECT f.id, f.name FROM features f
                 JOIN listing_features lf ON lf.feature_id = f.id
                 WHERE lf.listing_id = ?1
                 ORDER BY f.id",
                params![listing_id],
                Self::parse_feature_row,
            )
        })
    }

    // =========================================================================
    // Contact Requests
    // =========================================================================

    fn create_contact_request(
        &self,
        request: &NewContactRequest,
    ) -> CatalogResult<ContactRequest> {
        validation::require_non_empty("message", &request.message)?;
        self.write(|conn| {
            Self::require(conn, "listings", LISTING, request.listing_id)?;
            Self::require(conn, "users", USER, request.user_id)?;
            conn.execute(
                "INSERT INTO contact_requests (listing_id, user_id, message, phone)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    request.listing_id,
                    request.user_id,
                    &request.message,
                    &request.phone
                ],
            )?;
            let id = conn.last_insert_rowid();
            debug!(
                "User {} sent contact request {} on listing {}",
                request.user_id, id, request.listing_id
            );
            Self::contact_request_inner(conn, id)
        })
    }

    fn get_contact_request(&self, id: i64) -> CatalogResult<ContactRequest> {
        self.read(|conn| Self::contact_request_inner(conn, id))
    }

    fn list_contact_requests(&self, listing_id: Option<i64>) -> CatalogResult<Vec<ContactRequest>> {
        let sql = format!(
            "SELECT {} FROM contact_requests WHERE ?1 IS NULL OR listing_id = ?1 ORDER BY id",
            CONTACT_REQUEST_COLUMNS
        );
        self.read(|conn| {
            Self::fetch_all(conn, &sql, params![listing_id], Self::parse_contact_request_row)
        })
    }

    fn update_contact_request(
        &self,
        id: i64,
        update: &ContactRequestUpdate,
    ) -> CatalogResult<ContactRequest> {
        validation::require_non_empty("message", &update.message)?;
        self.write(|conn| {
            Self::require(conn, "contact_requests", CONTACT_REQUEST, id)?;
            conn.execute(
                "UPDATE contact_requests SET message = ?1, phone = ?2, is_read = ?3 WHERE id = ?4",
                params![&update.message, &update.phone, update.is_read, id],
            )?;
            Self::contact_request_inner(conn, id)
        })
    }

    fn delete_contact_request(&self, id: i64) -> CatalogResult<()> {
        self.write(|conn| {
            Self::require(conn, "contact_requests", CONTACT_REQUEST, id)?;
            conn.execute("DELETE FROM contact_requests WHERE id = ?1", params![id])?;
            Ok(())
        })
    }

    fn mark_read(&self, id: i64) -> CatalogResult<()> {
        self.write(|conn| {
            Self::require(conn, "contact_requests", CONTACT_REQUEST, id)?;
            conn.execute(
                "UPDATE contact_requests SET is_read = 1 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
    }

    fn unread_contact_requests_count(&self, listing_id: i64) -> CatalogResult<usize> {
        self.read(|conn| {
            Self::require(conn, "listings", LISTING, listing_id)?;
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM contact_requests WHERE listing_id = ?1 AND is_read = 0",
                params![listing_id],
                |r| r.get(0),
            )?;
            Ok(count as usize)
        })
    }

    // =========================================================================
    // Counts
    // =========================================================================

    fn counts(&self) -> CatalogResult<CatalogCounts> {
        self.read(|conn| {
            Ok(CatalogCounts {
                users: Self::count(conn, "users")?,
                categories: Self::count(conn, "asset_categories")?,
                asset_types: Self::count(conn, "asset_types")?,
                locations: Self::count(conn, "locations")?,
                listings: Self::count(conn, "listings")?,
                images: Self::count(conn, "listing_images")?,
                features: Self::count(conn, "features")?,
                contact_requests: Self::count(conn, "contact_requests")?,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn open_store() -> (tempfile::TempDir, SqliteListingStore) {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let store = SqliteListingStore::new(temp_dir.path().join("catalog.db"), 2).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_price_cents_conversion() {
        let price = Decimal::from_str("1234.5").unwrap();
        let cents = SqliteListingStore::price_to_cents(price).unwrap();
        assert_eq!(cents, 123450);
        assert_eq!(SqliteListingStore::cents_to_price(cents), price);
        assert_eq!(
            SqliteListingStore::cents_to_price(cents).to_string(),
            "1234.50"
        );
    }

    #[test]
    fn test_price_bounds_round_inwards() {
        let min = Decimal::from_str("10.001").unwrap();
        let max = Decimal::from_str("10.009").unwrap();
        assert_eq!(SqliteListingStore::min_bound_cents(min), 1001);
        assert_eq!(SqliteListingStore::max_bound_cents(max), 1000);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("catalog.db");
        {
            let store = SqliteListingStore::new(&path, 1).unwrap();
            store
                .create_user(&NewUser {
                    handle: "seller".to_string(),
                })
                .unwrap();
        }
        let store = SqliteListingStore::new(&path, 1).unwrap();
        assert_eq!(store.counts().unwrap().users, 1);
        assert_eq!(store.db_path(), path.as_path());
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let (_dir, store) = open_store();
        let category = store
            .create_category(&NewCategory {
                name: "Residential".to_string(),
                slug: "residential".to_string(),
                icon: None,
            })
            .unwrap();

        // Passes the pre-check, fails on insert: the whole transaction must be undone
        let result = store.write(|conn| {
            conn.execute(
                "INSERT INTO features (name) VALUES ('Balcony')",
                [],
            )?;
            conn.execute(
                "INSERT INTO asset_categories (name, slug) VALUES ('Other', ?1)",
                params![&category.slug],
            )?;
            Ok(())
        });
        assert!(result.unwrap_err().is_unique_violation());
        assert_eq!(store.counts().unwrap().features, 0);
    }

    #[tokio::test]
    async fn test_concurrent_reads_no_blocking() {
        let (_dir, store) = open_store();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                tokio::spawn({
                    let store = store.clone();
                    async move {
                        for _ in 0..100 {
                            let _ = store.counts();
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }
    }
}

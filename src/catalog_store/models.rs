//! Catalog models.
//!
//! Persisted entities carry their row `id`; the matching `New*` structs are
//! the payloads used to create (and, for most entities, replace) them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Enumerations
// =============================================================================

/// Sale status of a listing.
///
/// Any status may be replaced by any other; there is no workflow.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Available,
    Sold,
    Reserved,
    Archived,
}

impl ListingStatus {
    pub const ALL: [ListingStatus; 4] = [
        ListingStatus::Available,
        ListingStatus::Sold,
        ListingStatus::Reserved,
        ListingStatus::Archived,
    ];

    /// Convert from database string representation
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "available" => Some(ListingStatus::Available),
            "sold" => Some(ListingStatus::Sold),
            "reserved" => Some(ListingStatus::Reserved),
            "archived" => Some(ListingStatus::Archived),
            _ => None,
        }
    }

    /// Convert to database string representation
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ListingStatus::Available => "available",
            ListingStatus::Sold => "sold",
            ListingStatus::Reserved => "reserved",
            ListingStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ListingStatus::from_db_str(&s.to_ascii_lowercase()).ok_or_else(|| {
            format!(
                "Invalid status '{}'. Valid statuses are: available, sold, reserved, archived",
                s
            )
        })
    }
}

// =============================================================================
// Users
// =============================================================================

/// A marketplace account: sells listings and sends contact requests.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub handle: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub handle: String,
}

// =============================================================================
// Classification
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetCategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub icon: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetType {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewAssetType {
    pub category_id: i64,
    pub name: String,
    pub slug: String,
}

// =============================================================================
// Locations
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub city: String,
    pub district: Option<String>,
    pub region: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewLocation {
    pub city: String,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

// =============================================================================
// Listings
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub is_negotiable: bool,
    pub area: f64,
    pub rooms: Option<i32>,
    pub floor: Option<i32>,
    pub total_floors: Option<i32>,
    pub year_built: Option<i32>,
    pub condition: String,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
    pub asset_type_id: i64,
    pub location_id: Option<i64>,
    pub seller_id: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewListing {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub is_negotiable: bool,
    pub area: f64,
    #[serde(default)]
    pub rooms: Option<i32>,
    #[serde(default)]
    pub floor: Option<i32>,
    #[serde(default)]
    pub total_floors: Option<i32>,
    #[serde(default)]
    pub year_built: Option<i32>,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub status: ListingStatus,
    pub asset_type_id: i64,
    #[serde(default)]
    pub location_id: Option<i64>,
    pub seller_id: i64,
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial listing update, only the `Some` fields are changed.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ListingUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub is_negotiable: Option<bool>,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default, deserialize_with = "double_option")]
    pub rooms: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub floor: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub total_floors: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub year_built: Option<Option<i32>>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub status: Option<ListingStatus>,
    #[serde(default)]
    pub asset_type_id: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub location_id: Option<Option<i64>>,
    #[serde(default)]
    pub seller_id: Option<i64>,
}

impl ListingUpdate {
    /// The full set of listing fields after applying this update to `current`.
    pub fn apply_to(self, current: &Listing) -> NewListing {
        NewListing {
            title: self.title.unwrap_or_else(|| current.title.clone()),
            slug: self.slug.unwrap_or_else(|| current.slug.clone()),
            description: self
                .description
                .unwrap_or_else(|| current.description.clone()),
            price: self.price.unwrap_or(current.price),
            is_negotiable: self.is_negotiable.unwrap_or(current.is_negotiable),
            area: self.area.unwrap_or(current.area),
            rooms: self.rooms.unwrap_or(current.rooms),
            floor: self.floor.unwrap_or(current.floor),
            total_floors: self.total_floors.unwrap_or(current.total_floors),
            year_built: self.year_built.unwrap_or(current.year_built),
            condition: self.condition.unwrap_or_else(|| current.condition.clone()),
            status: self.status.unwrap_or(current.status),
            asset_type_id: self.asset_type_id.unwrap_or(current.asset_type_id),
            location_id: self.location_id.unwrap_or(current.location_id),
            seller_id: self.seller_id.unwrap_or(current.seller_id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListingImage {
    pub id: i64,
    pub listing_id: i64,
    /// Reference to the stored image (path or URL), never the bytes.
    pub image: String,
    pub is_main: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewListingImage {
    pub listing_id: i64,
    pub image: String,
    #[serde(default)]
    pub is_main: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewFeature {
    pub name: String,
}

// =============================================================================
// Contact Requests
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContactRequest {
    pub id: i64,
    pub listing_id: i64,
    pub user_id: i64,
    pub message: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewContactRequest {
    pub listing_id: i64,
    pub user_id: i64,
    pub message: String,
    #[serde(default)]
    pub phone: String,
}

/// Editable part of a contact request; listing and sender are fixed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContactRequestUpdate {
    pub message: String,
    pub phone: String,
    pub is_read: bool,
}

// =============================================================================
// Queries
// =============================================================================

/// Inclusive price bounds, either side may be open.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

/// Filter for `list_listings`. Empty filter matches every listing.
///
/// Results are in creation order; `after_id` + `limit` let a caller resume
/// the same query where a previous page stopped.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingFilter {
    pub category_id: Option<i64>,
    pub asset_type_id: Option<i64>,
    pub status: Option<ListingStatus>,
    pub price_range: Option<PriceRange>,
    pub location_city: Option<String>,
    pub after_id: Option<i64>,
    pub limit: Option<usize>,
}

impl ListingFilter {
    pub fn with_status(status: ListingStatus) -> Self {
        ListingFilter {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Row counts per table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub users: usize,
    pub categories: usize,
    pub asset_types: usize,
    pub locations: usize,
    pub listings: usize,
    pub images: usize,
    pub features: usize,
    pub contact_requests: usize,
}

// =============================================================================
// Display
// =============================================================================

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.handle)
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            Some(address) if !address.is_empty() => write!(f, "{}, {}", self.city, address),
            _ => f.write_str(&self.city),
        }
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

impl fmt::Display for ListingImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Image for listing {}", self.listing_id)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for ContactRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Request from user {} on listing {}",
            self.user_id, self.listing_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_db_str() {
        for status in ListingStatus::ALL {
            assert_eq!(ListingStatus::from_db_str(status.to_db_str()), Some(status));
        }
        assert_eq!(ListingStatus::from_db_str("pending"), None);
        assert_eq!("SOLD".parse::<ListingStatus>(), Ok(ListingStatus::Sold));
    }

    #[test]
    fn test_listing_update_distinguishes_null_from_missing() {
        let clear: ListingUpdate = serde_json::from_str(r#"{"location_id": null}"#).unwrap();
        assert_eq!(clear.location_id, Some(None));

        let untouched: ListingUpdate = serde_json::from_str(r#"{"title": "New"}"#).unwrap();
        assert_eq!(untouched.location_id, None);
        assert_eq!(untouched.title.as_deref(), Some("New"));
    }

    #[test]
    fn test_new_listing_defaults() {
        let listing: NewListing = serde_json::from_str(
            r#"{"title": "Loft", "slug": "loft", "price": "1000.00", "area": 40.0,
                "asset_type_id": 1, "seller_id": 2}"#,
        )
        .unwrap();
        assert_eq!(listing.status, ListingStatus::Available);
        assert!(!listing.is_negotiable);
        assert_eq!(listing.location_id, None);
        assert!(listing.description.is_empty());
    }

    #[test]
    fn test_location_display() {
        let mut location = Location {
            id: 1,
            city: "Porto".to_string(),
            district: None,
            region: None,
            address: Some("Rua Augusta 10".to_string()),
            latitude: None,
            longitude: None,
        };
        assert_eq!(location.to_string(), "Porto, Rua Augusta 10");
        location.address = None;
        assert_eq!(location.to_string(), "Porto");
    }
}

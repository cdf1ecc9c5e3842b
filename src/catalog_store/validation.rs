//! Validation for catalog entities.
//!
//! Field-level checks run before anything is written. Referential checks
//! (foreign keys, uniqueness) are the store's job since they need the db.

use super::models::{NewListing, NewLocation};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt;

/// Prices carry at most this many fractional digits.
pub const PRICE_SCALE: u32 = 2;

/// Ten significant digits, two of them after the decimal point.
pub const MAX_PRICE_EXCLUSIVE: i64 = 100_000_000;

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyField {
        field: &'static str,
    },
    InvalidSlug {
        value: String,
    },
    NegativeValue {
        field: &'static str,
        value: f64,
    },
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    UnpairedCoordinates,
    TooManyDecimals {
        field: &'static str,
        value: Decimal,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField { field } => {
                write!(f, "Field '{}' is required but was empty", field)
            }
            ValidationError::InvalidSlug { value } => write!(
                f,
                "Slug '{}' must be non-empty lowercase letters, digits, '-' or '_'",
                value
            ),
            ValidationError::NegativeValue { field, value } => {
                write!(f, "Field '{}' must be non-negative, got {}", field, value)
            }
            ValidationError::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(
                f,
                "Field '{}' must be within [{}, {}], got {}",
                field, min, max, value
            ),
            ValidationError::UnpairedCoordinates => {
                write!(f, "Latitude and longitude must be given together")
            }
            ValidationError::TooManyDecimals { field, value } => write!(
                f,
                "Field '{}' allows at most {} decimal places, got {}",
                field, PRICE_SCALE, value
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = Result<T, ValidationError>;

pub fn require_non_empty(field: &'static str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(())
}

pub fn validate_slug(slug: &str) -> ValidationResult<()> {
    let well_formed = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if !well_formed {
        return Err(ValidationError::InvalidSlug {
            value: slug.to_string(),
        });
    }
    Ok(())
}

fn require_range(field: &'static str, value: f64, min: f64, max: f64) -> ValidationResult<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn require_non_negative(field: &'static str, value: Option<i32>) -> ValidationResult<()> {
    match value {
        Some(v) if v < 0 => Err(ValidationError::NegativeValue {
            field,
            value: v as f64,
        }),
        _ => Ok(()),
    }
}

pub fn validate_price(price: Decimal) -> ValidationResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::NegativeValue {
            field: "price",
            value: price.to_f64().unwrap_or(f64::MIN),
        });
    }
    if price.normalize().scale() > PRICE_SCALE {
        return Err(ValidationError::TooManyDecimals {
            field: "price",
            value: price,
        });
    }
    if price >= Decimal::from(MAX_PRICE_EXCLUSIVE) {
        return Err(ValidationError::OutOfRange {
            field: "price",
            value: price.to_f64().unwrap_or(f64::MAX),
            min: 0.0,
            max: (MAX_PRICE_EXCLUSIVE as f64) - 0.01,
        });
    }
    Ok(())
}

pub fn validate_location(location: &NewLocation) -> ValidationResult<()> {
    require_non_empty("city", &location.city)?;
    match (location.latitude, location.longitude) {
        (Some(lat), Some(lon)) => {
            require_range("latitude", lat, -90.0, 90.0)?;
            require_range("longitude", lon, -180.0, 180.0)
        }
        (None, None) => Ok(()),
        _ => Err(ValidationError::UnpairedCoordinates),
    }
}

pub fn validate_listing(listing: &NewListing) -> ValidationResult<()> {
    require_non_empty("title", &listing.title)?;
    validate_slug(&listing.slug)?;
    validate_price(listing.price)?;
    if !listing.area.is_finite() {
        return Err(ValidationError::OutOfRange {
            field: "area",
            value: listing.area,
            min: 0.0,
            max: f64::MAX,
        });
    }
    if listing.area < 0.0 {
        return Err(ValidationError::NegativeValue {
            field: "area",
            value: listing.area,
        });
    }
    require_non_negative("rooms", listing.rooms)?;
    require_non_negative("total_floors", listing.total_floors)?;
    if let Some(year) = listing.year_built {
        require_range("year_built", year as f64, 1000.0, 9999.0)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::models::ListingStatus;
    use std::str::FromStr;

    fn make_valid_listing() -> NewListing {
        NewListing {
            title: "Sunny flat".to_string(),
            slug: "sunny-flat".to_string(),
            description: String::new(),
            price: Decimal::from_str("125000.50").unwrap(),
            is_negotiable: true,
            area: 54.5,
            rooms: Some(2),
            floor: Some(-1),
            total_floors: Some(5),
            year_built: Some(1972),
            condition: "renovated".to_string(),
            status: ListingStatus::Available,
            asset_type_id: 1,
            location_id: None,
            seller_id: 1,
        }
    }

    #[test]
    fn test_valid_listing_passes() {
        assert!(validate_listing(&make_valid_listing()).is_ok());
    }

    #[test]
    fn test_negative_area_rejected() {
        let mut listing = make_valid_listing();
        listing.area = -3.0;
        assert_eq!(
            validate_listing(&listing),
            Err(ValidationError::NegativeValue {
                field: "area",
                value: -3.0
            })
        );
    }

    #[test]
    fn test_price_with_three_decimals_rejected() {
        let mut listing = make_valid_listing();
        listing.price = Decimal::from_str("10.125").unwrap();
        assert!(matches!(
            validate_listing(&listing),
            Err(ValidationError::TooManyDecimals { .. })
        ));

        // Trailing zeros don't count
        listing.price = Decimal::from_str("10.1200").unwrap();
        assert!(validate_listing(&listing).is_ok());
    }

    #[test]
    fn test_price_bounds() {
        assert!(validate_price(Decimal::from_str("99999999.99").unwrap()).is_ok());
        assert!(validate_price(Decimal::from(MAX_PRICE_EXCLUSIVE)).is_err());
        assert!(validate_price(Decimal::from_str("-0.01").unwrap()).is_err());
        assert!(validate_price(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_slug_format() {
        assert!(validate_slug("flat-2-rooms_a").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Flat").is_err());
        assert!(validate_slug("with space").is_err());
    }

    #[test]
    fn test_location_requires_paired_coordinates() {
        let mut location = NewLocation {
            city: "Lisbon".to_string(),
            district: None,
            region: None,
            address: None,
            latitude: Some(38.7),
            longitude: None,
        };
        assert_eq!(
            validate_location(&location),
            Err(ValidationError::UnpairedCoordinates)
        );

        location.longitude = Some(-9.1);
        assert!(validate_location(&location).is_ok());

        location.latitude = Some(91.0);
        assert!(matches!(
            validate_location(&location),
            Err(ValidationError::OutOfRange {
                field: "latitude",
                ..
            })
        ));
    }

    #[test]
    fn test_empty_city_rejected() {
        let location = NewLocation {
            city: "  ".to_string(),
            district: None,
            region: None,
            address: None,
            latitude: None,
            longitude: None,
        };
        assert_eq!(
            validate_location(&location),
            Err(ValidationError::EmptyField { field: "city" })
        );
    }
}

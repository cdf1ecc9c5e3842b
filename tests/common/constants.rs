//! Values used by the seeded test catalog.

#![allow(dead_code)]

pub const SELLER_HANDLE: &str = "seller";
pub const BUYER_HANDLE: &str = "buyer";

pub const RESIDENTIAL_SLUG: &str = "residential";
pub const COMMERCIAL_SLUG: &str = "commercial";

pub const APARTMENT_SLUG: &str = "apartment";
pub const HOUSE_SLUG: &str = "house";
pub const OFFICE_SLUG: &str = "office";

pub const LISBON: &str = "Lisbon";
pub const PORTO: &str = "Porto";

//! Domain types shared across the workspace.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::Error;

pub const UNNAMED_BUSINESS: &str = "Unnamed Business";
pub const HOURS_NOT_AVAILABLE: &str = "Hours not available";

// ── Business categories ───────────────────────────────────────────────

/// Business classifications aggregated by location analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Restaurant,
    Cafe,
    Bank,
    Pharmacy,
    Supermarket,
    Convenience,
    Copyshop,
}

/// OSM tag a category is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKey {
    Amenity,
    Shop,
}

impl TagKey {
    pub fn as_str(self) -> &'static str {
        match self {
            TagKey::Amenity => "amenity",
            TagKey::Shop => "shop",
        }
    }
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Restaurant,
        Category::Cafe,
        Category::Bank,
        Category::Pharmacy,
        Category::Supermarket,
        Category::Convenience,
        Category::Copyshop,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Restaurant => "restaurant",
            Category::Cafe => "cafe",
            Category::Bank => "bank",
            Category::Pharmacy => "pharmacy",
            Category::Supermarket => "supermarket",
            Category::Convenience => "convenience",
            Category::Copyshop => "copyshop",
        }
    }

    pub fn tag_key(self) -> TagKey {
        match self {
            Category::Restaurant | Category::Cafe | Category::Bank | Category::Pharmacy => {
                TagKey::Amenity
            }
            Category::Supermarket | Category::Convenience | Category::Copyshop => TagKey::Shop,
        }
    }

    /// Categories stored under `key`, in declaration order.
    pub fn under(key: TagKey) -> impl Iterator<Item = Category> {
        Self::ALL.into_iter().filter(move |c| c.tag_key() == key)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::Parse(format!("unknown business category: {s}")))
    }
}

// ── Analytics results ─────────────────────────────────────────────────

/// A single business as shown on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub id: i64,
    /// Raw `amenity` or `shop` tag value.
    pub category: String,
    pub name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub hours: String,
    /// Present values of the `cuisine`, `payment`, `delivery` and `takeaway` tags.
    pub amenities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Aggregate business statistics around a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsResult {
    pub total_businesses: usize,
    /// Businesses per square unit of the search radius.
    pub business_density: f64,
    /// Every category is present, zero when none were found.
    pub business_types: BTreeMap<Category, usize>,
    pub nearby_businesses: Vec<BusinessRecord>,
}

impl AnalyticsResult {
    /// Zero-valued result used when nothing could be fetched.
    pub fn empty() -> Self {
        Self {
            total_businesses: 0,
            business_density: 0.0,
            business_types: Category::ALL.into_iter().map(|c| (c, 0)).collect(),
            nearby_businesses: Vec::new(),
        }
    }

    pub fn count(&self, category: Category) -> usize {
        self.business_types.get(&category).copied().unwrap_or(0)
    }
}

// ── Geocoding ─────────────────────────────────────────────────────────

/// Structured address parts returned by the geocoder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suburb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Address {
    /// Join road, suburb, city, state and postcode, skipping absent parts.
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [
            &self.road,
            &self.suburb,
            &self.city,
            &self.state,
            &self.postcode,
        ]
        .into_iter()
        .filter_map(|p| p.as_deref())
        .filter(|p| !p.is_empty())
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// A place matching a free-text search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationMatch {
    pub place_id: String,
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
    pub osm_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

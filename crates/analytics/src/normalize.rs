//! Turn raw Overpass elements into business records and aggregate counts.

use common::{AnalyticsResult, BusinessRecord, Category, HOURS_NOT_AVAILABLE, UNNAMED_BUSINESS};
use geodata_client::OverpassElement;
use std::f64::consts::PI;

/// Tags copied into [`BusinessRecord::amenities`], in this order.
const AMENITY_DETAIL_TAGS: [&str; 4] = ["cuisine", "payment", "delivery", "takeaway"];

/// First recognised category among the `amenity` and `shop` tags.
pub fn recognised_category(element: &OverpassElement) -> Option<Category> {
    let parse = |key: &str| element.tag(key).and_then(|v| v.parse::<Category>().ok());
    parse("amenity").or_else(|| parse("shop"))
}

/// Map an element into a record with `category` as its type.
pub fn business_record(element: &OverpassElement, category: &str) -> BusinessRecord {
    let (lat, lon) = element.coordinates();
    let owned = |key: &str| element.tag(key).map(str::to_string);

    BusinessRecord {
        id: element.id,
        category: category.to_string(),
        name: owned("name").unwrap_or_else(|| UNNAMED_BUSINESS.to_string()),
        lat,
        lon,
        hours: owned("opening_hours").unwrap_or_else(|| HOURS_NOT_AVAILABLE.to_string()),
        amenities: AMENITY_DETAIL_TAGS
            .iter()
            .filter_map(|key| element.tag(key))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect(),
        street: owned("addr:street"),
        rating: owned("rating"),
        website: owned("website"),
        phone: owned("phone"),
    }
}

/// Businesses per unit area of a circle with `radius`; zero for a
/// non-positive radius.
pub fn density(total: usize, radius: f64) -> f64 {
    if radius <= 0.0 || !radius.is_finite() {
        return 0.0;
    }
    total as f64 / (PI * radius * radius)
}

/// Count, locate and list the recognised businesses among `elements`.
pub fn summarize_location(elements: &[OverpassElement], radius: f64) -> AnalyticsResult {
    let mut result = AnalyticsResult::empty();

    for element in elements {
        let Some(category) = recognised_category(element) else {
            continue;
        };
        *result.business_types.entry(category).or_insert(0) += 1;
        result
            .nearby_businesses
            .push(business_record(element, category.as_str()));
    }

    result.total_businesses = result.nearby_businesses.len();
    result.business_density = density(result.total_businesses, radius);
    result
}

/// Records whose `amenity` or `shop` tag equals `business_type`.
pub fn filter_business_type(elements: &[OverpassElement], business_type: &str) -> Vec<BusinessRecord> {
    elements
        .iter()
        .filter(|e| e.tag("amenity") == Some(business_type) || e.tag("shop") == Some(business_type))
        .map(|e| business_record(e, business_type))
        .collect()
}

//! Overpass QL builders.
//!
//! The search area is a fixed-degree square around the point rather than a
//! geodesic circle; coordinates are not range-checked.

use common::{Category, TagKey};

/// Rectangle in Overpass `(south,west,north,east)` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn around(lat: f64, lng: f64, pad_deg: f64) -> Self {
        Self {
            south: lat - pad_deg,
            west: lng - pad_deg,
            north: lat + pad_deg,
            east: lng + pad_deg,
        }
    }

    fn filter(&self) -> String {
        format!("({},{},{},{})", self.south, self.west, self.north, self.east)
    }
}

/// Quote a value for use inside a QL string literal.
fn escape_ql(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn wrap(selectors: &[String], bbox: &BoundingBox, timeout_secs: u64) -> String {
    let area = bbox.filter();
    let mut query = format!("[out:json][timeout:{timeout_secs}];\n(\n");
    for selector in selectors {
        for element in ["node", "way"] {
            query.push_str(&format!("  {element}{selector}{area};\n"));
        }
    }
    query.push_str(");\nout body;\n>;\nout skel qt;\n");
    query
}

fn alternation(key: TagKey) -> String {
    Category::under(key)
        .map(Category::as_str)
        .collect::<Vec<_>>()
        .join("|")
}

/// Every element tagged with one of the fixed analytics categories.
pub fn location_analytics_query(bbox: &BoundingBox, timeout_secs: u64) -> String {
    let selectors = [TagKey::Amenity, TagKey::Shop]
        .map(|key| format!("[\"{}\"~\"{}\"]", key.as_str(), alternation(key)));
    wrap(&selectors, bbox, timeout_secs)
}

/// Every element whose `amenity` or `shop` tag equals `business_type`.
pub fn business_type_query(bbox: &BoundingBox, business_type: &str, timeout_secs: u64) -> String {
    let value = escape_ql(business_type);
    let selectors = [TagKey::Amenity, TagKey::Shop]
        .map(|key| format!("[\"{}\"=\"{}\"]", key.as_str(), value));
    wrap(&selectors, bbox, timeout_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_pads_each_side() {
        let bbox = BoundingBox::around(28.5, 77.25, 0.25);
        assert_eq!(
            bbox,
            BoundingBox {
                south: 28.25,
                west: 77.0,
                north: 28.75,
                east: 77.5
            }
        );
    }

    #[test]
    fn test_location_analytics_query() {
        let bbox = BoundingBox::around(28.5, 77.25, 0.25);
        let q = location_analytics_query(&bbox, 25);

        assert!(q.starts_with("[out:json][timeout:25];\n(\n"));
        assert!(q.contains(
            "  node[\"amenity\"~\"restaurant|cafe|bank|pharmacy\"](28.25,77,28.75,77.5);\n"
        ));
        assert!(q.contains(
            "  way[\"amenity\"~\"restaurant|cafe|bank|pharmacy\"](28.25,77,28.75,77.5);\n"
        ));
        assert!(q.contains(
            "  node[\"shop\"~\"supermarket|convenience|copyshop\"](28.25,77,28.75,77.5);\n"
        ));
        assert!(q.contains(
            "  way[\"shop\"~\"supermarket|convenience|copyshop\"](28.25,77,28.75,77.5);\n"
        ));
        assert!(q.ends_with(");\nout body;\n>;\nout skel qt;\n"));
    }

    #[test]
    fn test_business_type_query() {
        let bbox = BoundingBox::around(0.0, 0.0, 0.5);
        let q = business_type_query(&bbox, "fuel", 10);

        assert!(q.starts_with("[out:json][timeout:10];"));
        assert!(q.contains("  node[\"amenity\"=\"fuel\"](-0.5,-0.5,0.5,0.5);\n"));
        assert!(q.contains("  way[\"shop\"=\"fuel\"](-0.5,-0.5,0.5,0.5);\n"));
        assert_eq!(q.matches("\"fuel\"").count(), 4);
    }

    #[test]
    fn test_business_type_is_escaped() {
        let bbox = BoundingBox::around(0.0, 0.0, 0.5);
        let q = business_type_query(&bbox, "cafe\"];out;", 10);

        assert!(q.contains("[\"amenity\"=\"cafe\\\"];out;\"]"));
        assert!(!q.contains("[\"amenity\"=\"cafe\"]"));
    }
}

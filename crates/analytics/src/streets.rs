//! Rank nearby streets by the businesses located on them.

use common::AnalyticsResult;
use serde::Serialize;

/// How many streets a ranking covers.
pub const STREETS_PER_REPORT: usize = 5;

/// Names used to pad the list when the geocoder found fewer streets.
const FILLER_STREETS: [&str; STREETS_PER_REPORT] = [
    "Market Road",
    "Business Park",
    "Commercial Avenue",
    "Vijay Chowk",
    "Shopping District",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreetReport {
    pub name: String,
    /// Nearby businesses whose `addr:street` is this street.
    pub businesses: usize,
    /// Distinct business types on the street, in first-seen order.
    pub categories: Vec<String>,
}

fn candidate_streets(streets: &[String]) -> Vec<String> {
    let mut names: Vec<String> = streets.iter().take(STREETS_PER_REPORT).cloned().collect();
    if names.len() < STREETS_PER_REPORT {
        names.extend(
            FILLER_STREETS[names.len()..]
                .iter()
                .map(|s| s.to_string()),
        );
    }
    names
}

/// Report on the first five streets (padded with filler names), busiest
/// first. Ties keep the geocoder's order.
pub fn rank_streets(streets: &[String], analytics: &AnalyticsResult) -> Vec<StreetReport> {
    let mut reports: Vec<StreetReport> = candidate_streets(streets)
        .into_iter()
        .map(|name| {
            let mut categories: Vec<String> = Vec::new();
            let mut businesses = 0;
            for business in analytics
                .nearby_businesses
                .iter()
                .filter(|b| b.street.as_deref() == Some(name.as_str()))
            {
                businesses += 1;
                if !categories.contains(&business.category) {
                    categories.push(business.category.clone());
                }
            }
            StreetReport {
                name,
                businesses,
                categories,
            }
        })
        .collect();

    // Stable sort keeps input order among equal counts.
    reports.sort_by(|a, b| b.businesses.cmp(&a.businesses));
    reports
}

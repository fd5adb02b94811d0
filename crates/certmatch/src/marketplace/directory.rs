//! Read-only filter over verified consultant listings.
//!
//! Works on a fully materialized collection; directory sizes are small enough
//! that nothing here needs to stream or paginate.

use serde::Deserialize;

use super::domain::ConsultantListing;

/// Facet and free-text constraints for a directory lookup.
///
/// The UI sends `all` for an unconstrained facet; [`DirectoryQuery::normalized`]
/// folds that sentinel (and blank values) into `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub standard: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

impl DirectoryQuery {
    pub fn normalized(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty() && v.trim() != "all")
        }

        Self {
            search: self.search.filter(|v| !v.trim().is_empty()),
            standard: keep(self.standard),
            industry: keep(self.industry),
            region: keep(self.region),
        }
    }
}

/// Applies the query to an already-fetched set of listings, preserving input
/// order. Facets match by exact set membership; the search text matches
/// case-insensitively against name, headline, and bio.
pub fn filter<'a>(
    listings: &'a [ConsultantListing],
    query: &DirectoryQuery,
) -> Vec<&'a ConsultantListing> {
    listings
        .iter()
        .filter(|listing| matches(listing, query))
        .collect()
}

fn matches(listing: &ConsultantListing, query: &DirectoryQuery) -> bool {
    if let Some(standard) = &query.standard {
        if !listing.profile.standards.iter().any(|s| s == standard) {
            return false;
        }
    }

    if let Some(industry) = &query.industry {
        if !listing.profile.industries.iter().any(|i| i == industry) {
            return false;
        }
    }

    if let Some(region) = &query.region {
        if !listing.profile.regions.iter().any(|r| r == region) {
            return false;
        }
    }

    if let Some(search) = &query.search {
        let needle = search.to_lowercase();
        let hit = contains_ci(&listing.name, &needle)
            || listing
                .profile
                .headline
                .as_deref()
                .is_some_and(|h| contains_ci(h, &needle))
            || listing
                .profile
                .bio
                .as_deref()
                .is_some_and(|b| contains_ci(b, &needle));
        if !hit {
            return false;
        }
    }

    true
}

fn contains_ci(haystack: &str, lowercase_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowercase_needle)
}

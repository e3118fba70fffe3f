//! Market eligibility filter.
//!
//! A rejection is an expected outcome, not an error: it carries a
//! human-readable reason that ends up in the evaluation record.

use std::fmt;

use crate::domain::MarketSnapshot;
use crate::strategy::MarketFilter;

use super::ranking::ActiveRanking;

/// Why a market failed the strategy's filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterRejection {
    InPlay,
    TooFewRunners { count: usize, min: usize },
    TooManyRunners { count: usize, max: usize },
    Country { country: String, allowed: Vec<String> },
    VenueNotIncluded { venue: String },
    VenueExcluded { venue: String, pattern: String },
}

impl fmt::Display for FilterRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterRejection::InPlay => write!(f, "In-play market excluded"),
            FilterRejection::TooFewRunners { count, min } => {
                write!(f, "Only {count} active runners (min: {min})")
            }
            FilterRejection::TooManyRunners { count, max } => {
                write!(f, "{count} runners exceeds max ({max})")
            }
            FilterRejection::Country { country, allowed } => {
                write!(f, "Country {country} not in {allowed:?}")
            }
            FilterRejection::VenueNotIncluded { venue } => {
                write!(f, "Venue '{venue}' not in include list")
            }
            FilterRejection::VenueExcluded { venue, pattern } => {
                write!(f, "Venue '{venue}' excluded by filter '{pattern}'")
            }
        }
    }
}

/// Apply `filter` to a market. Checks run in a fixed order and the first
/// failure wins.
pub fn check_market(
    filter: &MarketFilter,
    market: &MarketSnapshot,
    ranking: &ActiveRanking<'_>,
) -> Result<(), FilterRejection> {
    if filter.exclude_inplay && market.inplay {
        return Err(FilterRejection::InPlay);
    }

    let count = ranking.len();
    if count < filter.min_runners {
        return Err(FilterRejection::TooFewRunners {
            count,
            min: filter.min_runners,
        });
    }
    if let Some(max) = filter.runner_cap() {
        if count > max {
            return Err(FilterRejection::TooManyRunners { count, max });
        }
    }

    if !filter.countries.is_empty() && !filter.countries.contains(&market.event_country) {
        return Err(FilterRejection::Country {
            country: market.event_country.clone(),
            allowed: filter.countries.clone(),
        });
    }

    let venue = market.venue.to_lowercase();
    if !filter.venue_contains.is_empty()
        && !filter
            .venue_contains
            .iter()
            .any(|p| venue.contains(&p.to_lowercase()))
    {
        return Err(FilterRejection::VenueNotIncluded {
            venue: market.venue.clone(),
        });
    }
    if let Some(pattern) = filter
        .venue_excludes
        .iter()
        .find(|p| venue.contains(&p.to_lowercase()))
    {
        return Err(FilterRejection::VenueExcluded {
            venue: market.venue.clone(),
            pattern: pattern.clone(),
        });
    }

    Ok(())
}

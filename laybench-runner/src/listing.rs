//! Market listing for a recorded date, grouped by venue.
//!
//! Listing reads only the first capture of the day: it answers "what was on
//! the card", not "what happened".

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use laybench_core::domain::{MarketId, RunnerStatus, SelectionId};

use crate::records::is_main_race;
use crate::store::{SnapshotSource, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunnerListing {
    pub selection_id: SelectionId,
    pub runner_name: String,
    pub best_lay_odds: Option<f64>,
    pub best_back_odds: Option<f64>,
    pub status: RunnerStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketListing {
    pub market_id: MarketId,
    pub market_name: String,
    pub market_start_time: String,
    pub venue: String,
    pub event_name: String,
    /// Active runners with a lay price.
    pub runner_count: usize,
    pub total_matched: f64,
    /// Active runners only.
    pub runners: Vec<RunnerListing>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VenueListing {
    pub venue: String,
    pub markets: Vec<MarketListing>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateListing {
    pub date: NaiveDate,
    pub venues: Vec<VenueListing>,
    pub total_markets: usize,
    pub snapshot_count: usize,
}

/// Single-winner main-race markets for `date`, venues sorted by name and
/// markets by start time.
pub fn list_markets<S: SnapshotSource + ?Sized>(
    source: &S,
    date: NaiveDate,
) -> Result<DateListing, StoreError> {
    let pairs = source.list_snapshot_pairs(date)?;
    let Some(first) = pairs.first() else {
        return Ok(DateListing {
            date,
            venues: Vec::new(),
            total_markets: 0,
            snapshot_count: 0,
        });
    };

    let mut venues: BTreeMap<String, Vec<MarketListing>> = BTreeMap::new();
    let mut total_markets = 0;

    for m in source.load_pair(first)? {
        if m.number_of_winners != 1 || !is_main_race(&m.market_name, &m.event_name) {
            continue;
        }
        total_markets += 1;

        let venue = if m.venue.is_empty() {
            "Unknown".to_string()
        } else {
            m.venue.clone()
        };
        let runner_count = m
            .runners
            .iter()
            .filter(|r| r.status == RunnerStatus::Active && r.best_available_to_lay.is_some())
            .count();
        let runners = m
            .runners
            .iter()
            .filter(|r| r.status == RunnerStatus::Active)
            .map(|r| RunnerListing {
                selection_id: r.selection_id,
                runner_name: r.runner_name.clone(),
                best_lay_odds: r.best_available_to_lay,
                best_back_odds: r.best_available_to_back,
                status: r.status,
            })
            .collect();

        venues.entry(venue.clone()).or_default().push(MarketListing {
            market_id: m.market_id,
            market_name: m.market_name,
            market_start_time: m.market_start_time,
            venue,
            event_name: m.event_name,
            runner_count,
            total_matched: m.total_matched,
            runners,
        });
    }

    let venues = venues
        .into_iter()
        .map(|(venue, mut markets)| {
            markets.sort_by(|a, b| a.market_start_time.cmp(&b.market_start_time));
            VenueListing { venue, markets }
        })
        .collect();

    Ok(DateListing {
        date,
        venues,
        total_markets,
        snapshot_count: pairs.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::store::LocalSnapshotStore;

    fn book(id: &str, winners: u32) -> String {
        format!(
            r#"{{"marketId":"{id}","status":"OPEN","numberOfWinners":{winners},"totalMatched":100.0,
               "runners":[{{"selectionId":1,"ex":{{"availableToLay":[{{"price":2.5,"size":10.0}}]}}}},
                          {{"selectionId":2,"status":"REMOVED"}},
                          {{"selectionId":3,"ex":{{}}}}]}}"#
        )
        .replace('\n', "")
    }

    fn catalogue(id: &str, name: &str, venue: &str, start: &str) -> String {
        format!(
            r#"{{"marketId":"{id}","marketName":"{name}","marketStartTime":"{start}","event":{{"name":"{venue} 25th Apr","venue":"{venue}"}}}}"#
        )
    }

    #[test]
    fn groups_by_venue_from_first_capture() {
        let dir = tempfile::tempdir().unwrap();
        let books = [
            book("1.1", 1),
            book("1.2", 1),
            book("1.3", 1),
            book("1.4", 3),
            book("1.5", 1),
        ]
        .join("\n");
        let cats = [
            catalogue("1.1", "R2 1m", "York", "2026-04-25T15:00:00Z"),
            catalogue("1.2", "R1 5f", "York", "2026-04-25T14:00:00Z"),
            catalogue("1.3", "R1 2m Hrd", "Ayr", "2026-04-25T13:00:00Z"),
            catalogue("1.4", "R1 2m Hrd", "Ayr", "2026-04-25T13:00:00Z"),
            catalogue("1.5", "Forecast", "Ayr", "2026-04-25T13:00:00Z"),
        ]
        .join("\n");
        let file = |kind: &str, time: &str| {
            dir.path()
                .join(format!("betfair-live_7_2026-04-25_{kind}_{time}.ndjson"))
        };
        fs::write(file("books", "09-00-00"), books).unwrap();
        fs::write(file("catalogue", "09-00-00"), cats).unwrap();
        // Later capture is ignored by the listing but counted.
        fs::write(file("books", "10-00-00"), "").unwrap();
        fs::write(file("catalogue", "10-00-00"), "").unwrap();

        let store = LocalSnapshotStore::new(dir.path());
        let date = NaiveDate::from_ymd_opt(2026, 4, 25).unwrap();
        let listing = list_markets(&store, date).unwrap();

        assert_eq!(listing.total_markets, 3);
        assert_eq!(listing.snapshot_count, 2);
        let venues: Vec<&str> = listing.venues.iter().map(|v| v.venue.as_str()).collect();
        assert_eq!(venues, vec!["Ayr", "York"]);

        let york: Vec<&str> = listing.venues[1]
            .markets
            .iter()
            .map(|m| m.market_id.as_str())
            .collect();
        assert_eq!(york, vec!["1.2", "1.1"]);

        let market = &listing.venues[0].markets[0];
        assert_eq!(market.runner_count, 1);
        assert_eq!(market.runners.len(), 2);
        assert_eq!(market.runners[0].best_lay_odds, Some(2.5));
    }

    #[test]
    fn empty_date() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalSnapshotStore::new(dir.path());
        let listing = list_markets(&store, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()).unwrap();
        assert!(listing.venues.is_empty());
        assert_eq!(listing.total_markets, 0);
    }
}

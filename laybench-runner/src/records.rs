//! Raw recorder records and their join into market snapshots.
//!
//! The recorder writes two NDJSON streams per capture: market books (prices,
//! statuses) and market catalogues (names, venue, start time). A snapshot
//! exists only where both sides are present for the same market id.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use laybench_core::domain::{
    MarketId, MarketSnapshot, MarketStatus, PriceSize, RunnerSnapshot, RunnerStatus, SelectionId,
};

/// Name fragments that mark a market as something other than the main WIN
/// market (forecasts, place markets, match bets and so on).
pub const EXOTIC_PATTERNS: &[&str] = &[
    "forecast",
    "reverse fc",
    "match bet",
    "without ",
    "to win by over",
    "to be placed",
    "each way",
    "daily win dist",
    "winning distances",
];

// ─── Books ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub market_id: String,
    #[serde(default)]
    pub status: Option<MarketStatus>,
    #[serde(default)]
    pub inplay: Option<bool>,
    #[serde(default)]
    pub number_of_winners: Option<u32>,
    #[serde(default)]
    pub total_matched: Option<f64>,
    #[serde(default)]
    pub runners: Vec<RunnerBook>,
    #[serde(default, rename = "_recorded_at")]
    pub recorded_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerBook {
    pub selection_id: u64,
    #[serde(default)]
    pub handicap: Option<f64>,
    #[serde(default)]
    pub status: Option<RunnerStatus>,
    #[serde(default)]
    pub last_price_traded: Option<f64>,
    #[serde(default)]
    pub total_matched: Option<f64>,
    #[serde(default)]
    pub ex: ExchangePrices,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangePrices {
    #[serde(default)]
    pub available_to_back: Vec<PriceSize>,
    #[serde(default)]
    pub available_to_lay: Vec<PriceSize>,
}

// ─── Catalogues ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueRecord {
    pub market_id: String,
    #[serde(default)]
    pub market_name: Option<String>,
    #[serde(default)]
    pub market_start_time: Option<String>,
    #[serde(default)]
    pub event: Option<EventInfo>,
    #[serde(default)]
    pub runners: Vec<RunnerCatalogue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerCatalogue {
    pub selection_id: u64,
    #[serde(default)]
    pub runner_name: Option<String>,
}

// ─── Join ───────────────────────────────────────────────────────────

/// Build one snapshot from a book and its catalogue.
///
/// Missing fields take neutral defaults: market status `UNKNOWN`, runner
/// status `ACTIVE`, one winner, zero volume. A selection id that appears twice
/// in the book keeps its first entry.
pub fn build_snapshot(book: &BookRecord, catalogue: &CatalogueRecord) -> MarketSnapshot {
    let names: HashMap<u64, &str> = catalogue
        .runners
        .iter()
        .filter_map(|r| r.runner_name.as_deref().map(|n| (r.selection_id, n)))
        .collect();

    let mut seen = HashSet::new();
    let runners = book
        .runners
        .iter()
        .filter(|r| seen.insert(r.selection_id))
        .map(|r| RunnerSnapshot {
            selection_id: SelectionId(r.selection_id),
            runner_name: names
                .get(&r.selection_id)
                .map(|n| n.to_string())
                .unwrap_or_else(|| format!("Selection {}", r.selection_id)),
            handicap: r.handicap.unwrap_or(0.0),
            status: r.status.unwrap_or(RunnerStatus::Active),
            best_available_to_lay: r.ex.available_to_lay.first().map(|p| p.price),
            best_available_to_back: r.ex.available_to_back.first().map(|p| p.price),
            lay_depth: r.ex.available_to_lay.clone(),
            back_depth: r.ex.available_to_back.clone(),
            last_price_traded: r.last_price_traded,
            total_matched: r.total_matched.unwrap_or(0.0),
        })
        .collect();

    let event = catalogue.event.clone().unwrap_or_default();
    let venue = event
        .venue
        .clone()
        .or_else(|| event.name.clone())
        .unwrap_or_else(|| "Unknown".to_string());

    MarketSnapshot {
        market_id: MarketId::new(book.market_id.clone()),
        market_name: catalogue.market_name.clone().unwrap_or_default(),
        venue,
        market_start_time: catalogue.market_start_time.clone().unwrap_or_default(),
        event_name: event.name.unwrap_or_default(),
        event_country: event.country_code.unwrap_or_default(),
        status: book.status.unwrap_or(MarketStatus::Unknown),
        inplay: book.inplay.unwrap_or(false),
        recorded_at: book.recorded_at.clone().unwrap_or_default(),
        number_of_winners: book.number_of_winners.unwrap_or(1),
        total_matched: book.total_matched.unwrap_or(0.0),
        runners,
    }
}

/// Join a capture's books with its catalogues by market id.
///
/// Books without a catalogue are dropped. Output keeps book order.
pub fn join_records(books: &[BookRecord], catalogues: &[CatalogueRecord]) -> Vec<MarketSnapshot> {
    let by_id: HashMap<&str, &CatalogueRecord> = catalogues
        .iter()
        .map(|c| (c.market_id.as_str(), c))
        .collect();

    books
        .iter()
        .filter_map(|book| {
            by_id
                .get(book.market_id.as_str())
                .map(|cat| build_snapshot(book, cat))
        })
        .collect()
}

/// True unless the market or event name contains an exotic pattern
/// (case-insensitive). Both names are checked since some feeds swap them.
pub fn is_main_race(market_name: &str, event_name: &str) -> bool {
    let combined = format!("{market_name} {event_name}").to_lowercase();
    !EXOTIC_PATTERNS.iter().any(|p| combined.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(json: &str) -> BookRecord {
        serde_json::from_str(json).unwrap()
    }

    fn catalogue(json: &str) -> CatalogueRecord {
        serde_json::from_str(json).unwrap()
    }

    const BOOK: &str = r#"{
        "marketId": "1.100",
        "status": "OPEN",
        "inplay": false,
        "numberOfWinners": 1,
        "totalMatched": 1523.5,
        "_recorded_at": "2026-04-25T13:55:02Z",
        "runners": [
            {"selectionId": 11, "handicap": 0.0, "status": "ACTIVE",
             "lastPriceTraded": 2.1, "totalMatched": 800.0,
             "ex": {"availableToBack": [{"price": 2.08, "size": 50.0}],
                    "availableToLay": [{"price": 2.12, "size": 30.0}, {"price": 2.14, "size": 90.0}]}},
            {"selectionId": 22, "status": "ACTIVE", "ex": {}},
            {"selectionId": 11, "status": "REMOVED"}
        ]
    }"#;

    const CATALOGUE: &str = r#"{
        "marketId": "1.100",
        "marketName": "R4 1m Hcap",
        "marketStartTime": "2026-04-25T14:00:00.000Z",
        "event": {"name": "Newmarket 25th Apr", "venue": "Newmarket", "countryCode": "GB"},
        "runners": [{"selectionId": 11, "runnerName": "Swift Arrow"}]
    }"#;

    #[test]
    fn builds_snapshot_with_prices_and_names() {
        let s = build_snapshot(&book(BOOK), &catalogue(CATALOGUE));
        assert_eq!(s.market_id.as_str(), "1.100");
        assert_eq!(s.market_name, "R4 1m Hcap");
        assert_eq!(s.venue, "Newmarket");
        assert_eq!(s.event_country, "GB");
        assert_eq!(s.status, MarketStatus::Open);
        assert_eq!(s.recorded_at, "2026-04-25T13:55:02Z");
        assert_eq!(s.total_matched, 1523.5);

        let first = &s.runners[0];
        assert_eq!(first.runner_name, "Swift Arrow");
        assert_eq!(first.best_available_to_lay, Some(2.12));
        assert_eq!(first.best_available_to_back, Some(2.08));
        assert_eq!(first.lay_depth.len(), 2);
        assert_eq!(first.last_price_traded, Some(2.1));
    }

    #[test]
    fn duplicate_selection_keeps_first() {
        let s = build_snapshot(&book(BOOK), &catalogue(CATALOGUE));
        assert_eq!(s.runners.len(), 2);
        assert_eq!(s.runners[0].status, RunnerStatus::Active);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let b = book(r#"{"marketId":"1.2","runners":[{"selectionId":7}]}"#);
        let c = catalogue(r#"{"marketId":"1.2"}"#);
        let s = build_snapshot(&b, &c);
        assert_eq!(s.status, MarketStatus::Unknown);
        assert!(!s.inplay);
        assert_eq!(s.number_of_winners, 1);
        assert_eq!(s.venue, "Unknown");
        assert_eq!(s.market_name, "");

        let r = &s.runners[0];
        assert_eq!(r.runner_name, "Selection 7");
        assert_eq!(r.status, RunnerStatus::Active);
        assert_eq!(r.best_available_to_lay, None);
        assert_eq!(r.total_matched, 0.0);
    }

    #[test]
    fn venue_falls_back_to_event_name() {
        let b = book(r#"{"marketId":"1.2"}"#);
        let c = catalogue(r#"{"marketId":"1.2","event":{"name":"Punchestown"}}"#);
        assert_eq!(build_snapshot(&b, &c).venue, "Punchestown");
    }

    #[test]
    fn unrecognised_statuses_parse_as_unknown() {
        let b = book(
            r#"{"marketId":"1.2","status":"SETTLING",
                "runners":[{"selectionId":1,"status":"DEAD_HEAT"}]}"#,
        );
        let s = build_snapshot(&b, &catalogue(r#"{"marketId":"1.2"}"#));
        assert_eq!(s.status, MarketStatus::Unknown);
        assert_eq!(s.runners[0].status, RunnerStatus::Unknown);
    }

    #[test]
    fn join_drops_books_without_catalogue() {
        let books = vec![
            book(r#"{"marketId":"1.1"}"#),
            book(r#"{"marketId":"1.2"}"#),
            book(r#"{"marketId":"1.3"}"#),
        ];
        let cats = vec![
            catalogue(r#"{"marketId":"1.3"}"#),
            catalogue(r#"{"marketId":"1.1"}"#),
        ];
        let joined = join_records(&books, &cats);
        let ids: Vec<&str> = joined.iter().map(|m| m.market_id.as_str()).collect();
        assert_eq!(ids, vec!["1.1", "1.3"]);
    }

    #[test]
    fn classifier_rejects_exotics() {
        assert!(is_main_race("R4 1m Hcap", "Newmarket 25th Apr"));
        assert!(is_main_race("2m4f Hrd", ""));
        assert!(!is_main_race("Reverse FC", "Newmarket"));
        assert!(!is_main_race("Each Way", "Ascot"));
        assert!(!is_main_race("To Be Placed", "Ascot"));
        assert!(!is_main_race("Win Market", "Without Fav Ascot"));
        assert!(!is_main_race("Daily Win Dist", ""));
        assert!(!is_main_race("R1", "Match Bets"));
        // "without" needs the trailing space
        assert!(is_main_race("Withoutabox Stakes", ""));
    }

    // ── Strategies (proptest) ──

    use proptest::prelude::*;

    fn exotic_pattern() -> impl proptest::strategy::Strategy<Value = String> {
        (0..EXOTIC_PATTERNS.len(), any::<u64>()).prop_map(|(i, mask)| {
            EXOTIC_PATTERNS[i]
                .chars()
                .enumerate()
                .map(|(n, c)| {
                    if mask >> (n % 64) & 1 == 1 {
                        c.to_ascii_uppercase()
                    } else {
                        c
                    }
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn any_casing_of_an_exotic_pattern_is_excluded(
            pattern in exotic_pattern(),
            prefix in "[A-Za-z0-9 ]{0,12}",
            suffix in "[A-Za-z0-9 ]{0,12}",
            in_event in any::<bool>(),
        ) {
            let text = format!("{prefix}{pattern}{suffix}");
            let excluded = if in_event {
                !is_main_race("R1 6f", &text)
            } else {
                !is_main_race(&text, "Ascot 25th Apr")
            };
            prop_assert!(excluded);
        }
    }
}

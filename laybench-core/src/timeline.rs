//! Per-market timelines built from a day's chronologically ordered snapshots.
//!
//! Timelines keep the order in which markets were first seen, so anything
//! listed from them is reproducible across runs.

use std::collections::HashMap;

use chrono::NaiveTime;

use crate::domain::{MarketId, MarketSnapshot};

/// One snapshot of a market, tagged with the capture time of its file pair.
#[derive(Debug, Clone)]
pub struct TimelineEntry {
    pub recorded_at: NaiveTime,
    pub snapshot: MarketSnapshot,
}

/// All snapshots of one market, oldest first.
#[derive(Debug, Clone)]
pub struct MarketTimeline {
    pub market_id: MarketId,
    pub entries: Vec<TimelineEntry>,
}

impl MarketTimeline {
    /// Latest snapshot that is OPEN and not in-play: the state closest to the off.
    pub fn pre_race_snapshot(&self) -> Option<&MarketSnapshot> {
        self.entries
            .iter()
            .rev()
            .map(|e| &e.snapshot)
            .find(|s| s.is_pre_race())
    }

    /// Latest snapshot carrying WINNER/LOSER statuses; the latest is authoritative.
    pub fn settlement_snapshot(&self) -> Option<&MarketSnapshot> {
        self.entries
            .iter()
            .rev()
            .map(|e| &e.snapshot)
            .find(|s| s.has_settled_runners())
    }

    /// Single-winner main race, according to `is_main_race(market_name, event_name)`.
    ///
    /// One qualifying snapshot is enough.
    pub fn is_single_winner_main_race<F>(&self, is_main_race: F) -> bool
    where
        F: Fn(&str, &str) -> bool,
    {
        self.entries.iter().any(|e| {
            e.snapshot.number_of_winners == 1
                && is_main_race(&e.snapshot.market_name, &e.snapshot.event_name)
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Groups snapshots by market id, preserving first-appearance order.
#[derive(Debug, Default)]
pub struct TimelineBuilder {
    timelines: Vec<MarketTimeline>,
    index: HashMap<MarketId, usize>,
}

impl TimelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot. Callers must push in chronological order.
    pub fn push(&mut self, recorded_at: NaiveTime, snapshot: MarketSnapshot) {
        let slot = match self.index.get(&snapshot.market_id) {
            Some(&i) => i,
            None => {
                let i = self.timelines.len();
                self.index.insert(snapshot.market_id.clone(), i);
                self.timelines.push(MarketTimeline {
                    market_id: snapshot.market_id.clone(),
                    entries: Vec::new(),
                });
                i
            }
        };
        self.timelines[slot].entries.push(TimelineEntry {
            recorded_at,
            snapshot,
        });
    }

    /// Append every market of one snapshot pair.
    pub fn extend<I>(&mut self, recorded_at: NaiveTime, snapshots: I)
    where
        I: IntoIterator<Item = MarketSnapshot>,
    {
        for snapshot in snapshots {
            self.push(recorded_at, snapshot);
        }
    }

    pub fn market_count(&self) -> usize {
        self.timelines.len()
    }

    pub fn build(self) -> Vec<MarketTimeline> {
        self.timelines
    }
}

/// Build timelines from `(timestamp, snapshot)` pairs already in time order.
pub fn build_timelines<I>(entries: I) -> Vec<MarketTimeline>
where
    I: IntoIterator<Item = (NaiveTime, MarketSnapshot)>,
{
    let mut builder = TimelineBuilder::new();
    for (recorded_at, snapshot) in entries {
        builder.push(recorded_at, snapshot);
    }
    builder.build()
}

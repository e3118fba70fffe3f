//! Snapshot store — dated NDJSON captures on the local filesystem.
//!
//! The recorder writes one books file and one catalogue file per capture:
//!
//! ```text
//! betfair-live_7_2026-04-25_books_13-55-00.ndjson
//! betfair-live_7_2026-04-25_catalogue_13-55-00.ndjson
//! ```
//!
//! A capture is usable only when both halves exist. The simulator talks to the
//! store through [`SnapshotSource`], so another backend can be swapped in.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveTime};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use laybench_core::domain::MarketSnapshot;
use laybench_core::StrategyError;

use crate::records::{join_records, BookRecord, CatalogueRecord};

const FILE_PREFIX: &str = "betfair-live_7_";
const FILE_SUFFIX: &str = ".ndjson";

/// Errors from the snapshot and strategy stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: malformed record: {source}")]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("invalid strategy id '{0}' (letters, digits, '-' and '_' only)")]
    InvalidStrategyId(String),
    #[error("strategy '{0}' not found")]
    StrategyNotFound(String),
    #[error("{path}: document id '{id}' does not match the file name")]
    StrategyIdMismatch { path: PathBuf, id: String },
    #[error(transparent)]
    Strategy(#[from] StrategyError),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Parse a `YYYY-MM-DD` date argument.
pub fn parse_date(s: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| StoreError::InvalidDate(s.to_string()))
}

// ─── File naming ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RecordKind {
    Books,
    Catalogue,
}

/// Parse a capture filename into `(date, kind, time)`.
///
/// Directory components are ignored. Returns `None` for anything that is not
/// a capture file.
pub fn parse_filename(name: &str) -> Option<(NaiveDate, RecordKind, NaiveTime)> {
    let base = name.rsplit('/').next().unwrap_or(name);
    let stem = base.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;

    let mut parts = stem.splitn(3, '_');
    let date = NaiveDate::parse_from_str(parts.next()?, "%Y-%m-%d").ok()?;
    let kind = match parts.next()? {
        "books" => RecordKind::Books,
        "catalogue" => RecordKind::Catalogue,
        _ => return None,
    };
    let time = NaiveTime::parse_from_str(parts.next()?, "%H-%M-%S").ok()?;
    Some((date, kind, time))
}

/// One capture: a books file and the catalogue recorded alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPair {
    pub date: NaiveDate,
    pub timestamp: NaiveTime,
    pub books_path: PathBuf,
    pub catalogue_path: PathBuf,
}

// ─── NDJSON ─────────────────────────────────────────────────────────

/// Read an NDJSON file. Blank lines are skipped; a malformed line fails the
/// whole read with its 1-based line number.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
    let mut records = Vec::new();

    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| StoreError::io(path, e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|source| StoreError::Malformed {
            path: path.to_path_buf(),
            line: idx + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

// ─── Source trait ───────────────────────────────────────────────────

/// Where the simulator gets its snapshots from.
pub trait SnapshotSource: Send + Sync {
    /// Dates with at least one capture file, ascending.
    fn list_available_dates(&self) -> Result<Vec<NaiveDate>, StoreError>;

    /// Complete captures for `date`, oldest first.
    fn list_snapshot_pairs(&self, date: NaiveDate) -> Result<Vec<SnapshotPair>, StoreError>;

    /// Read both halves of a capture and join them into snapshots.
    fn load_pair(&self, pair: &SnapshotPair) -> Result<Vec<MarketSnapshot>, StoreError>;
}

/// Snapshot store over a flat local directory.
#[derive(Debug, Clone)]
pub struct LocalSnapshotStore {
    root: PathBuf,
}

impl LocalSnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every capture file in the directory. A missing directory is empty.
    fn capture_files(
        &self,
    ) -> Result<Vec<(NaiveDate, RecordKind, NaiveTime, PathBuf)>, StoreError> {
        if !self.root.is_dir() {
            warn!(dir = %self.root.display(), "snapshot directory does not exist");
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.root, e))?;
            let name = entry.file_name();
            if let Some((date, kind, time)) = name.to_str().and_then(parse_filename) {
                files.push((date, kind, time, entry.path()));
            }
        }
        Ok(files)
    }
}

impl SnapshotSource for LocalSnapshotStore {
    fn list_available_dates(&self) -> Result<Vec<NaiveDate>, StoreError> {
        let dates: BTreeSet<NaiveDate> = self
            .capture_files()?
            .into_iter()
            .map(|(date, _, _, _)| date)
            .collect();
        Ok(dates.into_iter().collect())
    }

    fn list_snapshot_pairs(&self, date: NaiveDate) -> Result<Vec<SnapshotPair>, StoreError> {
        let mut groups: BTreeMap<NaiveTime, (Option<PathBuf>, Option<PathBuf>)> = BTreeMap::new();
        for (file_date, kind, time, path) in self.capture_files()? {
            if file_date != date {
                continue;
            }
            let slot = groups.entry(time).or_default();
            match kind {
                RecordKind::Books => slot.0 = Some(path),
                RecordKind::Catalogue => slot.1 = Some(path),
            }
        }

        let pairs: Vec<SnapshotPair> = groups
            .into_iter()
            .filter_map(|(timestamp, files)| match files {
                (Some(books_path), Some(catalogue_path)) => Some(SnapshotPair {
                    date,
                    timestamp,
                    books_path,
                    catalogue_path,
                }),
                _ => {
                    debug!(%date, %timestamp, "incomplete capture skipped");
                    None
                }
            })
            .collect();

        debug!(%date, pairs = pairs.len(), "listed snapshot pairs");
        Ok(pairs)
    }

    fn load_pair(&self, pair: &SnapshotPair) -> Result<Vec<MarketSnapshot>, StoreError> {
        let books: Vec<BookRecord> = read_records(&pair.books_path)?;
        let catalogues: Vec<CatalogueRecord> = read_records(&pair.catalogue_path)?;
        let markets = join_records(&books, &catalogues);
        debug!(
            timestamp = %pair.timestamp,
            books = books.len(),
            catalogues = catalogues.len(),
            markets = markets.len(),
            "loaded snapshot pair"
        );
        Ok(markets)
    }
}

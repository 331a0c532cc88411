//! Watchlist store
//!
//! Holds the reference entities (sanctions, PEP and operator-defined lists)
//! as an immutable snapshot. Reload builds a complete new collection and
//! swaps it in, so a match in flight sees either the old or the new list,
//! never a mix. Loading fails open: an unreadable source yields an empty
//! list and a warning.

use crate::error::{Error, Result};
use crate::types::{ListType, WatchlistEntry};
use arc_swap::ArcSwap;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Default separator inside the `aliases` column
pub const DEFAULT_ALIAS_DELIMITER: char = '|';

#[derive(Debug, Deserialize)]
struct WatchlistRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    aliases: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    list_type: Option<String>,
}

impl WatchlistRecord {
    fn into_entry(self, row: usize, delimiter: char) -> WatchlistEntry {
        let aliases = self
            .aliases
            .map(|joined| {
                joined
                    .split(delimiter)
                    .map(str::trim)
                    .filter(|alias| !alias.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        WatchlistEntry {
            id: non_empty(self.id).unwrap_or_else(|| format!("row-{}", row + 1)),
            name: self.name.map(|n| n.trim().to_string()).unwrap_or_default(),
            aliases,
            country: non_empty(self.country),
            source: non_empty(self.source),
            list_type: self.list_type.map(ListType::from).unwrap_or_default(),
        }
    }
}

fn non_empty(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Shared, atomically swappable watchlist
pub struct WatchlistStore {
    source: Option<PathBuf>,
    alias_delimiter: char,
    entries: ArcSwap<Vec<WatchlistEntry>>,
}

impl WatchlistStore {
    /// In-memory store with no backing source
    pub fn new(entries: Vec<WatchlistEntry>) -> Self {
        Self {
            source: None,
            alias_delimiter: DEFAULT_ALIAS_DELIMITER,
            entries: ArcSwap::from_pointee(entries),
        }
    }

    /// Open a CSV-backed store. Never fails; an unreadable source yields an
    /// empty watchlist.
    pub fn open(path: impl Into<PathBuf>, alias_delimiter: char) -> Self {
        let store = Self {
            source: Some(path.into()),
            alias_delimiter,
            entries: ArcSwap::from_pointee(Vec::new()),
        };
        store.reload();
        store
    }

    /// Read and parse a watchlist CSV file
    pub fn load(path: &Path, alias_delimiter: char) -> Result<Vec<WatchlistEntry>> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::LoadFailure(format!("{}: {}", path.display(), e)))?;
        Self::parse(file, alias_delimiter)
    }

    /// Parse watchlist records from CSV with a header row
    pub fn parse<R: Read>(reader: R, alias_delimiter: char) -> Result<Vec<WatchlistEntry>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_reader(reader);

        let mut entries = Vec::new();
        for (row, record) in csv_reader.deserialize::<WatchlistRecord>().enumerate() {
            let record = record.map_err(|e| Error::LoadFailure(format!("row {}: {}", row + 1, e)))?;
            entries.push(record.into_entry(row, alias_delimiter));
        }
        Ok(entries)
    }

    /// Re-read the backing source and swap the snapshot. Returns the number
    /// of entries now held.
    pub fn reload(&self) -> usize {
        let Some(path) = &self.source else {
            return self.len();
        };

        let entries = match Self::load(path, self.alias_delimiter) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not load watchlist, continuing with empty list: {}", e);
                Vec::new()
            }
        };

        let count = entries.len();
        self.entries.store(Arc::new(entries));
        info!("Loaded watchlist from {} with {} entries", path.display(), count);
        count
    }

    /// Replace the whole collection
    pub fn replace(&self, entries: Vec<WatchlistEntry>) {
        self.entries.store(Arc::new(entries));
    }

    /// Current snapshot (lock-free)
    pub fn snapshot(&self) -> Arc<Vec<WatchlistEntry>> {
        self.entries.load_full()
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

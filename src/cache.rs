//! Caller-owned series cache
//!
//! Series fetched for a date range are kept here and handed to whatever
//! needs them. The cache is an ordinary value: create one per request (or
//! per session) and pass it by reference.

use crate::error::Result;
use crate::series::TimeSeries;
use chrono::NaiveDate;
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;

/// Identifies a cached series: what it is and the range it was fetched for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SeriesKey {
    pub fn new(id: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            id: id.into(),
            start,
            end,
        }
    }
}

/// Map of fetched series with hit/miss counters
#[derive(Debug, Clone, Default)]
pub struct SeriesCache {
    entries: HashMap<SeriesKey, TimeSeries>,
    hits: u64,
    misses: u64,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a series, counting the hit or miss
    pub fn get(&mut self, key: &SeriesKey) -> Option<&TimeSeries> {
        match self.entries.get(key) {
            Some(series) => {
                self.hits += 1;
                Some(series)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: SeriesKey, series: TimeSeries) {
        self.entries.insert(key, series);
    }

    /// Return the cached series, or load and cache it
    ///
    /// A failed load leaves the cache untouched.
    pub fn get_or_try_insert_with<F>(&mut self, key: SeriesKey, load: F) -> Result<&TimeSeries>
    where
        F: FnOnce() -> Result<TimeSeries>,
    {
        let series: &TimeSeries = match self.entries.entry(key) {
            Entry::Occupied(entry) => {
                self.hits += 1;
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                self.misses += 1;
                let key = entry.key();
                log::debug!("Cache miss for {} ({} .. {})", key.id, key.start, key.end);
                entry.insert(load()?)
            }
        };

        Ok(series)
    }

    /// Drop every entry for `id`, whatever its range
    pub fn invalidate(&mut self, id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.id != id);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

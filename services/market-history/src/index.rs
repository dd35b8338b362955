//! Ordered bucket store
//!
//! Records are kept in a `BTreeMap` ordered by `(base, quote, duration,
//! window_open)`, which gives exact lookup and ordered scans of one series.
//! Mutations made through an [`UndoSession`] are journaled and reverted if
//! the session is dropped without [`UndoSession::commit`].

use crate::bucket::{BucketKey, BucketRecord, SeriesKey};
use crate::error::{MarketHistoryError, Result};
use common::BlockTime;
use std::collections::BTreeMap;
use std::ops::{Deref, Range};
use tracing::{debug, warn};

/// All live bucket records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketIndex {
    buckets: BTreeMap<BucketKey, BucketRecord>,
}

impl BucketIndex {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// True when no records exist
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Exact lookup
    #[must_use]
    pub fn find(&self, key: &BucketKey) -> Option<&BucketRecord> {
        self.buckets.get(key)
    }

    /// Records of `from`'s series starting at `from`, in window order
    pub fn lower_bound(
        &self,
        from: BucketKey,
    ) -> impl Iterator<Item = (&BucketKey, &BucketRecord)> + '_ {
        let series = from.series();
        self.buckets
            .range(from..)
            .take_while(move |(key, _)| key.series() == series)
    }

    /// Every record of a series, oldest window first
    pub fn series(
        &self,
        series: SeriesKey,
    ) -> impl Iterator<Item = (&BucketKey, &BucketRecord)> + '_ {
        self.lower_bound(series.first_bucket())
    }

    /// Records of a series whose window opens within `window`
    pub fn range(
        &self,
        series: SeriesKey,
        window: Range<BlockTime>,
    ) -> impl Iterator<Item = (&BucketKey, &BucketRecord)> + '_ {
        let end = window.end.max(window.start);
        self.buckets
            .range(series.bucket(window.start)..series.bucket(end))
    }

    /// Number of windows held for a series
    #[must_use]
    pub fn series_len(&self, series: SeriesKey) -> usize {
        self.series(series).count()
    }

    /// All records in key order
    pub fn iter(&self) -> impl Iterator<Item = (&BucketKey, &BucketRecord)> + '_ {
        self.buckets.iter()
    }

    /// Create a record; fails if the key is taken
    pub fn insert(&mut self, key: BucketKey, record: BucketRecord) -> Result<()> {
        if self.buckets.contains_key(&key) {
            return Err(MarketHistoryError::DuplicateBucket(key));
        }
        self.buckets.insert(key, record);
        Ok(())
    }

    /// Mutate a record in place, returning its previous value.
    ///
    /// The mutator works on a copy; if it fails the stored record is
    /// unchanged.
    pub fn modify<F>(&mut self, key: &BucketKey, mutator: F) -> Result<BucketRecord>
    where
        F: FnOnce(&mut BucketRecord) -> Result<()>,
    {
        let slot = self
            .buckets
            .get_mut(key)
            .ok_or(MarketHistoryError::UnknownBucket(*key))?;
        let previous = *slot;
        let mut next = previous;
        mutator(&mut next)?;
        *slot = next;
        Ok(previous)
    }

    /// Delete a record, returning it
    pub fn remove(&mut self, key: &BucketKey) -> Result<BucketRecord> {
        self.buckets
            .remove(key)
            .ok_or(MarketHistoryError::UnknownBucket(*key))
    }

    /// Canonical encoding of the whole store in key order
    pub fn snapshot_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&self.buckets)?)
    }

    /// CRC32 of [`Self::snapshot_bytes`], comparable across nodes
    pub fn state_checksum(&self) -> Result<u32> {
        Ok(crc32fast::hash(&self.snapshot_bytes()?))
    }

    /// Start a journaled batch of mutations
    pub fn undo_session(&mut self) -> UndoSession<'_> {
        UndoSession {
            index: self,
            journal: Vec::new(),
        }
    }
}

#[derive(Debug)]
enum UndoEntry {
    Created(BucketKey),
    Modified(BucketKey, BucketRecord),
    Removed(BucketKey, BucketRecord),
}

/// Journaled view of a [`BucketIndex`].
///
/// Reads go straight to the index. Dropping the session without committing
/// reverts every mutation made through it, newest first.
#[derive(Debug)]
pub struct UndoSession<'a> {
    index: &'a mut BucketIndex,
    journal: Vec<UndoEntry>,
}

impl UndoSession<'_> {
    /// Journaled [`BucketIndex::insert`]
    pub fn insert(&mut self, key: BucketKey, record: BucketRecord) -> Result<()> {
        self.index.insert(key, record)?;
        self.journal.push(UndoEntry::Created(key));
        Ok(())
    }

    /// Journaled [`BucketIndex::modify`]
    pub fn modify<F>(&mut self, key: &BucketKey, mutator: F) -> Result<()>
    where
        F: FnOnce(&mut BucketRecord) -> Result<()>,
    {
        let previous = self.index.modify(key, mutator)?;
        self.journal.push(UndoEntry::Modified(*key, previous));
        Ok(())
    }

    /// Journaled [`BucketIndex::remove`]
    pub fn remove(&mut self, key: &BucketKey) -> Result<BucketRecord> {
        let removed = self.index.remove(key)?;
        self.journal.push(UndoEntry::Removed(*key, removed));
        Ok(removed)
    }

    /// Keep every mutation made in this session
    pub fn commit(mut self) {
        debug!("Committing {} bucket mutations", self.journal.len());
        self.journal.clear();
    }

    fn undo(&mut self) {
        if self.journal.is_empty() {
            return;
        }
        warn!("Reverting {} bucket mutations", self.journal.len());
        while let Some(entry) = self.journal.pop() {
            match entry {
                UndoEntry::Created(key) => {
                    self.index.buckets.remove(&key);
                }
                UndoEntry::Modified(key, previous) | UndoEntry::Removed(key, previous) => {
                    self.index.buckets.insert(key, previous);
                }
            }
        }
    }
}

impl Deref for UndoSession<'_> {
    type Target = BucketIndex;

    fn deref(&self) -> &BucketIndex {
        self.index
    }
}

impl Drop for UndoSession<'_> {
    fn drop(&mut self) {
        self.undo();
    }
}

//! Streaming readers over committed state plus a Diff snapshot
//!
//! [`DiffMergeReader`] yields, in order:
//! 1. committed features from the store's reader, skipping every id the
//!    transaction has modified or removed
//! 2. staged replacements that match the filter
//! 3. staged additions that match the filter
//!
//! The Diff is consulted once, when the reader is created; later staging in
//! the same transaction is not reflected in a reader already in flight.
//!
//! [`finish`] applies the query's sort, row cap and attribute subset on top
//! of any reader. Only sorting materializes the stream.

use rustc_hash::FxHashSet;
use strata_core::{compare_features, Feature, FeatureId, Query, StrataResult};
use strata_storage::FeatureReader;

/// Committed stream corrected by a transaction's staged writes
pub struct DiffMergeReader {
    committed: FeatureReader,
    skip: FxHashSet<FeatureId>,
    pending: std::vec::IntoIter<Feature>,
}

impl DiffMergeReader {
    /// Merge `committed` with staged features
    ///
    /// `skip` holds every committed id the transaction touched; `pending`
    /// holds the staged replacements and additions already filtered against
    /// the query.
    pub fn new(committed: FeatureReader, skip: FxHashSet<FeatureId>, pending: Vec<Feature>) -> Self {
        DiffMergeReader {
            committed,
            skip,
            pending: pending.into_iter(),
        }
    }
}

impl Iterator for DiffMergeReader {
    type Item = StrataResult<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        for item in self.committed.by_ref() {
            match item {
                Ok(feature) if self.skip.contains(feature.id()) => continue,
                other => return Some(other),
            }
        }
        self.pending.next().map(Ok)
    }
}

/// Apply sort, row cap and projection from `query`
pub fn finish(reader: FeatureReader, query: &Query) -> FeatureReader {
    let mut reader = reader;

    if query.requires_sorting() {
        let sort_by = query.sort_by.clone();
        reader = match reader.collect::<StrataResult<Vec<Feature>>>() {
            Ok(mut rows) => {
                rows.sort_by(|a, b| compare_features(a, b, &sort_by));
                Box::new(rows.into_iter().map(Ok))
            }
            Err(e) => Box::new(std::iter::once(Err(e))),
        };
    }

    if let Some(max) = query.max_features {
        reader = Box::new(reader.take(max));
    }

    if let Some(properties) = query.properties.clone() {
        reader = Box::new(reader.map(move |item| item.map(|f| f.project(&properties))));
    }

    reader
}

//! Lazy query results
//!
//! A [`FeatureCollection`] captures the query and the transaction it was
//! created under. Nothing is read until [`iter`](FeatureCollection::iter),
//! [`size`](FeatureCollection::size) or [`bounds`](FeatureCollection::bounds)
//! is called, and each call reads afresh.

use std::sync::Arc;
use strata_concurrency::Transaction;
use strata_core::{Feature, Query, ReferencedEnvelope, Schema, StrataResult};
use strata_engine::Reconciler;
use strata_storage::FeatureReader;

enum Contents {
    Empty,
    Query {
        reconciler: Reconciler,
        txn: Transaction,
        query: Query,
    },
}

/// Features selected by a query
pub struct FeatureCollection {
    schema: Arc<Schema>,
    contents: Contents,
}

impl FeatureCollection {
    pub(crate) fn new(
        schema: Arc<Schema>,
        reconciler: Reconciler,
        txn: Transaction,
        query: Query,
    ) -> Self {
        FeatureCollection {
            schema,
            contents: Contents::Query {
                reconciler,
                txn,
                query,
            },
        }
    }

    /// A collection with no features
    pub fn empty(schema: Arc<Schema>) -> Self {
        FeatureCollection {
            schema,
            contents: Contents::Empty,
        }
    }

    /// Schema of the features yielded (projected if the query selected
    /// attributes)
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The query, unless the collection is empty by construction
    pub fn query(&self) -> Option<&Query> {
        match &self.contents {
            Contents::Empty => None,
            Contents::Query { query, .. } => Some(query),
        }
    }

    /// Start reading
    pub fn iter(&self) -> StrataResult<FeatureReader> {
        match &self.contents {
            Contents::Empty => Ok(Box::new(std::iter::empty())),
            Contents::Query {
                reconciler,
                txn,
                query,
            } => reconciler.read(txn, query),
        }
    }

    /// Read everything into memory
    pub fn to_vec(&self) -> StrataResult<Vec<Feature>> {
        self.iter()?.collect()
    }

    /// Number of features, or `None` if it cannot be computed cheaply
    pub fn size(&self) -> StrataResult<Option<u64>> {
        match &self.contents {
            Contents::Empty => Ok(Some(0)),
            Contents::Query {
                reconciler,
                txn,
                query,
            } => {
                let count = reconciler.count(txn, query)?;
                Ok(match query.max_features {
                    Some(max) => count.map(|n| n.min(max as u64)),
                    None => count,
                })
            }
        }
    }

    /// Committed bounds of the selected features
    pub fn bounds(&self) -> StrataResult<Option<ReferencedEnvelope>> {
        match &self.contents {
            Contents::Empty => Ok(Some(ReferencedEnvelope::empty(self.schema.crs().cloned()))),
            Contents::Query {
                reconciler, query, ..
            } => reconciler.bounds(query),
        }
    }

    /// Check if this collection is empty by construction
    pub fn is_empty_by_construction(&self) -> bool {
        matches!(self.contents, Contents::Empty)
    }
}

impl std::fmt::Debug for FeatureCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureCollection")
            .field("type_name", &self.schema.type_name())
            .field("query", &self.query())
            .finish()
    }
}

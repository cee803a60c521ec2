//! Query descriptions
//!
//! A [`Query`] names the feature type to read (optional; sources default it
//! to their own), the [`Filter`] to apply, an optional row cap, an optional
//! attribute subset, sort keys and a free-form handle used only in
//! diagnostics.

use crate::feature::Feature;
use crate::filter::Filter;
use std::cmp::Ordering;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    /// Smallest first
    Ascending,
    /// Largest first
    Descending,
}

/// One sort key
///
/// `property == None` means natural (store) order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortBy {
    /// Attribute to sort on, or `None` for natural order
    pub property: Option<String>,
    /// Direction
    pub order: SortOrder,
}

impl SortBy {
    /// Natural store order
    pub fn natural() -> Self {
        SortBy {
            property: None,
            order: SortOrder::Ascending,
        }
    }

    /// Ascending on `property`
    pub fn asc(property: impl Into<String>) -> Self {
        SortBy {
            property: Some(property.into()),
            order: SortOrder::Ascending,
        }
    }

    /// Descending on `property`
    pub fn desc(property: impl Into<String>) -> Self {
        SortBy {
            property: Some(property.into()),
            order: SortOrder::Descending,
        }
    }

    /// Check if this key is natural order
    pub fn is_natural(&self) -> bool {
        self.property.is_none()
    }
}

/// A read request against a feature source
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Feature type to read; `None` means "the source's own type"
    pub type_name: Option<String>,
    /// Row filter
    pub filter: Filter,
    /// Cap on returned features
    pub max_features: Option<usize>,
    /// Attribute subset; `None` means all attributes
    pub properties: Option<Vec<String>>,
    /// Sort keys, most significant first
    pub sort_by: Vec<SortBy>,
    /// Free-form label for diagnostics
    pub handle: Option<String>,
}

impl Query {
    /// Everything, of whatever type the source serves
    pub fn all() -> Self {
        Query::default()
    }

    /// Everything of `type_name`
    pub fn named(type_name: impl Into<String>) -> Self {
        Query {
            type_name: Some(type_name.into()),
            ..Query::default()
        }
    }

    /// Features matching `filter`, of whatever type the source serves
    pub fn filtered(filter: Filter) -> Self {
        Query {
            filter,
            ..Query::default()
        }
    }

    /// Set the type name
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Set the filter
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the row cap
    pub fn with_max_features(mut self, max: usize) -> Self {
        self.max_features = Some(max);
        self
    }

    /// Set the attribute subset
    pub fn with_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = Some(properties.into_iter().map(Into::into).collect());
        self
    }

    /// Set the sort keys
    pub fn with_sort_by(mut self, sort_by: Vec<SortBy>) -> Self {
        self.sort_by = sort_by;
        self
    }

    /// Set the diagnostics handle
    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        self.handle = Some(handle.into());
        self
    }

    /// Check whether the sort keys ask for anything beyond natural order
    pub fn requires_sorting(&self) -> bool {
        self.sort_by.iter().any(|s| !s.is_natural())
    }

    /// This query re-targeted at `type_name`
    ///
    /// Returns a clone untouched if it already targets `type_name`; otherwise
    /// a copy carrying the same filter, cap, attributes and handle (sort keys
    /// are dropped, as they only apply to the original target).
    pub fn retarget(&self, type_name: &str) -> Query {
        if self.type_name.as_deref() == Some(type_name) {
            return self.clone();
        }
        Query {
            type_name: Some(type_name.to_string()),
            filter: self.filter.clone(),
            max_features: self.max_features,
            properties: self.properties.clone(),
            sort_by: Vec::new(),
            handle: self.handle.clone(),
        }
    }
}

/// Compare two features by a list of sort keys
///
/// Natural-order keys and incomparable values compare as equal, so a stable
/// sort keeps their relative order.
pub fn compare_features(a: &Feature, b: &Feature, sort_by: &[SortBy]) -> Ordering {
    for key in sort_by {
        let Some(property) = key.property.as_deref() else {
            continue;
        };
        let ordering = match (a.get(property), b.get(property)) {
            (Some(x), Some(y)) => x.compare(y).unwrap_or(Ordering::Equal),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ordering = match key.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

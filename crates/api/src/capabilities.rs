//! Query capability descriptor
//!
//! Evaluated once when a source is opened; immutable afterwards.
//!
//! | Capability | Effect |
//! |------------|--------|
//! | natural order | always supported |
//! | `SortBy { attribute }` | `features()` may sort by that attribute |
//! | `UseProvidedFid` | inserts keep caller-provided ids |

use crate::options::SourceCapability;
use std::collections::BTreeSet;
use strata_core::{Schema, SortBy, StrataError, StrataResult};

/// What a feature source can do with a query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryCapabilities {
    sortable: BTreeSet<String>,
    use_provided_fid: bool,
}

impl QueryCapabilities {
    /// Natural order only, store-assigned ids
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve declared capabilities against `schema`
    ///
    /// # Errors
    /// - `Config` if a sortable attribute is not in the schema
    pub fn from_declared(declared: &[SourceCapability], schema: &Schema) -> StrataResult<Self> {
        let mut caps = Self::new();
        for capability in declared {
            match capability {
                SourceCapability::UseProvidedFid => caps.use_provided_fid = true,
                SourceCapability::SortBy { attribute } => {
                    if schema.index_of(attribute).is_none() {
                        return Err(StrataError::Config(format!(
                            "cannot sort {} by unknown attribute {}",
                            schema.type_name(),
                            attribute
                        )));
                    }
                    caps.sortable.insert(attribute.clone());
                }
            }
        }
        Ok(caps)
    }

    /// Check whether every sort key can be honored
    pub fn supports_sorting(&self, sort_by: &[SortBy]) -> bool {
        sort_by.iter().all(|key| match key.property.as_deref() {
            None => true,
            Some(property) => self.sortable.contains(property),
        })
    }

    /// Check whether inserts keep caller-provided ids
    pub fn is_use_provided_fid_supported(&self) -> bool {
        self.use_provided_fid
    }

    /// Attributes results can be sorted by
    pub fn sortable(&self) -> impl Iterator<Item = &str> {
        self.sortable.iter().map(String::as_str)
    }

    /// The capabilities as declared, in a stable order
    pub fn declared(&self) -> Vec<SourceCapability> {
        let mut out = Vec::with_capacity(self.sortable.len() + 1);
        if self.use_provided_fid {
            out.push(SourceCapability::UseProvidedFid);
        }
        out.extend(self.sortable.iter().map(|attribute| SourceCapability::SortBy {
            attribute: attribute.clone(),
        }));
        out
    }
}

//! Feature source configuration
//!
//! Options are plain data: build them in code or load them from TOML.
//!
//! ```toml
//! reconciliation = "faithful"   # or "corrected"
//! capabilities = [
//!   { kind = "use_provided_fid" },
//!   { kind = "sort_by", attribute = "name" },
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use strata_core::{StrataError, StrataResult};
use strata_engine::ReconciliationMode;

/// A query capability a source can advertise
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceCapability {
    /// Inserts keep caller-provided feature ids
    UseProvidedFid,
    /// Results can be sorted by `attribute`
    SortBy {
        /// Attribute name
        attribute: String,
    },
}

/// Options for opening a feature source.
///
/// Use the builder pattern to configure options:
///
/// ```ignore
/// use strata_api::{ReconciliationMode, SourceOptions};
///
/// let opts = SourceOptions::new()
///     .reconciliation(ReconciliationMode::Corrected)
///     .sortable("name");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceOptions {
    /// How counts fold in staged modifications
    pub reconciliation: ReconciliationMode,
    /// Capabilities beyond natural-order reads
    pub capabilities: Vec<SourceCapability>,
}

impl SourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reconciliation(mut self, mode: ReconciliationMode) -> Self {
        self.reconciliation = mode;
        self
    }

    pub fn capability(mut self, capability: SourceCapability) -> Self {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    pub fn use_provided_fid(self) -> Self {
        self.capability(SourceCapability::UseProvidedFid)
    }

    pub fn sortable(self, attribute: impl Into<String>) -> Self {
        self.capability(SourceCapability::SortBy {
            attribute: attribute.into(),
        })
    }

    /// Parse options from a TOML document
    ///
    /// # Errors
    /// - `Config` if the document is malformed or has unknown keys
    pub fn from_toml_str(s: &str) -> StrataResult<Self> {
        toml::from_str(s).map_err(|e| StrataError::Config(e.to_string()))
    }

    /// Load options from a TOML file
    ///
    /// # Errors
    /// - `Io` if the file cannot be read
    /// - `Config` if its contents do not parse
    pub fn load(path: impl AsRef<Path>) -> StrataResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let options = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), ?options, "source options loaded");
        Ok(options)
    }
}

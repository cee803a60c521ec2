//! Descriptive metadata for a feature source

use crate::source::{FeatureSource, SourceInner};
use std::fmt;
use std::sync::Weak;
use strata_core::{Crs, Query, ReferencedEnvelope, Schema};

/// Name, keywords, CRS and bounds of a feature source
///
/// Built once per source. It refers back to its source weakly, so holding
/// the info does not keep the source alive; once the source is gone,
/// [`bounds`](Self::bounds) and [`source`](Self::source) return `None`.
pub struct ResourceInfo {
    source: Weak<SourceInner>,
    name: String,
    title: String,
    keywords: Vec<String>,
    crs: Option<Crs>,
    schema_uri: Option<String>,
}

impl ResourceInfo {
    pub(crate) fn new(source: Weak<SourceInner>, schema: &Schema) -> Self {
        let name = schema.type_name().to_string();
        ResourceInfo {
            source,
            keywords: vec!["features".to_string(), name.clone()],
            title: schema.name().local.clone(),
            name,
            crs: schema.crs().cloned(),
            schema_uri: schema.name().namespace.clone(),
        }
    }

    /// Type name of the source
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable title (the local part of the type name)
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    /// Namespace URI of the schema, if it has one
    pub fn schema_uri(&self) -> Option<&str> {
        self.schema_uri.as_deref()
    }

    /// Committed bounds of the whole source, best effort
    ///
    /// Errors and unknown bounds both collapse to `None`.
    pub fn bounds(&self) -> Option<ReferencedEnvelope> {
        let source = self.source()?;
        match source.bounds_of(&Query::all()) {
            Ok(bounds) => bounds,
            Err(e) => {
                tracing::debug!(source = %self.name, error = %e, "bounds unavailable for resource info");
                None
            }
        }
    }

    /// The source this info describes, bound to auto-commit
    pub fn source(&self) -> Option<FeatureSource> {
        self.source.upgrade().map(FeatureSource::from_inner)
    }
}

impl fmt::Debug for ResourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceInfo")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("keywords", &self.keywords)
            .field("crs", &self.crs)
            .field("schema_uri", &self.schema_uri)
            .finish()
    }
}

//! Feature records
//!
//! A [`Feature`] is logically immutable once handed to a reader: "updating"
//! one produces a new value ([`Feature::with_value`]). Values live behind an
//! `Arc`, so clones are cheap and snapshots of staged features never copy
//! attribute data.

use crate::error::{StrataError, StrataResult};
use crate::geometry::{Envelope, Geometry};
use crate::schema::{AttributeType, Schema};
use crate::types::FeatureId;
use crate::value::Value;
use std::sync::Arc;

/// One record of a [`Schema`]
#[derive(Debug, Clone)]
pub struct Feature {
    id: FeatureId,
    schema: Arc<Schema>,
    values: Arc<[Value]>,
}

impl Feature {
    /// Start building a feature of `schema`
    ///
    /// The feature gets a provisional id unless [`FeatureBuilder::id`] is
    /// called.
    pub fn builder(schema: Arc<Schema>) -> FeatureBuilder {
        let values = vec![Value::Null; schema.attributes().len()];
        FeatureBuilder {
            id: None,
            schema,
            values,
            error: None,
        }
    }

    /// Feature identifier
    pub fn id(&self) -> &FeatureId {
        &self.id
    }

    /// Schema this feature conforms to
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Type name of the feature's schema
    pub fn type_name(&self) -> &str {
        self.schema.type_name()
    }

    /// Value of an attribute by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema.index_of(name).map(|i| &self.values[i])
    }

    /// All values in schema order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The default geometry, if set
    pub fn geometry(&self) -> Option<&Geometry> {
        self.schema
            .geometry_index()
            .and_then(|i| self.values[i].as_geometry())
    }

    /// Envelope of the default geometry (empty if none)
    pub fn bounds(&self) -> Envelope {
        self.geometry()
            .map(Geometry::envelope)
            .unwrap_or_else(Envelope::empty)
    }

    /// Same values under a different id
    pub fn with_id(&self, id: FeatureId) -> Feature {
        Feature {
            id,
            schema: Arc::clone(&self.schema),
            values: Arc::clone(&self.values),
        }
    }

    /// New feature with one attribute replaced
    ///
    /// # Errors
    /// - `InvalidSchema` if the attribute is unknown or the value does not
    ///   fit its binding
    pub fn with_value(&self, name: &str, value: impl Into<Value>) -> StrataResult<Feature> {
        let value = value.into();
        let index = self.schema.index_of(name).ok_or_else(|| {
            StrataError::InvalidSchema(format!("{} has no attribute {}", self.type_name(), name))
        })?;
        check_binding(&self.schema, index, &value)?;
        let mut values = self.values.to_vec();
        values[index] = value;
        Ok(Feature {
            id: self.id.clone(),
            schema: Arc::clone(&self.schema),
            values: values.into(),
        })
    }

    /// Project onto a subset of attributes
    pub fn project(&self, names: &[String]) -> Feature {
        let schema = Arc::new(self.schema.subset(names));
        let values: Vec<Value> = schema
            .attributes()
            .iter()
            .map(|a| self.get(&a.name).cloned().unwrap_or(Value::Null))
            .collect();
        Feature {
            id: self.id.clone(),
            schema,
            values: values.into(),
        }
    }
}

impl PartialEq for Feature {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.type_name() == other.type_name()
            && self.values == other.values
    }
}

fn check_binding(schema: &Schema, index: usize, value: &Value) -> StrataResult<()> {
    let attr = &schema.attributes()[index];
    let fits = match (attr.binding, value) {
        (_, Value::Null) => attr.nillable,
        (AttributeType::Bool, Value::Bool(_))
        | (AttributeType::Int, Value::Int(_))
        | (AttributeType::Float, Value::Float(_))
        | (AttributeType::Float, Value::Int(_))
        | (AttributeType::String, Value::String(_))
        | (AttributeType::Bytes, Value::Bytes(_))
        | (AttributeType::Geometry, Value::Geometry(_)) => true,
        _ => false,
    };
    if fits {
        Ok(())
    } else {
        Err(StrataError::InvalidSchema(format!(
            "{}.{} expects {:?}, got {}",
            schema.type_name(),
            attr.name,
            attr.binding,
            value.type_name()
        )))
    }
}

/// Builder for [`Feature`]
#[derive(Debug)]
pub struct FeatureBuilder {
    id: Option<FeatureId>,
    schema: Arc<Schema>,
    values: Vec<Value>,
    error: Option<StrataError>,
}

impl FeatureBuilder {
    /// Use an explicit id instead of a provisional one
    pub fn id(mut self, id: impl Into<FeatureId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set an attribute value
    ///
    /// Errors (unknown attribute, wrong binding) surface from [`build`](Self::build).
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Self {
        if self.error.is_some() {
            return self;
        }
        let value = value.into();
        match self.schema.index_of(name) {
            Some(i) => match check_binding(&self.schema, i, &value) {
                Ok(()) => self.values[i] = value,
                Err(e) => self.error = Some(e),
            },
            None => {
                self.error = Some(StrataError::InvalidSchema(format!(
                    "{} has no attribute {}",
                    self.schema.type_name(),
                    name
                )))
            }
        }
        self
    }

    /// Finish the feature
    ///
    /// # Errors
    /// - `InvalidSchema` for the first bad `set` call, or if a non-nillable
    ///   attribute was left null
    pub fn build(self) -> StrataResult<Feature> {
        if let Some(e) = self.error {
            return Err(e);
        }
        for (i, v) in self.values.iter().enumerate() {
            check_binding(&self.schema, i, v)?;
        }
        Ok(Feature {
            id: self.id.unwrap_or_else(FeatureId::provisional),
            schema: self.schema,
            values: self.values.into(),
        })
    }
}

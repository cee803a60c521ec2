//! Feature type descriptors
//!
//! A [`Schema`] is created once (usually when a store registers a type or a
//! source is constructed) and never mutated afterwards. It is shared as
//! `Arc<Schema>` by every feature of that type.

use crate::error::{StrataError, StrataResult};
use crate::geometry::Crs;
use crate::types::TypeName;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Declared binding of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeType {
    /// Boolean
    Bool,
    /// 64-bit signed integer
    Int,
    /// 64-bit float
    Float,
    /// UTF-8 string
    String,
    /// Binary blob
    Bytes,
    /// Geometry
    Geometry,
}

/// One attribute of a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    /// Attribute name, unique within the schema
    pub name: String,
    /// Declared value type
    pub binding: AttributeType,
    /// Whether `Value::Null` is acceptable
    pub nillable: bool,
}

impl AttributeDescriptor {
    /// Create a nillable attribute
    pub fn new(name: impl Into<String>, binding: AttributeType) -> Self {
        AttributeDescriptor {
            name: name.into(),
            binding,
            nillable: true,
        }
    }
}

/// Immutable descriptor of a feature type
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: TypeName,
    attributes: Vec<AttributeDescriptor>,
    index: FxHashMap<String, usize>,
    geometry: Option<usize>,
    crs: Option<Crs>,
}

impl Schema {
    /// Start building a schema for `type_name`
    pub fn builder(type_name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: TypeName::new(None, type_name),
            attributes: Vec::new(),
            geometry: None,
            crs: None,
        }
    }

    /// Qualified type name
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// Plain type name (local part), used to target queries
    pub fn type_name(&self) -> &str {
        &self.name.local
    }

    /// Attributes in declaration order
    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    /// Position of an attribute by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Default geometry attribute, if the type has one
    pub fn geometry_attribute(&self) -> Option<&AttributeDescriptor> {
        self.geometry.map(|i| &self.attributes[i])
    }

    /// Position of the default geometry attribute
    pub fn geometry_index(&self) -> Option<usize> {
        self.geometry
    }

    /// Coordinate reference system of the geometry attribute
    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    /// Derive a schema holding only `names`, in this schema's order
    ///
    /// Unknown names are ignored. The geometry attribute survives only if it
    /// is among `names`.
    pub fn subset(&self, names: &[String]) -> Schema {
        let attributes: Vec<AttributeDescriptor> = self
            .attributes
            .iter()
            .filter(|a| names.iter().any(|n| n == &a.name))
            .cloned()
            .collect();
        let index = build_index(&attributes);
        let geometry = self
            .geometry_attribute()
            .and_then(|g| index.get(&g.name).copied());
        Schema {
            name: self.name.clone(),
            attributes,
            index,
            geometry,
            crs: self.crs.clone(),
        }
    }
}

fn build_index(attributes: &[AttributeDescriptor]) -> FxHashMap<String, usize> {
    attributes
        .iter()
        .enumerate()
        .map(|(i, a)| (a.name.clone(), i))
        .collect()
}

/// Builder for [`Schema`]
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: TypeName,
    attributes: Vec<AttributeDescriptor>,
    geometry: Option<String>,
    crs: Option<Crs>,
}

impl SchemaBuilder {
    /// Set the namespace URI
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.name.namespace = Some(namespace.into());
        self
    }

    /// Append a nillable attribute
    pub fn attribute(mut self, name: impl Into<String>, binding: AttributeType) -> Self {
        self.attributes.push(AttributeDescriptor::new(name, binding));
        self
    }

    /// Append an attribute descriptor as-is
    pub fn descriptor(mut self, descriptor: AttributeDescriptor) -> Self {
        self.attributes.push(descriptor);
        self
    }

    /// Append a geometry attribute and make it the default geometry
    pub fn geometry(mut self, name: impl Into<String>, crs: Option<Crs>) -> Self {
        let name = name.into();
        self.attributes
            .push(AttributeDescriptor::new(name.clone(), AttributeType::Geometry));
        self.geometry = Some(name);
        self.crs = crs;
        self
    }

    /// Validate and build the schema
    ///
    /// # Errors
    /// - `InvalidSchema` if the type name is empty or attribute names repeat
    pub fn build(self) -> StrataResult<Schema> {
        if self.name.local.is_empty() {
            return Err(StrataError::InvalidSchema("empty type name".into()));
        }
        let index = build_index(&self.attributes);
        if index.len() != self.attributes.len() {
            return Err(StrataError::InvalidSchema(format!(
                "duplicate attribute names in {}",
                self.name
            )));
        }
        let geometry = self.geometry.as_ref().and_then(|g| index.get(g).copied());
        Ok(Schema {
            name: self.name,
            attributes: self.attributes,
            index,
            geometry,
            crs: self.crs,
        })
    }
}

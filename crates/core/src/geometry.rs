//! Geometry values and bounding envelopes
//!
//! Only what the isolation layer needs to report extents: a handful of planar
//! geometry shapes, an axis-aligned [`Envelope`], and a [`ReferencedEnvelope`]
//! that tags an envelope with the coordinate reference system it is expressed
//! in. Reprojection is out of scope; a [`Crs`] is an opaque tag.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A planar coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    /// Easting / longitude
    pub x: f64,
    /// Northing / latitude
    pub y: f64,
}

impl Coord {
    /// Create a coordinate
    pub fn new(x: f64, y: f64) -> Self {
        Coord { x, y }
    }
}

/// Planar geometry value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// A single position
    Point(Coord),
    /// An open sequence of positions
    LineString(Vec<Coord>),
    /// A closed ring (the first and last positions need not repeat)
    Polygon(Vec<Coord>),
}

impl Geometry {
    /// Convenience constructor for a point
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point(Coord::new(x, y))
    }

    /// Coordinates of the geometry, in order
    pub fn coords(&self) -> &[Coord] {
        match self {
            Geometry::Point(c) => std::slice::from_ref(c),
            Geometry::LineString(cs) | Geometry::Polygon(cs) => cs,
        }
    }

    /// Smallest envelope containing every coordinate
    ///
    /// Empty line strings and polygons yield an empty envelope.
    pub fn envelope(&self) -> Envelope {
        let mut env = Envelope::empty();
        for c in self.coords() {
            env.expand_to_include(c.x, c.y);
        }
        env
    }
}

/// Axis-aligned bounding box
///
/// An envelope with `min > max` on either axis is *empty*: it contains
/// nothing and expanding it by a point yields that point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Minimum x
    pub min_x: f64,
    /// Minimum y
    pub min_y: f64,
    /// Maximum x
    pub max_x: f64,
    /// Maximum y
    pub max_y: f64,
}

impl Envelope {
    /// Create an envelope from two corners (normalized so min <= max)
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Envelope {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    /// The empty envelope
    pub fn empty() -> Self {
        Envelope {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Check if this envelope contains nothing
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Grow to include a point
    pub fn expand_to_include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Grow to include another envelope
    pub fn expand_to_include_envelope(&mut self, other: &Envelope) {
        if other.is_empty() {
            return;
        }
        self.expand_to_include(other.min_x, other.min_y);
        self.expand_to_include(other.max_x, other.max_y);
    }

    /// Check whether two envelopes share at least one point
    pub fn intersects(&self, other: &Envelope) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Width (0 for empty envelopes)
    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_x - self.min_x
        }
    }

    /// Height (0 for empty envelopes)
    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_y - self.min_y
        }
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::empty()
    }
}

/// Coordinate reference system tag (e.g. `"EPSG:4326"`)
///
/// Opaque: two tags are the same system iff their codes are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs(Arc<str>);

impl Crs {
    /// Create a CRS tag from its code
    pub fn new(code: impl Into<Arc<str>>) -> Self {
        Crs(code.into())
    }

    /// The code this tag was created with
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An envelope tagged with the reference system it is expressed in
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencedEnvelope {
    envelope: Envelope,
    crs: Option<Crs>,
}

impl ReferencedEnvelope {
    /// Tag an envelope with a reference system
    pub fn new(envelope: Envelope, crs: Option<Crs>) -> Self {
        ReferencedEnvelope { envelope, crs }
    }

    /// Empty envelope in the given reference system
    pub fn empty(crs: Option<Crs>) -> Self {
        ReferencedEnvelope {
            envelope: Envelope::empty(),
            crs,
        }
    }

    /// The untagged envelope
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// The reference system, if known
    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    /// Check if the envelope contains nothing
    pub fn is_empty(&self) -> bool {
        self.envelope.is_empty()
    }
}

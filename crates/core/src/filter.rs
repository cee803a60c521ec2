//! Filters over features
//!
//! A [`Filter`] is either one of the two reserved sentinels, [`Filter::Include`]
//! (matches everything) and [`Filter::Exclude`] (matches nothing), or an opaque
//! [`Predicate`]. Sentinels are recognized by their variant, never by
//! evaluating them, so callers can short-circuit without touching data.
//!
//! The predicate language itself is not part of this crate; a few simple
//! predicates are provided for embedding and tests.

use crate::feature::Feature;
use crate::geometry::Envelope;
use crate::types::FeatureId;
use crate::value::Value;
use rustc_hash::FxHashSet;
use std::fmt;
use std::sync::Arc;

/// A boolean condition over a feature
pub trait Predicate: Send + Sync + fmt::Debug {
    /// Check whether `feature` satisfies the condition
    fn evaluate(&self, feature: &Feature) -> bool;
}

/// Filter with reserved sentinels
#[derive(Debug, Clone)]
pub enum Filter {
    /// Matches every feature
    Include,
    /// Matches no feature
    Exclude,
    /// Opaque predicate
    Predicate(Arc<dyn Predicate>),
}

impl Filter {
    /// Wrap a predicate
    pub fn predicate(p: impl Predicate + 'static) -> Self {
        Filter::Predicate(Arc::new(p))
    }

    /// Predicate from a closure
    pub fn from_fn<F>(name: &'static str, f: F) -> Self
    where
        F: Fn(&Feature) -> bool + Send + Sync + 'static,
    {
        Filter::predicate(FnPredicate { name, f })
    }

    /// `attribute == value`
    pub fn property_eq(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::predicate(PropertyEquals {
            attribute: attribute.into(),
            value: value.into(),
        })
    }

    /// Feature id is one of `ids`
    pub fn id_in<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = FeatureId>,
    {
        let ids: FxHashSet<FeatureId> = ids.into_iter().collect();
        if ids.is_empty() {
            return Filter::Exclude;
        }
        Filter::predicate(IdIn { ids })
    }

    /// Default geometry intersects `envelope`
    pub fn bbox(envelope: Envelope) -> Self {
        if envelope.is_empty() {
            return Filter::Exclude;
        }
        Filter::predicate(BBox { envelope })
    }

    /// Check if this is the `Include` sentinel
    pub fn is_include(&self) -> bool {
        matches!(self, Filter::Include)
    }

    /// Check if this is the `Exclude` sentinel
    pub fn is_exclude(&self) -> bool {
        matches!(self, Filter::Exclude)
    }

    /// Evaluate against a feature
    ///
    /// Sentinels answer without looking at the feature.
    pub fn evaluate(&self, feature: &Feature) -> bool {
        match self {
            Filter::Include => true,
            Filter::Exclude => false,
            Filter::Predicate(p) => p.evaluate(feature),
        }
    }

    /// Conjunction, folding sentinels
    pub fn and(self, other: Filter) -> Filter {
        match (self, other) {
            (Filter::Exclude, _) | (_, Filter::Exclude) => Filter::Exclude,
            (Filter::Include, f) | (f, Filter::Include) => f,
            (a, b) => Filter::predicate(And(a, b)),
        }
    }

    /// Disjunction, folding sentinels
    pub fn or(self, other: Filter) -> Filter {
        match (self, other) {
            (Filter::Include, _) | (_, Filter::Include) => Filter::Include,
            (Filter::Exclude, f) | (f, Filter::Exclude) => f,
            (a, b) => Filter::predicate(Or(a, b)),
        }
    }

    /// Negation, swapping sentinels
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Filter {
        match self {
            Filter::Include => Filter::Exclude,
            Filter::Exclude => Filter::Include,
            f => Filter::predicate(Not(f)),
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::Include
    }
}

struct FnPredicate<F> {
    name: &'static str,
    f: F,
}

impl<F> fmt::Debug for FnPredicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FnPredicate({})", self.name)
    }
}

impl<F> Predicate for FnPredicate<F>
where
    F: Fn(&Feature) -> bool + Send + Sync,
{
    fn evaluate(&self, feature: &Feature) -> bool {
        (self.f)(feature)
    }
}

#[derive(Debug)]
struct PropertyEquals {
    attribute: String,
    value: Value,
}

impl Predicate for PropertyEquals {
    fn evaluate(&self, feature: &Feature) -> bool {
        feature.get(&self.attribute) == Some(&self.value)
    }
}

#[derive(Debug)]
struct IdIn {
    ids: FxHashSet<FeatureId>,
}

impl Predicate for IdIn {
    fn evaluate(&self, feature: &Feature) -> bool {
        self.ids.contains(feature.id())
    }
}

#[derive(Debug)]
struct BBox {
    envelope: Envelope,
}

impl Predicate for BBox {
    fn evaluate(&self, feature: &Feature) -> bool {
        feature.bounds().intersects(&self.envelope)
    }
}

#[derive(Debug)]
struct And(Filter, Filter);

impl Predicate for And {
    fn evaluate(&self, feature: &Feature) -> bool {
        self.0.evaluate(feature) && self.1.evaluate(feature)
    }
}

#[derive(Debug)]
struct Or(Filter, Filter);

impl Predicate for Or {
    fn evaluate(&self, feature: &Feature) -> bool {
        self.0.evaluate(feature) || self.1.evaluate(feature)
    }
}

#[derive(Debug)]
struct Not(Filter);

impl Predicate for Not {
    fn evaluate(&self, feature: &Feature) -> bool {
        !self.0.evaluate(feature)
    }
}

// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Query filters and the subsumption partial order
//!
//! A [`Filter`] is an immutable, canonically ordered set of equality
//! constraints on a stream's decoded row fields. A key absent from a filter
//! means "unconstrained". Cached coverage under a more general filter can
//! answer a more specific query after local re-filtering; the
//! [`Filter::subsumes`] relation decides when that is sound.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single constraint: either one exact value or an explicit allowed-set.
///
/// Allowed-sets are kept sorted and deduplicated so that structurally equal
/// constraints serialize identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterValue {
    /// Field must equal this value exactly.
    Exact(Value),
    /// Field must equal one of these values.
    OneOf(Vec<Value>),
}

impl FilterValue {
    fn canonicalize(self) -> Self {
        match self {
            FilterValue::Exact(v) => FilterValue::Exact(v),
            FilterValue::OneOf(mut vs) => {
                vs.sort_by_key(|v| v.to_string());
                vs.dedup();
                FilterValue::OneOf(vs)
            }
        }
    }

    /// Whether coverage fetched under `self` is guaranteed to include every
    /// row matching `narrower`.
    ///
    /// Exact constraints subsume only equal constraints (and the singleton
    /// set of the same value); an allowed-set subsumes any subset of itself.
    fn subsumes(&self, narrower: &FilterValue) -> bool {
        match (self, narrower) {
            (FilterValue::Exact(g), FilterValue::Exact(f)) => g == f,
            (FilterValue::OneOf(gs), FilterValue::Exact(f)) => gs.contains(f),
            (FilterValue::OneOf(gs), FilterValue::OneOf(fs)) => {
                fs.iter().all(|f| gs.contains(f))
            }
            (FilterValue::Exact(g), FilterValue::OneOf(fs)) => {
                fs.len() == 1 && &fs[0] == g
            }
        }
    }

    /// Whether a decoded field value satisfies this constraint.
    fn matches(&self, field: &Value) -> bool {
        match self {
            FilterValue::Exact(v) => field == v,
            FilterValue::OneOf(vs) => vs.iter().any(|v| field == v),
        }
    }
}

/// An ordered mapping from constraint key to constraint value.
///
/// Filters are compared by subsumption: `g.subsumes(&f)` holds when every
/// row matching `f` is guaranteed to be present in data fetched under `g`.
/// This is a partial order: filters constraining disjoint keys are
/// incomparable.
///
/// # Examples
///
/// ```rust
/// use chainfetch::Filter;
/// use serde_json::json;
///
/// let broad = Filter::empty();
/// let narrow = Filter::empty()
///     .with_eq("from", json!("0xfa45"))
///     .with_one_of("to", vec![json!("0xaa"), json!("0xbb")]);
///
/// assert!(broad.subsumes(&narrow));
/// assert!(!narrow.subsumes(&broad));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter {
    constraints: BTreeMap<String, FilterValue>,
}

impl Filter {
    /// The unconstrained filter. Subsumes every filter.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds an exact-value constraint, replacing any existing constraint on
    /// the same key.
    pub fn with_eq(mut self, key: impl Into<String>, value: Value) -> Self {
        self.constraints
            .insert(key.into(), FilterValue::Exact(value).canonicalize());
        self
    }

    /// Adds an allowed-set constraint, replacing any existing constraint on
    /// the same key.
    pub fn with_one_of(mut self, key: impl Into<String>, values: Vec<Value>) -> Self {
        self.constraints
            .insert(key.into(), FilterValue::OneOf(values).canonicalize());
        self
    }

    /// Whether this filter has no constraints.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Number of constrained keys.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// The constraint on `key`, if any.
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.constraints.get(key)
    }

    /// The subsumption relation: `self` is at least as general as `other`.
    ///
    /// Holds iff every key constrained by `self` is constrained by `other`
    /// at least as tightly. Reflexive, antisymmetric, transitive; the empty
    /// filter subsumes everything.
    pub fn subsumes(&self, other: &Filter) -> bool {
        self.constraints.iter().all(|(key, general)| {
            other
                .constraints
                .get(key)
                .is_some_and(|narrow| general.subsumes(narrow))
        })
    }

    /// Applies all constraints to a row's decoded fields.
    ///
    /// A constrained key missing from `fields` fails the match.
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        self.constraints.iter().all(|(key, constraint)| {
            fields
                .get(key)
                .is_some_and(|field| constraint.matches(field))
        })
    }

    /// Canonical, order-independent serialization used as the store key.
    ///
    /// Equal filters always produce equal signatures: keys are sorted by the
    /// map ordering and allowed-sets are canonicalized on construction.
    pub fn signature(&self) -> String {
        serde_json::to_string(&self.constraints)
            .unwrap_or_else(|_| String::from("{}"))
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.signature())
    }
}

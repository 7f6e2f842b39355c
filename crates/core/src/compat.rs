//! # Compatibility and Specificity
//!
//! Pairwise comparisons between types, expressed purely as set operations
//! on precomputed closures:
//!
//! | check | holds when |
//! |---|---|
//! | `compatible(a, b)` | neither ancestor set meets the other's disjoint set |
//! | `more_specific(a, b)` | `b`'s ancestors ⊊ `a`'s ancestors, and nothing `a` adds is disjoint with `b` |
//! | `has_representation_among(t, opts)` | `t` is compatible with at least one of `opts` |
//!
//! `compatible` is symmetric and, for consistent types, reflexive.
//! `more_specific` is a strict order: irreflexive and antisymmetric.

use crate::hierarchy::TypeInfo;

/// Two types can describe the same value.
pub fn compatible(a: &TypeInfo, b: &TypeInfo) -> bool {
    a.ancestors.is_disjoint(&b.disjoints) && b.ancestors.is_disjoint(&a.disjoints)
}

/// `a` is a strict specialization of `b` that does not contradict it.
pub fn more_specific(a: &TypeInfo, b: &TypeInfo) -> bool {
    let strict_superset =
        b.ancestors.len() < a.ancestors.len() && b.ancestors.is_subset(&a.ancestors);
    strict_superset
        && a
            .ancestors
            .difference(&b.ancestors)
            .all(|extra| !b.disjoints.contains(extra))
}

/// Same position in the hierarchy (identical ancestor sets).
pub fn same_type(a: &TypeInfo, b: &TypeInfo) -> bool {
    a.ancestors == b.ancestors
}

/// `ty` is compatible with at least one entry of `options`.
///
/// This asks whether a value carrying the facets `options` can also be seen
/// as a `ty`. An empty option list represents nothing.
pub fn has_representation_among<'a>(
    ty: &TypeInfo,
    options: impl IntoIterator<Item = &'a TypeInfo>,
) -> bool {
    options.into_iter().any(|option| compatible(ty, option))
}

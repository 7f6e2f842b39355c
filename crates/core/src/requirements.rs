//! # Requirement Resolution
//!
//! A requirement set is an ordered list of types that a value must all be
//! able to satisfy. Resolution merges what an input port declares with what
//! flows in from downstream consumers.
//!
//! ## Algorithm
//!
//! Start from `[generic] + requirements`. For each inbound type `r`, in
//! order:
//!
//! 0. If `r` is already in the set, leave the set alone.
//! 1. Replace the first entry `e` where `r` is more specific than (or the
//!    same type as) `e` and `r` is compatible with every other entry.
//! 2. Otherwise, if `r` is compatible with one of the input's transitive
//!    requirements, append it: it is carried further upstream.
//! 3. Otherwise drop it. The input does not forward that constraint.
//!
//! The merge is greedy and order-sensitive: the same inbound types in a
//! different order can resolve differently.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::catalog::InputRecord;
use crate::compat;
use crate::hierarchy::{TypeHierarchy, TypeId};

/// Ordered collection of types that must all be satisfiable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Requirements(Vec<TypeId>);

impl Requirements {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn as_slice(&self) -> &[TypeId] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TypeId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, ty: TypeId) -> bool {
        self.0.contains(&ty)
    }

    pub fn into_vec(self) -> Vec<TypeId> {
        self.0
    }

    /// Render with type names.
    pub fn display<'a>(&'a self, hierarchy: &'a TypeHierarchy) -> impl fmt::Display + 'a {
        Named {
            reqs: self,
            hierarchy,
        }
    }

    /// Merge one inbound type into the set. See the module docs for the
    /// three outcomes.
    fn merge(&mut self, hierarchy: &TypeHierarchy, transitive: &[TypeId], inbound: TypeId) {
        let Some(r) = hierarchy.get(inbound) else {
            trace!(requirement = %inbound, "Dropping unknown requirement");
            return;
        };
        if self.contains(inbound) {
            trace!(requirement = %r.name, "Requirement already present");
            return;
        }

        let slot = self.0.iter().enumerate().position(|(index, &existing)| {
            let Some(e) = hierarchy.get(existing) else {
                return false;
            };
            (compat::more_specific(r, e) || compat::same_type(r, e))
                && self
                    .0
                    .iter()
                    .enumerate()
                    .filter(|&(other_index, _)| other_index != index)
                    .all(|(_, &other)| hierarchy.compatible(inbound, other))
        });

        if let Some(index) = slot {
            trace!(
                requirement = %r.name,
                replaces = hierarchy.name(self.0[index]),
                "Requirement narrowed"
            );
            self.0[index] = inbound;
        } else if transitive
            .iter()
            .any(|&channel| hierarchy.compatible(inbound, channel))
        {
            trace!(requirement = %r.name, "Requirement forwarded through transitive channel");
            self.0.push(inbound);
        } else {
            trace!(requirement = %r.name, "Requirement dropped");
        }
    }
}

impl From<Vec<TypeId>> for Requirements {
    fn from(types: Vec<TypeId>) -> Self {
        Self(types)
    }
}

impl FromIterator<TypeId> for Requirements {
    fn from_iter<I: IntoIterator<Item = TypeId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Requirements {
    type Item = &'a TypeId;
    type IntoIter = std::slice::Iter<'a, TypeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

struct Named<'a> {
    reqs: &'a Requirements,
    hierarchy: &'a TypeHierarchy,
}

impl fmt::Display for Named<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, ty) in self.reqs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", self.hierarchy.name(*ty))?;
        }
        write!(f, "]")
    }
}

/// Requirements an input declares on its own: generic type first, then its
/// explicit requirements in declaration order.
pub fn base_requirements(input: &InputRecord) -> Requirements {
    std::iter::once(input.generic)
        .chain(input.requirements.iter().copied())
        .collect()
}

/// Resolve the effective requirements at `input` given what flows in from
/// downstream.
pub fn resolve(
    hierarchy: &TypeHierarchy,
    input: &InputRecord,
    inbound: &Requirements,
) -> Requirements {
    let mut resolved = base_requirements(input);
    for &r in inbound {
        resolved.merge(hierarchy, &input.transitive_requirements, r);
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OperationId;
    use crate::config::ConsistencyMode;
    use crate::hierarchy::HierarchyBuilder;

    struct Fixture {
        h: TypeHierarchy,
    }

    impl Fixture {
        fn new() -> Self {
            let mut b = HierarchyBuilder::new();
            b.declare("I", &[]).unwrap();
            b.declare("I1", &["I"]).unwrap();
            b.declare("I2", &["I"]).unwrap();
            b.declare("IM", &[]).unwrap();
            b.declare("MO", &[]).unwrap();
            b.declare("MO1", &["MO"]).unwrap();
            b.declare("MO2", &["MO"]).unwrap();
            b.declare("Flag", &[]).unwrap();
            b.all_disjoint(&["I1", "I2"]).unwrap();
            b.all_disjoint(&["MO1", "MO2"]).unwrap();
            b.all_disjoint(&["MO", "IM", "I"]).unwrap();
            Self {
                h: b.build(ConsistencyMode::Strict).unwrap(),
            }
        }

        fn ty(&self, name: &str) -> TypeId {
            self.h.lookup(name).unwrap()
        }

        fn reqs(&self, names: &[&str]) -> Requirements {
            names.iter().map(|n| self.ty(n)).collect()
        }

        fn input(&self, generic: &str, reqs: &[&str], transitive: &[&str]) -> InputRecord {
            InputRecord {
                name: "in".to_string(),
                operation: OperationId(0),
                mandatory: true,
                generic: self.ty(generic),
                requirements: reqs.iter().map(|n| self.ty(n)).collect(),
                transitive_requirements: transitive.iter().map(|n| self.ty(n)).collect(),
            }
        }
    }

    #[test]
    fn test_no_inbound_returns_base() {
        let fx = Fixture::new();
        let input = fx.input("MO", &["I1"], &[]);
        let once = resolve(&fx.h, &input, &Requirements::new());
        assert_eq!(once, fx.reqs(&["MO", "I1"]));
        let twice = resolve(&fx.h, &input, &Requirements::new());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_more_specific_replaces_in_place() {
        let fx = Fixture::new();
        let input = fx.input("MO", &["Flag"], &[]);
        let resolved = resolve(&fx.h, &input, &fx.reqs(&["MO1"]));
        assert_eq!(resolved, fx.reqs(&["MO1", "Flag"]));
    }

    #[test]
    fn test_transitive_channel_appends() {
        let fx = Fixture::new();
        let input = fx.input("IM", &[], &["I"]);
        let resolved = resolve(&fx.h, &input, &fx.reqs(&["MO", "I1"]));
        assert_eq!(resolved, fx.reqs(&["IM", "I1"]));
    }

    #[test]
    fn test_unusable_requirement_dropped() {
        let fx = Fixture::new();
        let input = fx.input("IM", &[], &[]);
        let resolved = resolve(&fx.h, &input, &fx.reqs(&["MO2", "I2"]));
        assert_eq!(resolved, fx.reqs(&["IM"]));
    }

    #[test]
    fn test_equal_requirement_does_not_grow() {
        let fx = Fixture::new();
        let input = fx.input("I1", &["Flag"], &["I"]);
        let resolved = resolve(&fx.h, &input, &fx.reqs(&["I1", "Flag"]));
        assert_eq!(resolved, fx.reqs(&["I1", "Flag"]));
    }

    #[test]
    fn test_replacement_must_fit_other_entries() {
        let fx = Fixture::new();
        // MO1 is narrower than MO, but clashes with the MO2 already required
        let input = fx.input("MO", &["MO2"], &[]);
        let resolved = resolve(&fx.h, &input, &fx.reqs(&["MO1"]));
        assert_eq!(resolved, fx.reqs(&["MO", "MO2"]));
    }

    #[test]
    fn test_first_match_wins() {
        let fx = Fixture::new();
        // Both entries could take MO1; only the first is replaced
        let input = fx.input("MO", &["MO"], &[]);
        let resolved = resolve(&fx.h, &input, &fx.reqs(&["MO1"]));
        assert_eq!(resolved, fx.reqs(&["MO1", "MO"]));
    }

    #[test]
    fn test_arrival_order_matters() {
        let fx = Fixture::new();
        let input = fx.input("MO", &[], &[]);
        let a = resolve(&fx.h, &input, &fx.reqs(&["MO1", "MO2"]));
        let b = resolve(&fx.h, &input, &fx.reqs(&["MO2", "MO1"]));
        assert_eq!(a, fx.reqs(&["MO1"]));
        assert_eq!(b, fx.reqs(&["MO2"]));
    }

    #[test]
    fn test_forwarded_requirement_not_narrowed_across_clash() {
        let fx = Fixture::new();
        // I1 is narrower than the forwarded I, but IM is disjoint with the
        // whole I family, so I1 is forwarded alongside instead
        let input = fx.input("IM", &[], &["I"]);
        let resolved = resolve(&fx.h, &input, &fx.reqs(&["I", "I1"]));
        assert_eq!(resolved, fx.reqs(&["IM", "I", "I1"]));
    }

    #[test]
    fn test_forwarded_requirement_narrowed_when_compatible() {
        let fx = Fixture::new();
        let input = fx.input("Flag", &[], &["I"]);
        let resolved = resolve(&fx.h, &input, &fx.reqs(&["I", "I1"]));
        assert_eq!(resolved, fx.reqs(&["Flag", "I1"]));
    }

    #[test]
    fn test_present_requirement_not_forwarded_twice() {
        let fx = Fixture::new();
        // I1 clashes with IM, so it cannot replace its own entry; it must not
        // be appended through the transitive channel a second time either
        let input = fx.input("IM", &[], &["I"]);
        let once = resolve(&fx.h, &input, &fx.reqs(&["I1"]));
        let twice = resolve(&fx.h, &input, &fx.reqs(&["I1", "I1"]));
        assert_eq!(once, fx.reqs(&["IM", "I1"]));
        assert_eq!(twice, once);
    }

    #[test]
    fn test_present_requirement_does_not_narrow_earlier_entry() {
        let fx = Fixture::new();
        let input = fx.input("MO", &["MO1"], &[]);
        let resolved = resolve(&fx.h, &input, &fx.reqs(&["MO1"]));
        assert_eq!(resolved, fx.reqs(&["MO", "MO1"]));
    }

    #[test]
    fn test_json_is_plain_id_list() {
        let fx = Fixture::new();
        let reqs = fx.reqs(&["IM", "I1"]);
        let json = serde_json::to_string(&reqs).unwrap();
        assert_eq!(json, format!("[{},{}]", fx.ty("IM").0, fx.ty("I1").0));
        let back: Requirements = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reqs);
    }

    #[test]
    fn test_display_names() {
        let fx = Fixture::new();
        let reqs = fx.reqs(&["MO", "I1"]);
        assert_eq!(reqs.display(&fx.h).to_string(), "[MO, I1]");
    }
}

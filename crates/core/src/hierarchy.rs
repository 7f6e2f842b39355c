//! # Type Hierarchy
//!
//! A read-only view of the semantic types: for each type, its flattened
//! ancestor set and disjoint set. Nothing downstream walks the hierarchy
//! itself; every check is a membership or intersection test on these two
//! sets.
//!
//! ## Conventions
//!
//! - A type's ancestor set contains the type itself.
//! - A type's disjoint set is the union of the disjointness declarations of
//!   every ancestor (including itself). Subtypes of a disjoint type are not
//!   listed; they are caught because their own ancestor sets contain it.
//! - A type is *consistent* when its ancestor set and disjoint set do not
//!   intersect.
//!
//! ## Two ways in
//!
//! - [`TypeHierarchy::from_closures`] takes closures computed elsewhere
//!   (the usual case: a classifier runs once at catalog build time).
//! - [`HierarchyBuilder`] declares types with parents and disjoint groups and
//!   computes the closures itself.
//!
//! ```rust
//! use ontoflow_core::config::ConsistencyMode;
//! use ontoflow_core::hierarchy::HierarchyBuilder;
//!
//! let mut builder = HierarchyBuilder::new();
//! let mo = builder.declare("MO", &[]).unwrap();
//! let mo1 = builder.declare("MO1", &["MO"]).unwrap();
//! let mo2 = builder.declare("MO2", &["MO"]).unwrap();
//! builder.all_disjoint(&["MO1", "MO2"]).unwrap();
//!
//! let hierarchy = builder.build(ConsistencyMode::Strict).unwrap();
//! assert!(hierarchy.more_specific(mo1, mo));
//! assert!(!hierarchy.compatible(mo1, mo2));
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::compat;
use crate::config::ConsistencyMode;
use crate::error::{OntoError, Result};

/// Handle to a type inside one [`TypeHierarchy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub usize);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// A type with its precomputed closures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub id: TypeId,
    pub name: String,
    /// Every type this one specializes, itself included.
    pub ancestors: BTreeSet<TypeId>,
    /// Every type declared mutually exclusive with this one or an ancestor.
    pub disjoints: BTreeSet<TypeId>,
}

impl TypeInfo {
    /// True if this type is `other` or a (transitive) subtype of it.
    pub fn specializes(&self, other: TypeId) -> bool {
        self.ancestors.contains(&other)
    }

    /// Ancestor and disjoint sets do not overlap.
    pub fn is_consistent(&self) -> bool {
        self.ancestors.is_disjoint(&self.disjoints)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Closure record for one type, by name, as delivered by an external
/// classifier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeClosure {
    pub name: String,
    /// Ancestor names. The type itself may be omitted.
    #[serde(default)]
    pub ancestors: Vec<String>,
    #[serde(default)]
    pub disjoints: Vec<String>,
}

impl TypeClosure {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_ancestors(mut self, ancestors: &[&str]) -> Self {
        self.ancestors = ancestors.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_disjoints(mut self, disjoints: &[&str]) -> Self {
        self.disjoints = disjoints.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// Immutable view over all types.
#[derive(Debug, Clone, Default)]
pub struct TypeHierarchy {
    types: Vec<TypeInfo>,
    by_name: HashMap<String, TypeId>,
    inconsistent: Vec<TypeId>,
}

impl TypeHierarchy {
    /// Build a hierarchy from externally computed closures.
    ///
    /// Every name referenced in an ancestor or disjoint list must itself have
    /// a record. Consistency is checked according to `mode`.
    pub fn from_closures(closures: Vec<TypeClosure>, mode: ConsistencyMode) -> Result<Self> {
        let mut by_name = HashMap::new();
        for (index, closure) in closures.iter().enumerate() {
            if by_name.insert(closure.name.clone(), TypeId(index)).is_some() {
                return Err(OntoError::DuplicateName {
                    kind: "type",
                    name: closure.name.clone(),
                });
            }
        }

        let resolve = |names: &[String]| -> Result<BTreeSet<TypeId>> {
            names
                .iter()
                .map(|name| {
                    by_name.get(name).copied().ok_or_else(|| OntoError::UnknownName {
                        kind: "type",
                        name: name.clone(),
                    })
                })
                .collect()
        };

        let mut types = Vec::with_capacity(closures.len());
        for (index, closure) in closures.iter().enumerate() {
            let id = TypeId(index);
            let mut ancestors = resolve(&closure.ancestors)?;
            ancestors.insert(id);
            types.push(TypeInfo {
                id,
                name: closure.name.clone(),
                ancestors,
                disjoints: resolve(&closure.disjoints)?,
            });
        }

        Self::finish(types, by_name, mode)
    }

    fn finish(
        types: Vec<TypeInfo>,
        by_name: HashMap<String, TypeId>,
        mode: ConsistencyMode,
    ) -> Result<Self> {
        let inconsistent: Vec<TypeId> = types
            .iter()
            .filter(|t| !t.is_consistent())
            .map(|t| t.id)
            .collect();

        if !inconsistent.is_empty() {
            let names: Vec<String> = inconsistent
                .iter()
                .map(|id| types[id.0].name.clone())
                .collect();
            match mode {
                ConsistencyMode::Strict => return Err(OntoError::Inconsistent { types: names }),
                ConsistencyMode::Warn => {
                    warn!(types = ?names, "Inconsistent classes found in type hierarchy");
                }
            }
        }

        debug!(types = types.len(), "Type hierarchy classified");
        Ok(Self {
            types,
            by_name,
            inconsistent,
        })
    }

    /// Number of types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeInfo> {
        self.types.get(id.0)
    }

    /// Like [`get`](Self::get), but an unknown handle is an error.
    pub fn info(&self, id: TypeId) -> Result<&TypeInfo> {
        self.get(id).ok_or(OntoError::UnknownType(id))
    }

    /// Find a type by name.
    pub fn id(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Like [`id`](Self::id), but a missing name is an error.
    pub fn lookup(&self, name: &str) -> Result<TypeId> {
        self.id(name).ok_or_else(|| OntoError::UnknownName {
            kind: "type",
            name: name.to_string(),
        })
    }

    /// Name of a type, or `"?"` for a foreign handle.
    pub fn name(&self, id: TypeId) -> &str {
        self.get(id).map(|t| t.name.as_str()).unwrap_or("?")
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeInfo> {
        self.types.iter()
    }

    /// Types whose ancestor and disjoint sets overlap (only populated when
    /// classified in [`ConsistencyMode::Warn`]).
    pub fn inconsistent(&self) -> &[TypeId] {
        &self.inconsistent
    }

    pub fn is_consistent(&self) -> bool {
        self.inconsistent.is_empty()
    }

    /// See [`compat::compatible`]. Foreign handles are never compatible.
    pub fn compatible(&self, a: TypeId, b: TypeId) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(a), Some(b)) => compat::compatible(a, b),
            _ => false,
        }
    }

    /// See [`compat::more_specific`].
    pub fn more_specific(&self, a: TypeId, b: TypeId) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(a), Some(b)) => compat::more_specific(a, b),
            _ => false,
        }
    }

    /// True if `a` is `b` or a subtype of it.
    pub fn specializes(&self, a: TypeId, b: TypeId) -> bool {
        self.get(a).is_some_and(|t| t.specializes(b))
    }

    /// See [`compat::has_representation_among`].
    pub fn has_representation_among(&self, ty: TypeId, options: &[TypeId]) -> bool {
        match self.get(ty) {
            Some(info) => compat::has_representation_among(
                info,
                options.iter().filter_map(|o| self.get(*o)),
            ),
            None => false,
        }
    }
}

/// Declares types and disjointness, then computes closures.
///
/// Parents must be declared before their children, so the parent graph is
/// acyclic by construction. Multiple parents are allowed.
#[derive(Debug, Clone, Default)]
pub struct HierarchyBuilder {
    /// Edges point from a type to each of its direct parents.
    graph: DiGraph<String, ()>,
    by_name: HashMap<String, NodeIndex>,
    declared_disjoint: HashMap<NodeIndex, BTreeSet<NodeIndex>>,
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&self, name: &str) -> Result<NodeIndex> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| OntoError::UnknownName {
                kind: "type",
                name: name.to_string(),
            })
    }

    /// Declare a type with zero or more already-declared parents.
    pub fn declare(&mut self, name: impl Into<String>, parents: &[&str]) -> Result<TypeId> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(OntoError::DuplicateName { kind: "type", name });
        }
        let parents = parents
            .iter()
            .map(|p| self.node(p))
            .collect::<Result<Vec<_>>>()?;

        let idx = self.graph.add_node(name.clone());
        for parent in parents {
            self.graph.add_edge(idx, parent, ());
        }
        self.by_name.insert(name, idx);
        Ok(TypeId(idx.index()))
    }

    /// Declare every pair in `names` mutually exclusive.
    pub fn all_disjoint(&mut self, names: &[&str]) -> Result<()> {
        let nodes = names
            .iter()
            .map(|n| self.node(n))
            .collect::<Result<Vec<_>>>()?;
        for &a in &nodes {
            let entry = self.declared_disjoint.entry(a).or_default();
            entry.extend(nodes.iter().copied().filter(|&b| b != a));
        }
        Ok(())
    }

    /// Compute ancestor and disjoint closures for every declared type.
    pub fn build(&self, mode: ConsistencyMode) -> Result<TypeHierarchy> {
        let mut types = Vec::with_capacity(self.graph.node_count());
        for idx in self.graph.node_indices() {
            let mut ancestors = BTreeSet::new();
            let mut dfs = Dfs::new(&self.graph, idx);
            while let Some(ancestor) = dfs.next(&self.graph) {
                ancestors.insert(TypeId(ancestor.index()));
            }

            let disjoints = ancestors
                .iter()
                .filter_map(|a| self.declared_disjoint.get(&NodeIndex::new(a.0)))
                .flatten()
                .map(|d| TypeId(d.index()))
                .collect();

            types.push(TypeInfo {
                id: TypeId(idx.index()),
                name: self.graph[idx].clone(),
                ancestors,
                disjoints,
            });
        }

        let by_name = self
            .by_name
            .iter()
            .map(|(name, idx)| (name.clone(), TypeId(idx.index())))
            .collect();

        TypeHierarchy::finish(types, by_name, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> HierarchyBuilder {
        let mut b = HierarchyBuilder::new();
        b.declare("Top", &[]).unwrap();
        b.declare("Left", &["Top"]).unwrap();
        b.declare("Right", &["Top"]).unwrap();
        b.declare("Bottom", &["Left", "Right"]).unwrap();
        b
    }

    #[test]
    fn test_ancestors_include_self_and_all_parents() {
        let h = diamond().build(ConsistencyMode::Strict).unwrap();
        let bottom = h.info(h.lookup("Bottom").unwrap()).unwrap();
        let names: BTreeSet<&str> = bottom.ancestors.iter().map(|a| h.name(*a)).collect();
        assert_eq!(names, BTreeSet::from(["Top", "Left", "Right", "Bottom"]));
    }

    #[test]
    fn test_disjoints_inherited_from_ancestors() {
        let mut b = HierarchyBuilder::new();
        b.declare("I", &[]).unwrap();
        b.declare("I1", &["I"]).unwrap();
        b.declare("IM", &[]).unwrap();
        b.all_disjoint(&["I", "IM"]).unwrap();
        let h = b.build(ConsistencyMode::Strict).unwrap();

        let i1 = h.info(h.lookup("I1").unwrap()).unwrap();
        assert!(i1.disjoints.contains(&h.lookup("IM").unwrap()));
        // Subtypes are not listed in the disjoint set of the other side
        let im = h.info(h.lookup("IM").unwrap()).unwrap();
        assert!(!im.disjoints.contains(&i1.id));
        assert!(!h.compatible(i1.id, im.id));
    }

    #[test]
    fn test_unknown_parent() {
        let mut b = HierarchyBuilder::new();
        let result = b.declare("Child", &["Missing"]);
        assert!(matches!(result, Err(OntoError::UnknownName { .. })));
    }

    #[test]
    fn test_duplicate_declaration() {
        let mut b = HierarchyBuilder::new();
        b.declare("A", &[]).unwrap();
        assert!(matches!(
            b.declare("A", &[]),
            Err(OntoError::DuplicateName { kind: "type", .. })
        ));
    }

    #[test]
    fn test_strict_mode_rejects_inconsistency() {
        let mut b = diamond();
        b.all_disjoint(&["Left", "Right"]).unwrap();
        let result = b.build(ConsistencyMode::Strict);
        assert_eq!(
            result.unwrap_err(),
            OntoError::Inconsistent {
                types: vec!["Bottom".to_string()]
            }
        );
    }

    #[test]
    fn test_warn_mode_records_inconsistency() {
        let mut b = diamond();
        b.all_disjoint(&["Left", "Right"]).unwrap();
        let h = b.build(ConsistencyMode::Warn).unwrap();
        assert!(!h.is_consistent());
        assert_eq!(h.inconsistent(), &[h.lookup("Bottom").unwrap()]);
    }

    #[test]
    fn test_from_closures_adds_self() {
        let h = TypeHierarchy::from_closures(
            vec![
                TypeClosure::new("MO"),
                TypeClosure::new("MO1").with_ancestors(&["MO"]).with_disjoints(&["MO2"]),
                TypeClosure::new("MO2").with_ancestors(&["MO"]).with_disjoints(&["MO1"]),
            ],
            ConsistencyMode::Strict,
        )
        .unwrap();

        let mo1 = h.lookup("MO1").unwrap();
        assert!(h.info(mo1).unwrap().ancestors.contains(&mo1));
        assert!(h.more_specific(mo1, h.lookup("MO").unwrap()));
        assert!(!h.compatible(mo1, h.lookup("MO2").unwrap()));
    }

    #[test]
    fn test_from_closures_json() {
        let json = r#"[
            { "name": "A" },
            { "name": "B", "ancestors": ["A"] }
        ]"#;
        let closures: Vec<TypeClosure> = serde_json::from_str(json).unwrap();
        let h = TypeHierarchy::from_closures(closures, ConsistencyMode::Strict).unwrap();
        assert_eq!(h.len(), 2);
        assert!(h.specializes(h.lookup("B").unwrap(), h.lookup("A").unwrap()));
    }

    #[test]
    fn test_from_closures_unknown_reference() {
        let result = TypeHierarchy::from_closures(
            vec![TypeClosure::new("A").with_ancestors(&["Nope"])],
            ConsistencyMode::Strict,
        );
        assert!(matches!(result, Err(OntoError::UnknownName { .. })));
    }

    #[test]
    fn test_foreign_handles() {
        let h = diamond().build(ConsistencyMode::Strict).unwrap();
        let foreign = TypeId(99);
        assert!(h.get(foreign).is_none());
        assert_eq!(h.info(foreign), Err(OntoError::UnknownType(foreign)));
        assert!(!h.compatible(foreign, foreign));
        assert_eq!(h.name(foreign), "?");
    }
}

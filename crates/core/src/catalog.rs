//! # Catalog - Operations and Their Typed Ports
//!
//! A catalog is the fixed set of operations a query may compose. Each
//! operation owns ordered mandatory inputs, optional inputs, and outputs.
//! Every port carries a *generic* type; inputs may also carry extra
//! requirements and transitive requirements.
//!
//! ## Declaring vs storing
//!
//! [`Operation`], [`Input`] and [`Output`] are plain declarations with a
//! builder API. [`Catalog::add_operation`] validates a declaration and
//! stores it as records addressed by [`OperationId`], [`InputId`] and
//! [`OutputId`]. After construction the catalog is only read.
//!
//! ## Options
//!
//! An output's *options* describe what its value is also known to be,
//! given how it was produced: the generic types, requirements and
//! transitive requirements of the owning operation's mandatory inputs,
//! followed by any options the operation declares itself.
//!
//! ```rust
//! use ontoflow_core::catalog::{Catalog, Input, Operation, Output};
//! use ontoflow_core::config::ConsistencyMode;
//! use ontoflow_core::hierarchy::HierarchyBuilder;
//!
//! let mut types = HierarchyBuilder::new();
//! let element = types.declare("Element", &[]).unwrap();
//! let structure = types.declare("Structure", &[]).unwrap();
//!
//! let mut catalog = Catalog::new(types.build(ConsistencyMode::Strict).unwrap());
//! let op = catalog
//!     .add_operation(
//!         Operation::new("CreateBulk")
//!             .mandatory(Input::new("CreateBulk/element", element))
//!             .output(Output::new("CreateBulk/structure", structure)),
//!     )
//!     .unwrap();
//!
//! let out = catalog.output_id("CreateBulk/structure").unwrap();
//! assert_eq!(catalog.output(out).unwrap().operation, op);
//! assert_eq!(catalog.output(out).unwrap().options, vec![element]);
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use tracing::debug;

use crate::error::{OntoError, Result};
use crate::hierarchy::{TypeHierarchy, TypeId};

/// Handle to an operation in a [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(pub usize);

/// Handle to an input port in a [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputId(pub usize);

/// Handle to an output port in a [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId(pub usize);

// ============================================================================
// Declarations
// ============================================================================

/// Declaration of an input port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub name: String,
    pub generic: TypeId,
    /// Extra types whatever feeds this port must also satisfy.
    pub requirements: Vec<TypeId>,
    /// Types this port forwards upstream from downstream consumers.
    pub transitive_requirements: Vec<TypeId>,
}

impl Input {
    pub fn new(name: impl Into<String>, generic: TypeId) -> Self {
        Self {
            name: name.into(),
            generic,
            requirements: Vec::new(),
            transitive_requirements: Vec::new(),
        }
    }

    pub fn with_requirements(mut self, requirements: Vec<TypeId>) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn with_transitive(mut self, transitive: Vec<TypeId>) -> Self {
        self.transitive_requirements = transitive;
        self
    }
}

/// Declaration of an output port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub name: String,
    pub generic: TypeId,
}

impl Output {
    pub fn new(name: impl Into<String>, generic: TypeId) -> Self {
        Self {
            name: name.into(),
            generic,
        }
    }
}

/// Declaration of an operation.
///
/// An operation may itself have a generic type. It can then satisfy a
/// typed input directly (a simulation code plugged into a "reference job"
/// slot, for instance) instead of going through one of its outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    pub generic: Option<TypeId>,
    /// Extra facets the operation declares for everything it produces.
    pub options: Vec<TypeId>,
    pub mandatory_inputs: Vec<Input>,
    pub optional_inputs: Vec<Input>,
    pub outputs: Vec<Output>,
}

impl Operation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generic: None,
            options: Vec::new(),
            mandatory_inputs: Vec::new(),
            optional_inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_generic(mut self, generic: TypeId) -> Self {
        self.generic = Some(generic);
        self
    }

    pub fn with_options(mut self, options: Vec<TypeId>) -> Self {
        self.options = options;
        self
    }

    /// Add a mandatory input.
    pub fn mandatory(mut self, input: Input) -> Self {
        self.mandatory_inputs.push(input);
        self
    }

    /// Add an optional input. Optional inputs are never searched.
    pub fn optional(mut self, input: Input) -> Self {
        self.optional_inputs.push(input);
        self
    }

    pub fn output(mut self, output: Output) -> Self {
        self.outputs.push(output);
        self
    }

    fn type_refs(&self) -> impl Iterator<Item = TypeId> + '_ {
        let inputs = self
            .mandatory_inputs
            .iter()
            .chain(&self.optional_inputs)
            .flat_map(|i| {
                std::iter::once(i.generic)
                    .chain(i.requirements.iter().copied())
                    .chain(i.transitive_requirements.iter().copied())
            });
        self.generic
            .into_iter()
            .chain(self.options.iter().copied())
            .chain(inputs)
            .chain(self.outputs.iter().map(|o| o.generic))
    }
}

// ============================================================================
// Records
// ============================================================================

/// A stored operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord {
    pub name: String,
    pub generic: Option<TypeId>,
    /// Facets of the mandatory inputs followed by declared options,
    /// de-duplicated in first-seen order.
    pub options: Vec<TypeId>,
    pub mandatory_inputs: Vec<InputId>,
    pub optional_inputs: Vec<InputId>,
    pub outputs: Vec<OutputId>,
}

impl OperationRecord {
    /// Everything this operation exposes when it stands in for a value:
    /// its options, then its own generic type.
    pub fn facets(&self) -> Vec<TypeId> {
        self.options.iter().copied().chain(self.generic).collect()
    }
}

/// A stored input port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRecord {
    pub name: String,
    pub operation: OperationId,
    pub mandatory: bool,
    pub generic: TypeId,
    pub requirements: Vec<TypeId>,
    pub transitive_requirements: Vec<TypeId>,
}

/// A stored output port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub name: String,
    pub operation: OperationId,
    pub generic: TypeId,
    pub options: Vec<TypeId>,
}

impl OutputRecord {
    /// Options followed by the generic type.
    pub fn facets(&self) -> Vec<TypeId> {
        self.options
            .iter()
            .copied()
            .chain(std::iter::once(self.generic))
            .collect()
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// The immutable set of operations a query runs against, plus the type
/// hierarchy their ports refer to.
#[derive(Debug, Clone)]
pub struct Catalog {
    hierarchy: TypeHierarchy,
    operations: Vec<OperationRecord>,
    inputs: Vec<InputRecord>,
    outputs: Vec<OutputRecord>,
    operation_names: HashMap<String, OperationId>,
    input_names: HashMap<String, InputId>,
    output_names: HashMap<String, OutputId>,
    user_input: BTreeSet<TypeId>,
}

impl Catalog {
    pub fn new(hierarchy: TypeHierarchy) -> Self {
        Self {
            hierarchy,
            operations: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            operation_names: HashMap::new(),
            input_names: HashMap::new(),
            output_names: HashMap::new(),
            user_input: BTreeSet::new(),
        }
    }

    pub fn hierarchy(&self) -> &TypeHierarchy {
        &self.hierarchy
    }

    /// Validate and store an operation. Nothing is stored on error.
    pub fn add_operation(&mut self, op: Operation) -> Result<OperationId> {
        for ty in op.type_refs() {
            self.hierarchy.info(ty)?;
        }
        self.check_names(&op)?;

        let id = OperationId(self.operations.len());

        let mut options: Vec<TypeId> = Vec::new();
        let mut push_unique = |ty: TypeId| {
            if !options.contains(&ty) {
                options.push(ty);
            }
        };
        for input in &op.mandatory_inputs {
            push_unique(input.generic);
            input.requirements.iter().copied().for_each(&mut push_unique);
            input
                .transitive_requirements
                .iter()
                .copied()
                .for_each(&mut push_unique);
        }
        op.options.iter().copied().for_each(&mut push_unique);

        let mandatory_inputs = op
            .mandatory_inputs
            .into_iter()
            .map(|input| self.push_input(id, input, true))
            .collect();
        let optional_inputs = op
            .optional_inputs
            .into_iter()
            .map(|input| self.push_input(id, input, false))
            .collect();
        let outputs = op
            .outputs
            .into_iter()
            .map(|output| {
                let out_id = OutputId(self.outputs.len());
                self.output_names.insert(output.name.clone(), out_id);
                self.outputs.push(OutputRecord {
                    name: output.name,
                    operation: id,
                    generic: output.generic,
                    options: options.clone(),
                });
                out_id
            })
            .collect();

        debug!(operation = %op.name, id = id.0, "Operation added to catalog");
        self.operation_names.insert(op.name.clone(), id);
        self.operations.push(OperationRecord {
            name: op.name,
            generic: op.generic,
            options,
            mandatory_inputs,
            optional_inputs,
            outputs,
        });
        Ok(id)
    }

    fn check_names(&self, op: &Operation) -> Result<()> {
        if self.operation_names.contains_key(&op.name) {
            return Err(OntoError::DuplicateName {
                kind: "operation",
                name: op.name.clone(),
            });
        }

        let mut seen = BTreeSet::new();
        for input in op.mandatory_inputs.iter().chain(&op.optional_inputs) {
            if self.input_names.contains_key(&input.name) || !seen.insert(&input.name) {
                return Err(OntoError::DuplicateName {
                    kind: "input",
                    name: input.name.clone(),
                });
            }
        }

        let mut seen = BTreeSet::new();
        for output in &op.outputs {
            if self.output_names.contains_key(&output.name) || !seen.insert(&output.name) {
                return Err(OntoError::DuplicateName {
                    kind: "output",
                    name: output.name.clone(),
                });
            }
        }
        Ok(())
    }

    fn push_input(&mut self, operation: OperationId, input: Input, mandatory: bool) -> InputId {
        let id = InputId(self.inputs.len());
        self.input_names.insert(input.name.clone(), id);
        self.inputs.push(InputRecord {
            name: input.name,
            operation,
            mandatory,
            generic: input.generic,
            requirements: input.requirements,
            transitive_requirements: input.transitive_requirements,
        });
        id
    }

    /// Flag `ty` (and so every subtype) as supplied directly by the user.
    pub fn mark_user_input(&mut self, ty: TypeId) -> Result<()> {
        self.hierarchy.info(ty)?;
        self.user_input.insert(ty);
        Ok(())
    }

    /// `ty` specializes a type flagged with [`mark_user_input`](Self::mark_user_input).
    pub fn is_user_input(&self, ty: TypeId) -> bool {
        self.hierarchy
            .get(ty)
            .is_some_and(|info| !info.ancestors.is_disjoint(&self.user_input))
    }

    pub fn operation(&self, id: OperationId) -> Option<&OperationRecord> {
        self.operations.get(id.0)
    }

    pub fn input(&self, id: InputId) -> Option<&InputRecord> {
        self.inputs.get(id.0)
    }

    pub fn output(&self, id: OutputId) -> Option<&OutputRecord> {
        self.outputs.get(id.0)
    }

    pub(crate) fn operation_record(&self, id: OperationId) -> Result<&OperationRecord> {
        self.operation(id).ok_or(OntoError::UnknownHandle {
            kind: "operation",
            index: id.0,
        })
    }

    pub(crate) fn input_record(&self, id: InputId) -> Result<&InputRecord> {
        self.input(id).ok_or(OntoError::UnknownHandle {
            kind: "input",
            index: id.0,
        })
    }

    pub(crate) fn output_record(&self, id: OutputId) -> Result<&OutputRecord> {
        self.output(id).ok_or(OntoError::UnknownHandle {
            kind: "output",
            index: id.0,
        })
    }

    pub fn operation_id(&self, name: &str) -> Result<OperationId> {
        lookup(&self.operation_names, "operation", name)
    }

    pub fn input_id(&self, name: &str) -> Result<InputId> {
        lookup(&self.input_names, "input", name)
    }

    pub fn output_id(&self, name: &str) -> Result<OutputId> {
        lookup(&self.output_names, "output", name)
    }

    /// All operations in insertion order.
    pub fn operations(&self) -> impl Iterator<Item = (OperationId, &OperationRecord)> {
        self.operations
            .iter()
            .enumerate()
            .map(|(i, r)| (OperationId(i), r))
    }

    /// All outputs in insertion order.
    pub fn outputs(&self) -> impl Iterator<Item = (OutputId, &OutputRecord)> {
        self.outputs
            .iter()
            .enumerate()
            .map(|(i, r)| (OutputId(i), r))
    }

    /// All inputs in insertion order.
    pub fn inputs(&self) -> impl Iterator<Item = (InputId, &InputRecord)> {
        self.inputs.iter().enumerate().map(|(i, r)| (InputId(i), r))
    }
}

fn lookup<K: Copy>(names: &HashMap<String, K>, kind: &'static str, name: &str) -> Result<K> {
    names.get(name).copied().ok_or_else(|| OntoError::UnknownName {
        kind,
        name: name.to_string(),
    })
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Catalog({} types, {} operations, {} inputs, {} outputs)",
            self.hierarchy.len(),
            self.operations.len(),
            self.inputs.len(),
            self.outputs.len()
        )?;
        for op in &self.operations {
            let ins: Vec<&str> = op
                .mandatory_inputs
                .iter()
                .filter_map(|i| self.input(*i))
                .map(|i| self.hierarchy.name(i.generic))
                .collect();
            let outs: Vec<&str> = op
                .outputs
                .iter()
                .filter_map(|o| self.output(*o))
                .map(|o| self.hierarchy.name(o.generic))
                .collect();
            writeln!(f, "  {}: ({}) → ({})", op.name, ins.join(", "), outs.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsistencyMode;
    use crate::hierarchy::HierarchyBuilder;

    fn types() -> (TypeHierarchy, [TypeId; 4]) {
        let mut b = HierarchyBuilder::new();
        let a = b.declare("A", &[]).unwrap();
        let b1 = b.declare("B", &[]).unwrap();
        let c = b.declare("C", &[]).unwrap();
        let d = b.declare("D", &[]).unwrap();
        (b.build(ConsistencyMode::Strict).unwrap(), [a, b1, c, d])
    }

    #[test]
    fn test_output_options_from_mandatory_inputs() {
        let (h, [a, b, c, d]) = types();
        let mut catalog = Catalog::new(h);
        catalog
            .add_operation(
                Operation::new("f")
                    .mandatory(Input::new("f/x", a).with_requirements(vec![b]))
                    .mandatory(Input::new("f/y", a).with_transitive(vec![c]))
                    .optional(Input::new("f/z", d))
                    .output(Output::new("f/out", d)),
            )
            .unwrap();

        let out = catalog.output(catalog.output_id("f/out").unwrap()).unwrap();
        // Optional input does not contribute, duplicates collapse
        assert_eq!(out.options, vec![a, b, c]);
        assert_eq!(out.facets(), vec![a, b, c, d]);
    }

    #[test]
    fn test_declared_options_follow_input_facets() {
        let (h, [a, b, _, d]) = types();
        let mut catalog = Catalog::new(h);
        let id = catalog
            .add_operation(
                Operation::new("code")
                    .with_generic(d)
                    .with_options(vec![b, a])
                    .mandatory(Input::new("code/in", a)),
            )
            .unwrap();
        let record = catalog.operation(id).unwrap();
        assert_eq!(record.options, vec![a, b]);
        assert_eq!(record.facets(), vec![a, b, d]);
    }

    #[test]
    fn test_records_link_back_to_operation() {
        let (h, [a, _, _, d]) = types();
        let mut catalog = Catalog::new(h);
        catalog.add_operation(Operation::new("first")).unwrap();
        let id = catalog
            .add_operation(
                Operation::new("second")
                    .mandatory(Input::new("second/in", a))
                    .optional(Input::new("second/opt", a))
                    .output(Output::new("second/out", d)),
            )
            .unwrap();

        assert_eq!(id, OperationId(1));
        let input = catalog.input(catalog.input_id("second/in").unwrap()).unwrap();
        assert_eq!(input.operation, id);
        assert!(input.mandatory);
        let opt = catalog.input(catalog.input_id("second/opt").unwrap()).unwrap();
        assert!(!opt.mandatory);
        assert_eq!(catalog.operation_id("second").unwrap(), id);
    }

    #[test]
    fn test_duplicate_names_rejected_atomically() {
        let (h, [a, _, _, _]) = types();
        let mut catalog = Catalog::new(h);
        catalog
            .add_operation(Operation::new("f").mandatory(Input::new("shared", a)))
            .unwrap();

        let result = catalog.add_operation(Operation::new("g").mandatory(Input::new("shared", a)));
        assert!(matches!(
            result,
            Err(OntoError::DuplicateName { kind: "input", .. })
        ));
        assert!(catalog.operation_id("g").is_err());

        let result = catalog.add_operation(Operation::new("f"));
        assert!(matches!(
            result,
            Err(OntoError::DuplicateName {
                kind: "operation",
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let (h, _) = types();
        let mut catalog = Catalog::new(h);
        let result = catalog.add_operation(
            Operation::new("f").output(Output::new("f/out", TypeId(42))),
        );
        assert_eq!(result, Err(OntoError::UnknownType(TypeId(42))));
        assert_eq!(catalog.operations().count(), 0);
    }

    #[test]
    fn test_user_input_covers_subtypes() {
        let mut b = HierarchyBuilder::new();
        let element = b.declare("Element", &[]).unwrap();
        let metal = b.declare("Metal", &["Element"]).unwrap();
        let other = b.declare("Other", &[]).unwrap();
        let mut catalog = Catalog::new(b.build(ConsistencyMode::Strict).unwrap());
        catalog.mark_user_input(element).unwrap();

        assert!(catalog.is_user_input(element));
        assert!(catalog.is_user_input(metal));
        assert!(!catalog.is_user_input(other));
        assert!(catalog.mark_user_input(TypeId(9)).is_err());
    }

    #[test]
    fn test_unknown_names() {
        let (h, _) = types();
        let catalog = Catalog::new(h);
        assert!(matches!(
            catalog.output_id("nope"),
            Err(OntoError::UnknownName { kind: "output", .. })
        ));
    }
}

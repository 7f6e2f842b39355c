//! # Source Finding
//!
//! Given a parameter and an already-resolved requirement set, list the
//! candidates one step upstream:
//!
//! | parameter | candidates |
//! |---|---|
//! | `Type(t)` | outputs whose generic specializes `t`, then operations whose own generic specializes `t`; each must represent every requirement |
//! | `Input(i)` | `External` if `i` is user-supplied, else the `Type` candidates for `i`'s generic |
//! | `Output(o)` | the operation owning `o` |
//! | `Operation(f)` | `f`'s mandatory inputs |
//! | `External` | nothing |
//!
//! "Represent every requirement" means: for each requirement `r`, `r` is
//! compatible with at least one of the candidate's facets (options plus
//! generic type). A candidate with no requirements to check qualifies.

use std::fmt;

use tracing::trace;

use crate::catalog::{Catalog, InputId, OperationId, OutputId};
use crate::error::{OntoError, Result};
use crate::hierarchy::TypeId;
use crate::requirements::Requirements;

/// Anything a composition tree node can wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    Type(TypeId),
    Input(InputId),
    Output(OutputId),
    Operation(OperationId),
    /// Synthetic terminal for user-supplied inputs.
    External,
}

impl Parameter {
    /// Display name of the parameter within `catalog`.
    pub fn name<'c>(&self, catalog: &'c Catalog) -> &'c str {
        match *self {
            Parameter::Type(t) => catalog.hierarchy().name(t),
            Parameter::Input(i) => catalog.input(i).map(|r| r.name.as_str()).unwrap_or("?"),
            Parameter::Output(o) => catalog.output(o).map(|r| r.name.as_str()).unwrap_or("?"),
            Parameter::Operation(f) => catalog
                .operation(f)
                .map(|r| r.name.as_str())
                .unwrap_or("?"),
            Parameter::External => "<external input>",
        }
    }

    /// Short tag for the parameter kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Parameter::Type(_) => "type",
            Parameter::Input(_) => "input",
            Parameter::Output(_) => "output",
            Parameter::Operation(_) => "operation",
            Parameter::External => "external",
        }
    }

    /// Pair the parameter with a catalog for `Display`.
    pub fn display<'a>(&'a self, catalog: &'a Catalog) -> impl fmt::Display + 'a {
        DisplayParameter {
            parameter: self,
            catalog,
        }
    }
}

struct DisplayParameter<'a> {
    parameter: &'a Parameter,
    catalog: &'a Catalog,
}

impl fmt::Display for DisplayParameter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.parameter.name(self.catalog),
            self.parameter.kind()
        )
    }
}

/// Queries the catalog for upstream candidates.
#[derive(Debug, Clone, Copy)]
pub struct SourceFinder<'c> {
    catalog: &'c Catalog,
}

impl<'c> SourceFinder<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    /// Candidates one step upstream of `parameter`.
    ///
    /// For an `Input`, `requirements` must already be resolved at that
    /// input (see [`resolve`](crate::requirements::resolve)).
    pub fn sources(
        &self,
        parameter: Parameter,
        requirements: &Requirements,
    ) -> Result<Vec<Parameter>> {
        let candidates = match parameter {
            Parameter::Type(ty) => self.type_sources(ty, requirements)?,
            Parameter::Input(id) => {
                let input = self.catalog.input_record(id)?;
                if self.catalog.is_user_input(input.generic) {
                    vec![Parameter::External]
                } else {
                    self.type_sources(input.generic, requirements)?
                }
            }
            Parameter::Output(id) => {
                let output = self.catalog.output_record(id)?;
                vec![Parameter::Operation(output.operation)]
            }
            Parameter::Operation(id) => self
                .catalog
                .operation_record(id)?
                .mandatory_inputs
                .iter()
                .map(|&i| Parameter::Input(i))
                .collect(),
            Parameter::External => Vec::new(),
        };
        trace!(
            parameter = %parameter.display(self.catalog),
            candidates = candidates.len(),
            "Sources found"
        );
        Ok(candidates)
    }

    /// Outputs and typed operations producing `ty` under `requirements`.
    pub fn type_sources(&self, ty: TypeId, requirements: &Requirements) -> Result<Vec<Parameter>> {
        let hierarchy = self.catalog.hierarchy();
        hierarchy.info(ty)?;

        let outputs = self
            .catalog
            .outputs()
            .filter(|(_, out)| hierarchy.specializes(out.generic, ty))
            .filter(|(_, out)| self.represents_all(requirements, &out.facets()))
            .map(|(id, _)| Parameter::Output(id));

        let operations = self
            .catalog
            .operations()
            .filter(|(_, op)| op.generic.is_some_and(|g| hierarchy.specializes(g, ty)))
            .filter(|(_, op)| self.represents_all(requirements, &op.facets()))
            .map(|(id, _)| Parameter::Operation(id));

        Ok(outputs.chain(operations).collect())
    }

    /// Every requirement is compatible with at least one facet.
    pub fn represents_all(&self, requirements: &Requirements, facets: &[TypeId]) -> bool {
        let hierarchy = self.catalog.hierarchy();
        requirements
            .iter()
            .all(|&r| hierarchy.has_representation_among(r, facets))
    }

    /// The single output of `operation` whose generic type specializes `ty`.
    ///
    /// Zero or several matches mean the catalog cannot answer the question
    /// unambiguously; both are errors.
    pub fn output_for(&self, operation: OperationId, ty: TypeId) -> Result<OutputId> {
        let hierarchy = self.catalog.hierarchy();
        let record = self.catalog.operation_record(operation)?;
        hierarchy.info(ty)?;

        let matches: Vec<OutputId> = record
            .outputs
            .iter()
            .copied()
            .filter(|&o| {
                self.catalog
                    .output(o)
                    .is_some_and(|out| hierarchy.specializes(out.generic, ty))
            })
            .collect();

        match matches.as_slice() {
            [single] => Ok(*single),
            [] => Err(OntoError::NoMatchingOutput {
                operation: record.name.clone(),
                ty: hierarchy.name(ty).to_string(),
            }),
            many => Err(OntoError::AmbiguousOutput {
                operation: record.name.clone(),
                ty: hierarchy.name(ty).to_string(),
                matches: many
                    .iter()
                    .map(|o| Parameter::Output(*o).name(self.catalog).to_string())
                    .collect(),
            }),
        }
    }

    /// Operations producing `ty` under `requirements`, each paired with the
    /// output that carries it.
    ///
    /// An operation found through one of its outputs must have exactly one
    /// output of that type; otherwise this fails with
    /// [`OntoError::AmbiguousOutput`].
    pub fn producers(
        &self,
        ty: TypeId,
        requirements: &Requirements,
    ) -> Result<Vec<(OperationId, OutputId)>> {
        let mut producers: Vec<(OperationId, OutputId)> = Vec::new();
        for candidate in self.type_sources(ty, requirements)? {
            let Parameter::Output(out) = candidate else {
                continue;
            };
            let operation = self.catalog.output_record(out)?.operation;
            if producers.iter().any(|(op, _)| *op == operation) {
                continue;
            }
            producers.push((operation, self.output_for(operation, ty)?));
        }
        Ok(producers)
    }
}

//! # Composition Paths
//!
//! A single route through the composition tree, chosen one index at a time.
//! Where [`Engine::build_tree`] expands every candidate, [`Engine::build_path`]
//! expands exactly the one selected by the next index and stops when the
//! indices run out, handing back the candidates available at that point so
//! a caller can extend the path interactively.
//!
//! ```rust
//! use ontoflow_core::example;
//! use ontoflow_core::{Engine, Parameter};
//!
//! let catalog = example::three_layer().unwrap();
//! let engine = Engine::with_defaults(&catalog).unwrap();
//! let target = Parameter::Input(catalog.input_id("output1_inp").unwrap());
//!
//! let step = engine.build_path(target, &[]).unwrap();
//! assert_eq!(step.candidates.len(), 2);
//!
//! let step = engine.build_path(target, &[1, 0]).unwrap();
//! assert_eq!(step.tip().parameter.name(&catalog), "middle2");
//! ```

use tracing::debug;

use crate::catalog::OperationId;
use crate::engine::{Engine, Step};
use crate::error::{OntoError, Result};
use crate::requirements::Requirements;
use crate::source::Parameter;
use crate::tree::TreeNode;

/// A partial path plus the choices available at its tip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    /// Chain of nodes, each with at most one child.
    pub root: TreeNode,
    /// Candidates at the tip, in source-finder order.
    pub candidates: Vec<Parameter>,
    /// The walk stopped at the tip because of the depth cap or a repeated
    /// operation, not because the catalog ran out of candidates. Any
    /// indices left over were not consumed.
    pub truncated: bool,
}

impl PathStep {
    /// Last node of the path.
    pub fn tip(&self) -> &TreeNode {
        self.root.first_leaf()
    }

    /// Parameters along the path, root first.
    pub fn parameters(&self) -> Vec<Parameter> {
        let mut out = vec![self.root.parameter];
        let mut node = &self.root;
        while let Some(next) = node.children.first() {
            out.push(next.parameter);
            node = next;
        }
        out
    }
}

impl<'c> Engine<'c> {
    /// Follow `indices` from `parameter`, one candidate per level.
    ///
    /// With [`CyclePolicy::Truncate`](crate::config::CyclePolicy) a guard
    /// that trips ends the walk early: the result has no candidates and
    /// [`PathStep::truncated`] set.
    pub fn build_path(&self, parameter: Parameter, indices: &[usize]) -> Result<PathStep> {
        self.build_path_with(parameter, indices, &Requirements::new())
    }

    /// [`build_path`](Self::build_path) with inbound requirements.
    pub fn build_path_with(
        &self,
        parameter: Parameter,
        indices: &[usize],
        inbound: &Requirements,
    ) -> Result<PathStep> {
        let mut active = Vec::new();
        self.walk(parameter, indices, inbound, 0, &mut active)
    }

    fn walk(
        &self,
        parameter: Parameter,
        indices: &[usize],
        inbound: &Requirements,
        depth: usize,
        active: &mut Vec<OperationId>,
    ) -> Result<PathStep> {
        let truncated = self.cycle_truncates(parameter, active)?;
        let Step {
            requirements,
            candidates,
        } = if truncated {
            Step {
                requirements: inbound.clone(),
                candidates: Vec::new(),
            }
        } else {
            self.step(parameter, inbound)?
        };

        let Some((&index, rest)) = indices.split_first() else {
            return Ok(PathStep {
                root: TreeNode::leaf(parameter, requirements),
                candidates,
                truncated,
            });
        };
        if truncated {
            debug!(
                parameter = %parameter.display(self.catalog()),
                unused = indices.len(),
                "Path cut at repeated operation"
            );
            return Ok(PathStep {
                root: TreeNode::leaf(parameter, requirements),
                candidates,
                truncated,
            });
        }

        let next = *candidates
            .get(index)
            .ok_or(OntoError::PathIndexOutOfRange {
                depth,
                index,
                count: candidates.len(),
            })?;
        if !self.depth_allows(depth)? {
            debug!(
                parameter = %parameter.display(self.catalog()),
                depth,
                unused = indices.len(),
                "Path cut at depth limit"
            );
            return Ok(PathStep {
                root: TreeNode::leaf(parameter, requirements),
                candidates: Vec::new(),
                truncated: true,
            });
        }

        if let Parameter::Operation(op) = parameter {
            active.push(op);
        }
        let below = self.walk(next, rest, &requirements, depth + 1, active);
        if let Parameter::Operation(_) = parameter {
            active.pop();
        }
        let below = below?;

        Ok(PathStep {
            root: TreeNode {
                parameter,
                requirements,
                children: vec![below.root],
            },
            candidates: below.candidates,
            truncated: below.truncated,
        })
    }
}

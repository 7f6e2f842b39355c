//! # Composition Trees
//!
//! The full solution space for a target: every candidate at every branch
//! point, expanded recursively.
//!
//! ```text
//! output3_inp            requirements [MO, I1]
//!   middle1_out1
//!     middle1
//!       middle1_inp1     requirements [IM, I1]
//!         input1_out
//!           input1
//!             input1_inp
//!   middle2_out1
//!     ...
//! ```
//!
//! Requirements are carried by value: each node stores the set that was in
//! force when its candidates were enumerated, and hands a copy to every
//! child. A node without children is either a dead end or the synthetic
//! external-input terminal; neither is an error.

use std::fmt::Write;

use tracing::debug;

use crate::catalog::{Catalog, OperationId};
use crate::engine::Engine;
use crate::error::Result;
use crate::requirements::Requirements;
use crate::source::Parameter;

/// A node in a composition tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub parameter: Parameter,
    /// Requirements in force at this node.
    pub requirements: Requirements,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// A node with no children.
    pub fn leaf(parameter: Parameter, requirements: Requirements) -> Self {
        Self {
            parameter,
            requirements,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of nodes, this one included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::count).sum::<usize>()
    }

    /// Longest root-to-leaf distance in edges.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// All leaves, left to right.
    pub fn leaves(&self) -> Vec<&TreeNode> {
        if self.is_leaf() {
            return vec![self];
        }
        self.children.iter().flat_map(TreeNode::leaves).collect()
    }

    /// Follow the first child until a leaf.
    pub fn first_leaf(&self) -> &TreeNode {
        let mut node = self;
        while let Some(first) = node.children.first() {
            node = first;
        }
        node
    }

    /// The parent of [`first_leaf`](Self::first_leaf), if the tree has more
    /// than one node.
    pub fn first_leaf_parent(&self) -> Option<&TreeNode> {
        let mut parent = None;
        let mut node = self;
        while let Some(first) = node.children.first() {
            parent = Some(node);
            node = first;
        }
        parent
    }

    /// Indented, one parameter per line.
    pub fn render(&self, catalog: &Catalog) -> String {
        self.render_indent(catalog, 0)
    }

    fn render_indent(&self, catalog: &Catalog, indent: usize) -> String {
        let mut out = String::new();
        let prefix = "  ".repeat(indent);
        let _ = writeln!(out, "{}{}", prefix, self.parameter.display(catalog));
        for child in &self.children {
            out.push_str(&child.render_indent(catalog, indent + 1));
        }
        out
    }
}

impl<'c> Engine<'c> {
    /// Build the complete composition tree under `parameter`.
    ///
    /// Under [`CyclePolicy::Truncate`](crate::config::CyclePolicy) an
    /// operation that shows up again below itself appears as a leaf, as
    /// does any node at the depth cap. Such leaves look like dead ends; use
    /// [`build_path`](Self::build_path) and [`PathStep::truncated`](crate::path::PathStep::truncated)
    /// to tell them apart.
    pub fn build_tree(&self, parameter: Parameter) -> Result<TreeNode> {
        self.build_tree_with(parameter, &Requirements::new())
    }

    /// Build the tree with requirements flowing in from a downstream
    /// consumer.
    pub fn build_tree_with(
        &self,
        parameter: Parameter,
        inbound: &Requirements,
    ) -> Result<TreeNode> {
        let mut active = Vec::new();
        self.grow(parameter, inbound, 0, &mut active)
    }

    fn grow(
        &self,
        parameter: Parameter,
        inbound: &Requirements,
        depth: usize,
        active: &mut Vec<OperationId>,
    ) -> Result<TreeNode> {
        if self.cycle_truncates(parameter, active)? {
            return Ok(TreeNode::leaf(parameter, inbound.clone()));
        }

        let step = self.step(parameter, inbound)?;
        debug!(
            parameter = %parameter.display(self.catalog()),
            depth,
            candidates = step.candidates.len(),
            "Expanding tree node"
        );
        if step.candidates.is_empty() || !self.depth_allows(depth)? {
            return Ok(TreeNode::leaf(parameter, step.requirements));
        }

        if let Parameter::Operation(op) = parameter {
            active.push(op);
        }
        let children = step
            .candidates
            .iter()
            .map(|&candidate| self.grow(candidate, &step.requirements, depth + 1, active))
            .collect::<Result<Vec<_>>>();
        if let Parameter::Operation(_) = parameter {
            active.pop();
        }

        Ok(TreeNode {
            parameter,
            requirements: step.requirements,
            children: children?,
        })
    }
}

//! # OntoFlow Core - Type-Constrained Workflow Composition
//!
//! Given a catalog of operations with typed inputs and outputs, and a type
//! hierarchy with disjointness, this crate answers "what chain of operations
//! can produce a value of this type, under these extra constraints?"
//!
//! - **Hierarchy**: precomputed ancestor and disjoint closures per type
//! - **Compatibility**: set tests over those closures
//! - **Catalog**: operations, their ports and output options
//! - **Requirements**: merging downstream constraints into an input
//! - **Sources**: one step upstream from any parameter
//! - **Trees and paths**: the full solution space, or one route through it
//!
//! ## Quick start
//!
//! ```rust
//! use ontoflow_core::{example, Engine, Parameter};
//!
//! let catalog = example::three_layer().unwrap();
//! let engine = Engine::with_defaults(&catalog).unwrap();
//!
//! let target = Parameter::Input(catalog.input_id("output3_inp").unwrap());
//! let tree = engine.build_tree(target).unwrap();
//! assert_eq!(tree.first_leaf().parameter.name(&catalog), "input1_inp");
//! ```
//!
//! Everything is computed from an immutable [`Catalog`] passed by reference;
//! there is no global state.

pub mod catalog;
pub mod compat;
pub mod config;
pub mod engine;
pub mod error;
pub mod example;
pub mod hierarchy;
pub mod path;
pub mod requirements;
pub mod source;
pub mod tree;

pub use catalog::{Catalog, Input, InputId, Operation, OperationId, Output, OutputId};
pub use config::{ConsistencyMode, CyclePolicy, EngineConfig};
pub use engine::{Engine, Step};
pub use error::{OntoError, Result};
pub use hierarchy::{HierarchyBuilder, TypeClosure, TypeHierarchy, TypeId, TypeInfo};
pub use path::PathStep;
pub use requirements::Requirements;
pub use source::{Parameter, SourceFinder};
pub use tree::TreeNode;

//! # Engine
//!
//! Ties a catalog, a [`SourceFinder`] and an [`EngineConfig`] together. One
//! resolution step is:
//!
//! 1. If the parameter is an input, resolve its requirements against what
//!    flows in from downstream.
//! 2. Ask the source finder for candidates under the (possibly resolved)
//!    requirements.
//!
//! The tree and path builders repeat this step recursively. The engine
//! only borrows the catalog, so any number of engines and queries can share
//! one catalog across threads.

use tracing::debug;

use crate::catalog::{Catalog, InputId, OperationId, OutputId};
use crate::config::{CyclePolicy, EngineConfig};
use crate::error::{OntoError, Result};
use crate::hierarchy::TypeId;
use crate::requirements::{self, Requirements};
use crate::source::{Parameter, SourceFinder};

/// Result of one resolution step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Requirements in force at the parameter; passed on to every candidate.
    pub requirements: Requirements,
    pub candidates: Vec<Parameter>,
}

/// Query entry point over one catalog.
#[derive(Debug, Clone)]
pub struct Engine<'c> {
    catalog: &'c Catalog,
    finder: SourceFinder<'c>,
    config: EngineConfig,
}

impl<'c> Engine<'c> {
    /// Create an engine. Refuses a catalog whose hierarchy recorded
    /// inconsistent types.
    pub fn new(catalog: &'c Catalog, config: EngineConfig) -> Result<Self> {
        let hierarchy = catalog.hierarchy();
        if !hierarchy.is_consistent() {
            return Err(OntoError::Inconsistent {
                types: hierarchy
                    .inconsistent()
                    .iter()
                    .map(|t| hierarchy.name(*t).to_string())
                    .collect(),
            });
        }
        Ok(Self {
            catalog,
            finder: SourceFinder::new(catalog),
            config,
        })
    }

    /// Engine with [`EngineConfig::default`].
    pub fn with_defaults(catalog: &'c Catalog) -> Result<Self> {
        Self::new(catalog, EngineConfig::default())
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn finder(&self) -> &SourceFinder<'c> {
        &self.finder
    }

    /// Effective requirements at `input` given inbound ones.
    pub fn resolve(&self, input: InputId, inbound: &Requirements) -> Result<Requirements> {
        let record = self.catalog.input_record(input)?;
        Ok(requirements::resolve(
            self.catalog.hierarchy(),
            record,
            inbound,
        ))
    }

    /// One resolution step at `parameter`.
    pub fn step(&self, parameter: Parameter, inbound: &Requirements) -> Result<Step> {
        let requirements = match parameter {
            Parameter::Input(id) => self.resolve(id, inbound)?,
            _ => inbound.clone(),
        };
        let candidates = self.finder.sources(parameter, &requirements)?;
        Ok(Step {
            requirements,
            candidates,
        })
    }

    /// See [`SourceFinder::producers`].
    pub fn producers(
        &self,
        ty: TypeId,
        requirements: &Requirements,
    ) -> Result<Vec<(OperationId, OutputId)>> {
        self.finder.producers(ty, requirements)
    }

    /// True if `parameter` re-enters an operation already on the active
    /// path and the policy says to stop there.
    pub(crate) fn cycle_truncates(
        &self,
        parameter: Parameter,
        active: &[OperationId],
    ) -> Result<bool> {
        let Parameter::Operation(op) = parameter else {
            return Ok(false);
        };
        if !active.contains(&op) {
            return Ok(false);
        }
        let operation = parameter.name(self.catalog).to_string();
        match self.config.on_cycle {
            CyclePolicy::Error => Err(OntoError::CycleDetected { operation }),
            CyclePolicy::Truncate => {
                debug!(operation = %operation, "Cycle truncated");
                Ok(true)
            }
        }
    }

    /// True if a node at `depth` may expand into its candidates.
    pub(crate) fn depth_allows(&self, depth: usize) -> Result<bool> {
        match self.config.max_depth {
            Some(limit) if depth >= limit => match self.config.on_depth_limit {
                CyclePolicy::Error => Err(OntoError::DepthExceeded { limit }),
                CyclePolicy::Truncate => {
                    debug!(depth, limit, "Depth limit reached, truncating");
                    Ok(false)
                }
            },
            _ => Ok(true),
        }
    }
}

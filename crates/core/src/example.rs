//! A small three-layer catalog for tests, docs and the walkthrough demo.
//!
//! ```text
//! input1 (I1 -> IM)   middle1 (IM [+IMOptional] -> MO1, MOUnused)   output1 (MO  -> O)
//! input2 (I2 -> IM)   middle2 (IM [+IMOptional] -> MO2B, MOUnused)  output2 (MO1 -> O)
//!                                                                    output3 (MO + I1 -> O)
//!                                                                    output4 (MO2 + I2 -> O)
//! ```
//!
//! The middle inputs forward any `I` requirement upstream, so a consumer
//! asking for `I1` ends up with `input1` only.

use crate::catalog::{Catalog, Input, Operation, Output};
use crate::config::ConsistencyMode;
use crate::error::Result;
use crate::hierarchy::HierarchyBuilder;

/// Build the three-layer catalog.
pub fn three_layer() -> Result<Catalog> {
    let mut types = HierarchyBuilder::new();
    let i = types.declare("I", &[])?;
    let i1 = types.declare("I1", &["I"])?;
    let i2 = types.declare("I2", &["I"])?;
    let im = types.declare("IM", &[])?;
    let im_optional = types.declare("IMOptional", &[])?;
    let mo = types.declare("MO", &[])?;
    let mo1 = types.declare("MO1", &["MO"])?;
    let mo2 = types.declare("MO2", &["MO"])?;
    types.declare("MO2A", &["MO2"])?;
    let mo2b = types.declare("MO2B", &["MO2"])?;
    let mo_unused = types.declare("MOUnused", &[])?;
    let o = types.declare("O", &[])?;
    types.all_disjoint(&["I1", "I2"])?;
    types.all_disjoint(&["MO1", "MO2"])?;
    types.all_disjoint(&["O", "MO", "MOUnused", "IMOptional", "IM", "I"])?;

    let mut catalog = Catalog::new(types.build(ConsistencyMode::Strict)?);

    for (name, generic) in [("input1", i1), ("input2", i2)] {
        catalog.add_operation(
            Operation::new(name)
                .mandatory(Input::new(format!("{name}_inp"), generic))
                .output(Output::new(format!("{name}_out"), im)),
        )?;
    }

    for (name, produced) in [("middle1", mo1), ("middle2", mo2b)] {
        catalog.add_operation(
            Operation::new(name)
                .mandatory(Input::new(format!("{name}_inp1"), im).with_transitive(vec![i]))
                .optional(Input::new(format!("{name}_inp2"), im_optional))
                .output(Output::new(format!("{name}_out1"), produced))
                .output(Output::new(format!("{name}_out2"), mo_unused)),
        )?;
    }

    let consumers = [
        ("output1", mo, vec![]),
        ("output2", mo1, vec![]),
        ("output3", mo, vec![i1]),
        ("output4", mo2, vec![i2]),
    ];
    for (name, generic, requirements) in consumers {
        catalog.add_operation(
            Operation::new(name)
                .mandatory(Input::new(format!("{name}_inp"), generic).with_requirements(requirements))
                .output(Output::new(format!("{name}_out"), o)),
        )?;
    }

    Ok(catalog)
}

//! Walkthrough: sources, trees and paths on the three-layer catalog
//!
//! Run with: cargo run -p ontoflow-core --example composition_tree
//!
//! Set `RUST_LOG=ontoflow_core=debug` to watch the tree builder expand
//! nodes, or `=trace` to see every requirement merge.

use ontoflow_core::{example, Engine, OntoError, Parameter};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), OntoError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let catalog = example::three_layer()?;
    let engine = Engine::with_defaults(&catalog)?;

    println!("=== Composition Trees ===\n");
    println!("Catalog:\n{}", catalog);

    // -------------------------------------------------------------------------
    // 1. Full trees
    // -------------------------------------------------------------------------
    for target in ["output1_inp", "output2_inp", "output3_inp", "output4_inp"] {
        let param = Parameter::Input(catalog.input_id(target)?);
        let tree = engine.build_tree(param)?;
        println!("Tree for {} ({} nodes):", target, tree.count());
        println!("{}", tree.render(&catalog));
    }

    // -------------------------------------------------------------------------
    // 2. Stepping along one path
    // -------------------------------------------------------------------------
    println!("Path for output3_inp, always taking the last candidate:");
    let target = Parameter::Input(catalog.input_id("output3_inp")?);
    let mut indices = Vec::new();
    loop {
        let step = engine.build_path(target, &indices)?;
        let options: Vec<String> = step
            .candidates
            .iter()
            .map(|c| c.display(&catalog).to_string())
            .collect();
        println!(
            "  at {:<28} requirements {:<12} choices {:?}",
            step.tip().parameter.display(&catalog).to_string(),
            step.tip().requirements.display(catalog.hierarchy()).to_string(),
            options
        );
        if step.candidates.is_empty() {
            break;
        }
        indices.push(step.candidates.len() - 1);
    }

    // -------------------------------------------------------------------------
    // 3. Errors
    // -------------------------------------------------------------------------
    match engine.build_path(target, &[5]) {
        Err(e) => println!("\nBad index: {}", e),
        Ok(_) => println!("\nBad index accepted?"),
    }

    Ok(())
}

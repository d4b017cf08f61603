//! Basic example demonstrating the built-in marker rules.
//!
//! This example shows how to:
//! 1. Build an annotated matrix in memory
//! 2. Apply the four built-in rules
//! 3. Inspect subset sizes and overlaps
//! 4. Print the rules as YAML for editing

use cell_subset::prelude::*;
use sprs::TriMat;

fn main() -> Result<()> {
    println!("=== Cell Subset Example ===\n");

    let adata = create_example_data()?;

    println!("Data dimensions:");
    println!("  Cells: {}", adata.n_cells());
    println!("  Genes: {}", adata.n_genes());
    println!("  Cell types: {:?}", adata.obs().levels("celltype")?);
    println!();

    println!("=== Applying Built-in Rules ===\n");

    let rules = builtin_rules("celltype");
    for rule in &rules {
        println!("  {:<15} {}", rule.name, rule.predicate);
    }
    println!();

    let results = select_all(&adata, &rules)?;
    for result in &results {
        println!("{}", result);
    }

    let report = SelectionReport::new("example", &adata, &results);
    println!("=== Overlaps ===\n");
    for o in &report.overlaps {
        println!("  {:<15} {:<15} {:>4}", o.a, o.b, o.n_shared);
    }

    println!("\n=== Selection Configuration (YAML) ===\n");
    println!("{}", SelectionConfig::builtin("celltype").to_yaml()?);

    Ok(())
}

/// Create example data with marker genes spread across cell types.
fn create_example_data() -> Result<AnnotatedMatrix> {
    let n_cells = 200;
    let genes = ["Pomc", "Agrp", "Npy", "Rbfox3", "Lxn"];
    let mut tri_mat = TriMat::new((n_cells, genes.len()));
    let mut seed = 12345u64;

    let rand_uniform = |s: &mut u64| -> f64 {
        *s = s.wrapping_mul(1103515245).wrapping_add(12345);
        ((*s >> 16) & 0x7FFF) as f64 / 32768.0
    };

    let mut celltypes = Vec::with_capacity(n_cells);
    for cell in 0..n_cells {
        let is_neuron = cell % 2 == 0;
        celltypes.push(if is_neuron { "Neurons" } else { "Astrocytes" });

        // Neurons carry strong Rbfox3 and some neuropeptide signal
        let scales = if is_neuron {
            [120.0, 30.0, 40.0, 40.0, 1.0]
        } else {
            [5.0, 2.0, 2.0, 12.0, 4.0]
        };

        for (col, scale) in scales.iter().enumerate() {
            let value = (scale * rand_uniform(&mut seed)).floor();
            if value > 0.0 {
                tri_mat.add_triplet(cell, col, value);
            }
        }
    }

    let cell_ids: Vec<String> = (0..n_cells).map(|i| format!("cell_{:03}", i)).collect();
    let gene_ids: Vec<String> = genes.iter().map(|g| g.to_string()).collect();

    let matrix = ExpressionMatrix::new(tri_mat.to_csr(), cell_ids.clone(), gene_ids)?;
    let obs = CellAnnotations::new(cell_ids).with_categorical("celltype", &celltypes)?;
    AnnotatedMatrix::new(matrix, obs)
}

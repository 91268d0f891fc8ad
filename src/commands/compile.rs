//! `lattice compile` - full compilation against a directory-backed store.

use anyhow::{bail, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::compiler::Compiler;
use crate::storage::DirStore;

pub fn execute(
    spec_path: PathBuf,
    store_root: PathBuf,
    sysimage: Vec<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let sysimages = super::parse_sysimages(&sysimage)?;
    let spec = super::load_spec(&spec_path)?;
    let store = DirStore::new(store_root);

    let plan = match Compiler::new(sysimages, &store).compile(&spec) {
        Ok(plan) => plan,
        Err(report) => {
            for error in report.errors() {
                eprintln!("  {} {error}", "error:".red().bold());
            }
            bail!("compilation failed with {} error(s)", report.len());
        }
    };

    println!(
        "{} {} instance(s), {} edge(s) from {} node(s)",
        "compiled".green().bold(),
        plan.instances.len(),
        plan.edges.len(),
        plan.groups.len()
    );

    let json = plan.to_json()?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!("plan written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

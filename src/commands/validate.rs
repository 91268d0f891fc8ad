//! `lattice validate` - structural validation without touching storage.

use anyhow::{bail, Result};
use colored::Colorize;
use std::path::PathBuf;

use crate::servlet::validate;

pub fn execute(spec_path: PathBuf, sysimage: Vec<String>) -> Result<()> {
    let sysimages = super::parse_sysimages(&sysimage)?;
    let spec = super::load_spec(&spec_path)?;

    let errors = validate(&spec, &sysimages);
    if errors.is_empty() {
        println!(
            "{} {} node(s) validated",
            "ok".green().bold(),
            spec.nodes.len()
        );
        return Ok(());
    }

    for error in &errors {
        eprintln!("  {} {error}", "error:".red().bold());
    }
    bail!("{} validation error(s)", errors.len());
}

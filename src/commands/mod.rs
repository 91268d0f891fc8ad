//! CLI command implementations.

pub mod compile;
pub mod validate;

use anyhow::{anyhow, Context, Result};
use std::path::Path;

use crate::devices::SysimageConfig;
use crate::servlet::ServletSpec;

/// Read and parse a servlet configuration file.
pub(crate) fn load_spec(path: &Path) -> Result<ServletSpec> {
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read spec file: {}", path.display()))?;
    ServletSpec::from_json(&input)
}

/// Build the system-image configuration from repeated `name=path` flags.
pub(crate) fn parse_sysimages(pairs: &[String]) -> Result<SysimageConfig> {
    let mut config = SysimageConfig::new();
    for pair in pairs {
        let (name, path) = SysimageConfig::parse_pair(pair).map_err(|detail| anyhow!(detail))?;
        config.push(name, path);
    }
    Ok(config)
}

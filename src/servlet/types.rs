//! Servlet configuration schema type definitions.
//!
//! Fields that the validator must be able to report as missing are
//! `Option` here; structural checks live in `validation`, not in the
//! deserializer, so one parse can surface every problem at once.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A full servlet configuration: an ordered list of node definitions.
/// Immutable once parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServletSpec {
    pub nodes: Vec<NodeSpec>,
}

impl ServletSpec {
    /// Parse a servlet configuration from its JSON form: an array of node
    /// objects.
    pub fn from_json(input: &str) -> Result<ServletSpec> {
        serde_json::from_str(input).context("failed to parse servlet configuration")
    }
}

/// One logical execution node; expands into one or more instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<ExecSpec>,
    /// `file_list` is a deprecated alias still accepted on input.
    #[serde(default, alias = "file_list", skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<DeviceSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connect: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicate: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attach: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl NodeSpec {
    /// Label for diagnostics: the node name, or its position when the name
    /// is missing.
    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("#{}", index + 1),
        }
    }

    /// Attach target, defaulting to "default".
    pub fn attach_target(&self) -> &str {
        self.attach.as_deref().unwrap_or("default")
    }

    /// Replication factor, defaulting to 1.
    pub fn replication(&self) -> u64 {
        self.replicate.unwrap_or(1)
    }
}

/// Executable description for a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Display name; defaults to the owning node's name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Literal command-line string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// One named I/O channel exposed to a sandboxed instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSpec {
    /// `device` is a deprecated alias still accepted on input.
    #[serde(default, alias = "device", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<DeviceMode>,
    #[serde(default)]
    pub min_size: u64,
}

impl DeviceSpec {
    /// Whether the declared path carries a wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.path.as_deref().is_some_and(|p| p.contains('*'))
    }
}

/// Stat-type override for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceMode {
    File,
    Block,
    Char,
    Pipe,
}

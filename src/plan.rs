//! Execution plan types: the compiler's immutable output.
//!
//! Instances live in an arena owned by the plan; connection edges are
//! index pairs into it. Index-based edges keep self-connections and cyclic
//! topologies representable without ownership cycles.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::content::ContentMode;
use crate::devices::Access;
use crate::servlet::DeviceMode;

/// The sealed output of a successful compile. Consumed by the external
/// runtime and discarded after the job completes.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionPlan {
    /// Instance arena; edges and groups index into it.
    pub instances: Vec<Instance>,
    /// Directed connection edges between instances.
    pub edges: Vec<Edge>,
    /// Instance indices per logical node, in declaration order.
    pub groups: Vec<NodeGroup>,
}

impl ExecutionPlan {
    /// Arena indices of the instances expanded from `node`.
    pub fn instances_of(&self, node: &str) -> &[usize] {
        self.groups
            .iter()
            .find(|group| group.node == node)
            .map(|group| group.instances.as_slice())
            .unwrap_or(&[])
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize execution plan")
    }
}

/// One ordered source → destination pair of arena indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
}

/// Expansion group of one logical node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeGroup {
    pub node: String,
    pub instances: Vec<usize>,
}

/// One concrete execution unit produced by node expansion.
#[derive(Debug, Clone, Serialize)]
pub struct Instance {
    /// Logical node this instance was expanded from.
    pub node: String,
    /// Display name: "sort", "sort-2", or "sort-2.1" with replication.
    pub name: String,
    /// Zero-based ordinal within the expansion group.
    pub ordinal: usize,
    /// Zero-based replica number.
    pub replica: usize,
    pub devices: Vec<ResolvedDevice>,
    pub exec: ResolvedExec,
    pub placement: PlacementHint,
}

/// A device with its wildcard resolved and access flags attached.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedDevice {
    pub name: String,
    pub access: Access,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub content: ContentMode,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<DeviceMode>,
    pub min_size: u64,
}

/// The executable an instance runs, with its resolution source.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedExec {
    /// Object URL, absolute path, or a member path inside the source
    /// archive.
    pub path: String,
    pub source: ExecSource,
    /// Display name, copied into every instance of the group.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// Where an executable path was located.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecSource {
    /// Storage URL or absolute path; no resolution was needed.
    Direct,
    /// Found inside the node's own image device archive (the archive
    /// path).
    Image(String),
    /// Found inside a configured system-image archive (the configured
    /// device name).
    SystemImage(String),
}

/// Advisory placement for one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementHint {
    pub target: PlacementTarget,
    /// Best-effort co-location tag, understood only by the external
    /// scheduler.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Data-locality target for an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementTarget {
    /// Co-locate with the storage node holding this object path.
    Near(String),
    /// The runtime picks freely.
    Unconstrained,
}

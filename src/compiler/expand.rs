//! Node expansion: logical nodes become concrete instances.

use tracing::debug;

use crate::content::ContentMode;
use crate::devices::{DeviceKind, SysimageConfig};
use crate::error::CompileError;
use crate::plan::{ExecSource, Instance, PlacementHint, PlacementTarget, ResolvedDevice, ResolvedExec};
use crate::servlet::ServletSpec;

use super::wildcard::NodeWildcards;

/// Expansion bookkeeping for one logical node. Instance indices are
/// ordinal-major: replicas of ordinal `i` sit at `i * replicate + r`.
#[derive(Debug)]
pub(crate) struct GroupExpansion {
    pub node_index: usize,
    pub name: String,
    pub count: usize,
    pub replicate: usize,
    pub instances: Vec<usize>,
}

/// Expand every node into its instances. Wildcard matches override any
/// explicit count; otherwise the declared count (default 1) applies.
pub(crate) fn expand(
    spec: &ServletSpec,
    wildcards: &[NodeWildcards],
    sysimages: &SysimageConfig,
) -> Result<(Vec<Instance>, Vec<GroupExpansion>), CompileError> {
    let mut instances = Vec::new();
    let mut groups = Vec::with_capacity(spec.nodes.len());

    for (node_index, node) in spec.nodes.iter().enumerate() {
        let name = node.label(node_index);
        let resolved = &wildcards[node_index];
        let count = resolved
            .count
            .unwrap_or_else(|| node.count.unwrap_or(1) as usize);
        let replicate = node.replication() as usize;

        let mut group = GroupExpansion {
            node_index,
            name: name.clone(),
            count,
            replicate,
            instances: Vec::with_capacity(count * replicate),
        };

        for ordinal in 0..count {
            for replica in 0..replicate {
                let instance = build_instance(
                    spec, node_index, &name, ordinal, replica, count, replicate, resolved,
                    sysimages,
                )?;
                group.instances.push(instances.len());
                instances.push(instance);
            }
        }

        debug!(node = %name, instances = group.instances.len(), "node expanded");
        groups.push(group);
    }

    Ok((instances, groups))
}

#[allow(clippy::too_many_arguments)]
fn build_instance(
    spec: &ServletSpec,
    node_index: usize,
    name: &str,
    ordinal: usize,
    replica: usize,
    count: usize,
    replicate: usize,
    resolved: &NodeWildcards,
    sysimages: &SysimageConfig,
) -> Result<Instance, CompileError> {
    let node = &spec.nodes[node_index];
    let mut devices = Vec::with_capacity(node.devices.len());

    for (device_index, device) in node.devices.iter().enumerate() {
        let device_name = device.name.clone().unwrap_or_default();
        let kind =
            DeviceKind::classify(&device_name, sysimages).ok_or_else(|| CompileError::Name {
                node: name.to_string(),
                detail: format!("unknown device name '{device_name}'"),
            })?;

        let path = if let Some(urls) = resolved.matches.get(&device_index) {
            Some(urls[ordinal].clone())
        } else if device.is_wildcard() {
            device
                .path
                .as_deref()
                .map(|pattern| substitute(pattern, &resolved.captures[ordinal]))
        } else {
            device.path.clone()
        };

        devices.push(ResolvedDevice {
            name: device_name,
            access: kind.rule().access,
            path,
            content: ContentMode::Raw,
            meta: device.meta.clone(),
            mode: device.mode,
            min_size: device.min_size,
        });
    }

    let exec = node.exec.as_ref().ok_or_else(|| CompileError::Schema {
        node: name.to_string(),
        detail: "missing 'exec'".to_string(),
    })?;
    let exec_path = exec.path.clone().ok_or_else(|| CompileError::Schema {
        node: name.to_string(),
        detail: "missing 'exec.path'".to_string(),
    })?;

    Ok(Instance {
        node: name.to_string(),
        name: instance_name(name, ordinal, replica, count, replicate),
        ordinal,
        replica,
        devices,
        exec: ResolvedExec {
            path: exec_path,
            source: ExecSource::Direct,
            name: exec.name.clone().unwrap_or_else(|| name.to_string()),
            args: exec.args.clone(),
            env: exec.env.clone(),
        },
        placement: PlacementHint {
            target: PlacementTarget::Unconstrained,
            location: None,
        },
    })
}

/// "sort" for a singleton, "sort-2" for the second of a group, "sort-2.1"
/// for its first replica under replication.
fn instance_name(
    node: &str,
    ordinal: usize,
    replica: usize,
    count: usize,
    replicate: usize,
) -> String {
    match (count, replicate) {
        (1, 1) => node.to_string(),
        (_, 1) => format!("{node}-{}", ordinal + 1),
        _ => format!("{node}-{}.{}", ordinal + 1, replica + 1),
    }
}

/// Replace each `*` in `pattern` with the next capture, positionally.
fn substitute(pattern: &str, captures: &[String]) -> String {
    let mut out = String::new();
    let mut remaining = captures.iter();
    for (index, part) in pattern.split('*').enumerate() {
        if index > 0 {
            out.push_str(remaining.next().map(String::as_str).unwrap_or(""));
        }
        out.push_str(part);
    }
    out
}

//! Placement hints: advisory data-locality targets per instance.

use crate::plan::{Instance, PlacementHint, PlacementTarget, ResolvedDevice};
use crate::servlet::ServletSpec;
use crate::storage::StoragePath;

use super::expand::GroupExpansion;

/// Compute one hint per instance. The hint is advisory: the resolver
/// never enforces it, and the `location` tag is passed through for the
/// external scheduler's best-effort grouping.
pub(crate) fn assign(spec: &ServletSpec, groups: &[GroupExpansion], instances: &mut [Instance]) {
    for group in groups {
        let node = &spec.nodes[group.node_index];
        let attach = node.attach_target();
        for &index in &group.instances {
            let instance = &mut instances[index];
            let target = match attach {
                "default" => first_storage_path(&instance.devices),
                name => named_storage_path(&instance.devices, name),
            };
            instance.placement = PlacementHint {
                target: target.map_or(PlacementTarget::Unconstrained, PlacementTarget::Near),
                location: node.location.clone(),
            };
        }
    }
}

/// First storage-backed path in rank order: readable devices first,
/// writable-only second, everything else last. The sort is stable, so
/// declaration order breaks ties.
fn first_storage_path(devices: &[ResolvedDevice]) -> Option<String> {
    let mut ranked: Vec<&ResolvedDevice> = devices.iter().collect();
    ranked.sort_by_key(|device| rank(device));
    ranked
        .iter()
        .filter_map(|device| device.path.as_deref())
        .find(|path| StoragePath::is_storage_url(path))
        .map(str::to_string)
}

fn named_storage_path(devices: &[ResolvedDevice], name: &str) -> Option<String> {
    devices
        .iter()
        .find(|device| device.name == name)
        .and_then(|device| device.path.as_deref())
        .filter(|path| StoragePath::is_storage_url(path))
        .map(str::to_string)
}

fn rank(device: &ResolvedDevice) -> u8 {
    if device.access.is_readable() {
        0
    } else if device.access.is_writable() {
        1
    } else {
        2
    }
}

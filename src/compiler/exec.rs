//! Executable resolution and content-negotiation tagging.
//!
//! A relative `exec.path` names a file inside an archive: the node's own
//! image device is probed first, then each configured system-image device
//! in declared order, first match wins. Storage URLs and absolute paths
//! pass through untouched.

use tracing::debug;

use crate::content::ContentMode;
use crate::devices::SysimageConfig;
use crate::error::CompileError;
use crate::plan::{ExecSource, Instance};
use crate::servlet::{NodeSpec, ServletSpec};
use crate::storage::{ObjectStore, StoragePath};

use super::expand::GroupExpansion;

/// Resolve executables per node and tag every writable device with its
/// content mode.
pub(crate) fn resolve(
    spec: &ServletSpec,
    groups: &[GroupExpansion],
    sysimages: &SysimageConfig,
    store: &dyn ObjectStore,
    instances: &mut [Instance],
) -> Result<(), CompileError> {
    for group in groups {
        let node = &spec.nodes[group.node_index];

        let source = {
            let Some(first) = group.instances.first() else {
                continue;
            };
            let path = instances[*first].exec.path.clone();
            resolve_source(&group.name, &path, node, sysimages, store)?
        };

        for &index in &group.instances {
            let instance = &mut instances[index];
            instance.exec.source = source.clone();
            for device in &mut instance.devices {
                if !device.access.is_writable() {
                    continue;
                }
                let declared = node
                    .devices
                    .iter()
                    .find(|spec_device| spec_device.name.as_deref() == Some(device.name.as_str()))
                    .and_then(|spec_device| spec_device.content_type.as_deref());
                device.content = ContentMode::from_content_type(declared);
            }
        }
    }

    Ok(())
}

fn resolve_source(
    node_name: &str,
    exec_path: &str,
    node: &NodeSpec,
    sysimages: &SysimageConfig,
    store: &dyn ObjectStore,
) -> Result<ExecSource, CompileError> {
    if exec_path.starts_with('/') || StoragePath::is_storage_url(exec_path) {
        return Ok(ExecSource::Direct);
    }

    // Image device wildcards are forbidden, so the archive path is the
    // same for every instance of the group.
    let image_path = node
        .devices
        .iter()
        .find(|device| device.name.as_deref() == Some("image"))
        .and_then(|device| device.path.as_deref());

    if let Some(archive) = image_path {
        if probe(node_name, "image", archive, exec_path, store)? {
            debug!(node = %node_name, archive = %archive, "executable found in image device");
            return Ok(ExecSource::Image(archive.to_string()));
        }
    }

    for (name, archive) in sysimages.iter() {
        if probe(node_name, name, archive, exec_path, store)? {
            debug!(node = %node_name, sysimage = %name, "executable found in system image");
            return Ok(ExecSource::SystemImage(name.to_string()));
        }
    }

    Err(CompileError::ExecResolution {
        node: node_name.to_string(),
        path: exec_path.to_string(),
    })
}

fn probe(
    node: &str,
    device: &str,
    archive: &str,
    member: &str,
    store: &dyn ObjectStore,
) -> Result<bool, CompileError> {
    store
        .archive_contains(archive, member)
        .map_err(|err| CompileError::Storage {
            node: node.to_string(),
            device: device.to_string(),
            detail: err.to_string(),
        })
}

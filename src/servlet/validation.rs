//! Structural validation of a servlet configuration.
//!
//! The validator walks every node and accumulates all errors before the
//! compile aborts, so the caller gets a complete picture in one pass. The
//! stages after validation are fail-fast.

use std::collections::HashSet;

use crate::devices::{validate_debug_url, DeviceKind, PathPolicy, SysimageConfig};
use crate::error::CompileError;
use crate::storage::StoragePath;

use super::types::{DeviceSpec, NodeSpec, ServletSpec};

/// Validate a whole servlet configuration against the device rule table.
/// Returns every structural error found; an empty vector means the spec
/// may proceed to wildcard resolution.
pub fn validate(spec: &ServletSpec, sysimages: &SysimageConfig) -> Vec<CompileError> {
    let mut errors = Vec::new();
    let mut seen_names: HashSet<&str> = HashSet::new();

    for (index, node) in spec.nodes.iter().enumerate() {
        let label = node.label(index);

        match node.name.as_deref() {
            None => errors.push(CompileError::Schema {
                node: label.clone(),
                detail: "missing 'name'".to_string(),
            }),
            Some(name) if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) => {
                errors.push(CompileError::Schema {
                    node: label.clone(),
                    detail: format!("node name '{name}' must be alphanumeric"),
                });
            }
            Some(name) => {
                if !seen_names.insert(name) {
                    errors.push(CompileError::Name {
                        node: name.to_string(),
                        detail: format!("duplicate node name '{name}'"),
                    });
                }
            }
        }

        validate_exec(node, &label, &mut errors);
        validate_counts(node, &label, &mut errors);
        validate_devices(node, &label, sysimages, &mut errors);
        validate_attach(node, &label, &mut errors);
    }

    errors
}

fn validate_exec(node: &NodeSpec, label: &str, errors: &mut Vec<CompileError>) {
    let Some(exec) = &node.exec else {
        errors.push(CompileError::Schema {
            node: label.to_string(),
            detail: "missing 'exec'".to_string(),
        });
        return;
    };

    match exec.path.as_deref() {
        None => errors.push(CompileError::Schema {
            node: label.to_string(),
            detail: "missing 'exec.path'".to_string(),
        }),
        Some(path) if path.is_empty() => errors.push(CompileError::Schema {
            node: label.to_string(),
            detail: "'exec.path' is empty".to_string(),
        }),
        Some(path) => {
            // Absolute, storage-backed, or schemeless-relative. A relative
            // path is resolved against image devices later.
            let well_formed = path.starts_with('/')
                || StoragePath::parse(path).is_some()
                || !path.contains("://");
            if !well_formed {
                errors.push(CompileError::Schema {
                    node: label.to_string(),
                    detail: format!("'exec.path' has an unsupported scheme: '{path}'"),
                });
            }
        }
    }

    for key in exec.env.keys() {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric()) {
            errors.push(CompileError::Schema {
                node: label.to_string(),
                detail: format!("env key '{key}' must be alphanumeric"),
            });
        }
    }
}

fn validate_counts(node: &NodeSpec, label: &str, errors: &mut Vec<CompileError>) {
    if node.count == Some(0) {
        errors.push(CompileError::Schema {
            node: label.to_string(),
            detail: "'count' must be a positive integer".to_string(),
        });
    }

    if let Some(replicate) = node.replicate {
        if !(1..=3).contains(&replicate) {
            errors.push(CompileError::Replication {
                node: label.to_string(),
                value: replicate,
            });
        }
    }
}

fn validate_devices(
    node: &NodeSpec,
    label: &str,
    sysimages: &SysimageConfig,
    errors: &mut Vec<CompileError>,
) {
    let mut seen_devices: HashSet<&str> = HashSet::new();
    let mut payload_devices = 0usize;
    let mut pathless_writable = 0usize;

    for (index, device) in node.devices.iter().enumerate() {
        let Some(name) = device.name.as_deref() else {
            errors.push(CompileError::Schema {
                node: label.to_string(),
                detail: format!("device #{} is missing 'name'", index + 1),
            });
            continue;
        };

        if !seen_devices.insert(name) {
            errors.push(CompileError::Name {
                node: label.to_string(),
                detail: format!("duplicate device name '{name}'"),
            });
        }

        let Some(kind) = DeviceKind::classify(name, sysimages) else {
            errors.push(CompileError::Name {
                node: label.to_string(),
                detail: format!("unknown device name '{name}'"),
            });
            continue;
        };
        let rule = kind.rule();

        match device.path.as_deref() {
            Some(path) => {
                validate_device_path(&kind, device, path, label, name, errors);
            }
            None => {
                match rule.path {
                    PathPolicy::Required => errors.push(CompileError::Path {
                        node: label.to_string(),
                        device: name.to_string(),
                        detail: "missing required path".to_string(),
                    }),
                    PathPolicy::RequiredOrPayload => {
                        // Pathless stdin/input/script reads the request
                        // payload; a node gets at most one of those.
                        payload_devices += 1;
                        if payload_devices > 1 {
                            errors.push(CompileError::Path {
                                node: label.to_string(),
                                device: name.to_string(),
                                detail: "only one payload device allowed per node".to_string(),
                            });
                        }
                    }
                    PathPolicy::Optional | PathPolicy::Forbidden => {}
                }

                if rule.access.is_writable() {
                    pathless_writable += 1;
                    if pathless_writable > 1 {
                        errors.push(CompileError::Path {
                            node: label.to_string(),
                            device: name.to_string(),
                            detail: "only one writable device may omit its path".to_string(),
                        });
                    }
                }
            }
        }
    }
}

fn validate_device_path(
    kind: &DeviceKind,
    device: &DeviceSpec,
    path: &str,
    label: &str,
    name: &str,
    errors: &mut Vec<CompileError>,
) {
    let rule = kind.rule();

    if rule.path == PathPolicy::Forbidden {
        errors.push(CompileError::Path {
            node: label.to_string(),
            device: name.to_string(),
            detail: "path not allowed for a system-image device".to_string(),
        });
        return;
    }

    if *kind == DeviceKind::Debug {
        if let Err(detail) = validate_debug_url(path) {
            errors.push(CompileError::Path {
                node: label.to_string(),
                device: name.to_string(),
                detail,
            });
        }
        return;
    }

    if device.is_wildcard() {
        if !rule.wildcard_allowed {
            errors.push(CompileError::Path {
                node: label.to_string(),
                device: name.to_string(),
                detail: "wildcard not allowed in this device's path".to_string(),
            });
        } else if StoragePath::parse(path).is_none() {
            // Listing queries need an account and container to run against.
            errors.push(CompileError::Path {
                node: label.to_string(),
                device: name.to_string(),
                detail: format!("wildcarded path must be a storage object reference: '{path}'"),
            });
        }
        return;
    }

    if !path.starts_with('/') && StoragePath::parse(path).is_none() {
        errors.push(CompileError::Path {
            node: label.to_string(),
            device: name.to_string(),
            detail: format!("device path must be a storage URL or absolute path: '{path}'"),
        });
    }
}

fn validate_attach(node: &NodeSpec, label: &str, errors: &mut Vec<CompileError>) {
    let target = node.attach_target();
    if target == "default" {
        return;
    }
    let named = node
        .devices
        .iter()
        .any(|device| device.name.as_deref() == Some(target));
    if !named {
        errors.push(CompileError::Attach {
            node: label.to_string(),
            target: target.to_string(),
        });
    }
}

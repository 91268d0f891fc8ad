//! Connection graph construction over expanded instances.
//!
//! Logical `connect` lists are declared between nodes; the concrete graph
//! is the full bipartite fan-out between their instance groups. Names are
//! resolved in a first pass so forward references work without any
//! mutable registry; edges are arena index pairs, which keeps cycles and
//! self-connections cheap to represent.

use std::collections::HashMap;

use tracing::debug;

use crate::error::CompileError;
use crate::plan::Edge;
use crate::servlet::ServletSpec;

use super::expand::GroupExpansion;

/// Build every concrete edge. Duplicate logical declarations produce
/// duplicate edges by design; deduplication would mask a caller error.
pub(crate) fn build(
    spec: &ServletSpec,
    groups: &[GroupExpansion],
) -> Result<Vec<Edge>, CompileError> {
    let by_name: HashMap<&str, usize> = groups
        .iter()
        .enumerate()
        .map(|(index, group)| (group.name.as_str(), index))
        .collect();

    let mut edges = Vec::new();

    for group in groups {
        let node = &spec.nodes[group.node_index];
        for target in &node.connect {
            let Some(&target_index) = by_name.get(target.as_str()) else {
                return Err(CompileError::Connection {
                    node: group.name.clone(),
                    target: target.clone(),
                });
            };
            let destination = &groups[target_index];
            for &from in &group.instances {
                for &to in &destination.instances {
                    // A self-connected node wires its distinct instances,
                    // never an instance to itself.
                    if from != to {
                        edges.push(Edge { from, to });
                    }
                }
            }
        }
    }

    // Replicas of the same ordinal exchange state over implicit edges.
    for group in groups {
        if group.replicate < 2 {
            continue;
        }
        for ordinal in 0..group.count {
            let base = ordinal * group.replicate;
            for first in 0..group.replicate {
                for second in 0..group.replicate {
                    if first != second {
                        edges.push(Edge {
                            from: group.instances[base + first],
                            to: group.instances[base + second],
                        });
                    }
                }
            }
        }
    }

    debug!(edges = edges.len(), "connection graph built");
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{expand, wildcard};
    use crate::devices::SysimageConfig;
    use crate::storage::MemoryStore;

    fn edges_for(json: &str) -> (Vec<Edge>, Vec<GroupExpansion>) {
        let spec = ServletSpec::from_json(json).expect("spec parses");
        let sysimages = SysimageConfig::new();
        let store = MemoryStore::new();
        let resolved = wildcard::resolve(&spec, &sysimages, &store).expect("wildcards resolve");
        let (_, groups) = expand::expand(&spec, &resolved, &sysimages).expect("expansion");
        let edges = build(&spec, &groups).expect("graph builds");
        (edges, groups)
    }

    #[test]
    fn test_cartesian_fan_out() {
        let (edges, _) = edges_for(
            r#"[{"name": "a", "exec": {"path": "/x"}, "count": 3, "connect": ["b"]},
                {"name": "b", "exec": {"path": "/x"}, "count": 2}]"#,
        );
        assert_eq!(edges.len(), 6);
    }

    #[test]
    fn test_forward_reference_resolves() {
        let (edges, _) = edges_for(
            r#"[{"name": "first", "exec": {"path": "/x"}, "connect": ["second"]},
                {"name": "second", "exec": {"path": "/x"}}]"#,
        );
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0], Edge { from: 0, to: 1 });
    }

    #[test]
    fn test_self_connection_skips_same_instance() {
        let (edges, _) = edges_for(
            r#"[{"name": "mesh", "exec": {"path": "/x"}, "count": 3, "connect": ["mesh"]}]"#,
        );
        // 3 instances, ordered pairs minus self-pairs.
        assert_eq!(edges.len(), 6);
        assert!(edges.iter().all(|edge| edge.from != edge.to));
    }

    #[test]
    fn test_self_connection_single_instance_yields_nothing() {
        let (edges, _) = edges_for(
            r#"[{"name": "solo", "exec": {"path": "/x"}, "connect": ["solo"]}]"#,
        );
        assert!(edges.is_empty());
    }

    #[test]
    fn test_unknown_target_is_connection_error() {
        let spec = ServletSpec::from_json(
            r#"[{"name": "a", "exec": {"path": "/x"}, "connect": ["ghost"]}]"#,
        )
        .expect("spec parses");
        let sysimages = SysimageConfig::new();
        let store = MemoryStore::new();
        let resolved = wildcard::resolve(&spec, &sysimages, &store).expect("wildcards resolve");
        let (_, groups) = expand::expand(&spec, &resolved, &sysimages).expect("expansion");
        let err = build(&spec, &groups).unwrap_err();
        assert!(matches!(err, CompileError::Connection { .. }));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_duplicate_logical_edges_kept() {
        let (edges, _) = edges_for(
            r#"[{"name": "a", "exec": {"path": "/x"}, "connect": ["b", "b"]},
                {"name": "b", "exec": {"path": "/x"}}]"#,
        );
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0], edges[1]);
    }

    #[test]
    fn test_replicas_cross_wired() {
        let (edges, groups) = edges_for(
            r#"[{"name": "dup", "exec": {"path": "/x"}, "replicate": 3}]"#,
        );
        assert_eq!(groups[0].instances.len(), 3);
        // Ordered pairs among 3 replicas of the single ordinal.
        assert_eq!(edges.len(), 6);
    }

    #[test]
    fn test_replica_wiring_stays_within_ordinal() {
        let (edges, groups) = edges_for(
            r#"[{"name": "dup", "exec": {"path": "/x"}, "count": 2, "replicate": 2}]"#,
        );
        // Each ordinal pair is wired both ways; no cross-ordinal edges.
        assert_eq!(edges.len(), 4);
        let first_pair = &groups[0].instances[0..2];
        for edge in &edges[0..2] {
            assert!(first_pair.contains(&edge.from));
            assert!(first_pair.contains(&edge.to));
        }
    }
}

//! Wildcard resolution against the object-store listing API.
//!
//! Every readable device path carrying `*` turns into one listing query.
//! Queries are independent and run on a bounded pool of worker threads;
//! the per-node reconciliation below is the barrier that joins them. Any
//! query failure aborts the compile — retry policy belongs to the storage
//! collaborator, not here.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use regex::Regex;
use tracing::debug;

use crate::devices::{DeviceKind, SysimageConfig};
use crate::error::CompileError;
use crate::servlet::{DeviceSpec, NodeSpec, ServletSpec};
use crate::storage::{ObjectStore, StoragePath};

/// Upper bound on concurrent listing queries per compile.
const MAX_LISTING_THREADS: usize = 8;

/// Wildcard resolution result for one node.
#[derive(Debug, Default)]
pub(crate) struct NodeWildcards {
    /// Expansion count driven by listings; `None` when the node has no
    /// wildcarded readable devices.
    pub count: Option<usize>,
    /// Device index → matched object URLs, one per expansion ordinal.
    pub matches: HashMap<usize, Vec<String>>,
    /// Per-ordinal wildcard captures from the node's first readable
    /// wildcarded device; writable wildcards substitute from these.
    pub captures: Vec<Vec<String>>,
}

struct Query {
    node_index: usize,
    device_index: usize,
    node: String,
    device: String,
    path: StoragePath,
    pattern: Regex,
    prefix: String,
}

struct MatchSet {
    urls: Vec<String>,
    captures: Vec<Vec<String>>,
}

/// Resolve every wildcarded readable device in the spec and reconcile
/// counts per node.
pub(crate) fn resolve(
    spec: &ServletSpec,
    sysimages: &SysimageConfig,
    store: &dyn ObjectStore,
) -> Result<Vec<NodeWildcards>, CompileError> {
    let queries = collect_queries(spec, sysimages)?;
    let outcomes = run_queries(&queries, store);

    // Fail fast on the first storage error, in query order.
    let mut match_sets: Vec<MatchSet> = Vec::with_capacity(queries.len());
    for outcome in outcomes {
        match_sets.push(outcome?);
    }

    for (query, set) in queries.iter().zip(&match_sets) {
        debug!(
            node = %query.node,
            device = %query.device,
            matches = set.urls.len(),
            "wildcard resolved"
        );
    }

    let mut results: Vec<NodeWildcards> = Vec::with_capacity(spec.nodes.len());
    for (node_index, node) in spec.nodes.iter().enumerate() {
        let label = node.label(node_index);
        let node_queries: Vec<(&Query, &MatchSet)> = queries
            .iter()
            .zip(&match_sets)
            .filter(|(query, _)| query.node_index == node_index)
            .collect();
        results.push(reconcile(node, &label, &node_queries, sysimages)?);
    }

    Ok(results)
}

/// Gather one listing query per readable wildcarded device.
fn collect_queries(
    spec: &ServletSpec,
    sysimages: &SysimageConfig,
) -> Result<Vec<Query>, CompileError> {
    let mut queries = Vec::new();

    for (node_index, node) in spec.nodes.iter().enumerate() {
        let label = node.label(node_index);
        for (device_index, device) in node.devices.iter().enumerate() {
            if !device.is_wildcard() {
                continue;
            }
            let (Some(name), Some(path)) = (device.name.as_deref(), device.path.as_deref())
            else {
                continue;
            };
            let Some(kind) = DeviceKind::classify(name, sysimages) else {
                continue;
            };
            if !kind.rule().access.is_readable() {
                continue;
            }

            let storage_path = StoragePath::parse(path).ok_or_else(|| CompileError::Path {
                node: label.clone(),
                device: name.to_string(),
                detail: format!("wildcarded path is not a storage reference: '{path}'"),
            })?;
            queries.push(Query {
                node_index,
                device_index,
                node: label.clone(),
                device: name.to_string(),
                pattern: wildcard_pattern(&storage_path.object),
                prefix: literal_prefix(&storage_path.object),
                path: storage_path,
            });
        }
    }

    Ok(queries)
}

/// Each `*` matches any character sequence, case-sensitive, anchored over
/// the whole object name.
fn wildcard_pattern(object: &str) -> Regex {
    let mut pattern = String::from("^");
    for (index, part) in object.split('*').enumerate() {
        if index > 0 {
            pattern.push_str("(.*)");
        }
        pattern.push_str(&regex::escape(part));
    }
    pattern.push('$');
    Regex::new(&pattern).expect("escaped pattern is always valid")
}

fn literal_prefix(object: &str) -> String {
    object.split('*').next().unwrap_or("").to_string()
}

/// Run all queries with bounded parallelism; results come back in query
/// order.
fn run_queries(queries: &[Query], store: &dyn ObjectStore) -> Vec<Result<MatchSet, CompileError>> {
    if queries.is_empty() {
        return Vec::new();
    }

    let next = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel();
    let workers = queries.len().min(MAX_LISTING_THREADS);

    thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let next = &next;
            scope.spawn(move || loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                if index >= queries.len() {
                    break;
                }
                let outcome = run_query(&queries[index], store);
                if tx.send((index, outcome)).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        let mut outcomes: Vec<Option<Result<MatchSet, CompileError>>> =
            queries.iter().map(|_| None).collect();
        for (index, outcome) in rx {
            outcomes[index] = Some(outcome);
        }
        outcomes
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Err(CompileError::Storage {
                        node: String::new(),
                        device: String::new(),
                        detail: "listing worker exited without a result".to_string(),
                    })
                })
            })
            .collect()
    })
}

fn run_query(query: &Query, store: &dyn ObjectStore) -> Result<MatchSet, CompileError> {
    let names = store
        .list_prefix(&query.path.account, &query.path.container, &query.prefix)
        .map_err(|err| CompileError::Storage {
            node: query.node.clone(),
            device: query.device.clone(),
            detail: err.to_string(),
        })?;

    let mut urls = Vec::new();
    let mut captures = Vec::new();
    for name in &names {
        if let Some(groups) = query.pattern.captures(name) {
            urls.push(format!(
                "swift://{}/{}/{}",
                query.path.account, query.path.container, name
            ));
            captures.push(
                groups
                    .iter()
                    .skip(1)
                    .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect(),
            );
        }
    }
    Ok(MatchSet { urls, captures })
}

/// Join barrier for one node: all readable wildcarded devices must agree
/// on the expansion count, and writable wildcards must have a capture
/// source to draw from.
fn reconcile(
    node: &NodeSpec,
    label: &str,
    node_queries: &[(&Query, &MatchSet)],
    sysimages: &SysimageConfig,
) -> Result<NodeWildcards, CompileError> {
    let queried: HashSet<usize> = node_queries
        .iter()
        .map(|(query, _)| query.device_index)
        .collect();
    let writable_wildcards: Vec<(usize, &DeviceSpec)> = node
        .devices
        .iter()
        .enumerate()
        .filter(|(index, device)| device.is_wildcard() && !queried.contains(index))
        .collect();

    if node_queries.is_empty() {
        if let Some((_, device)) = writable_wildcards.first() {
            return Err(CompileError::WildcardMismatch {
                node: label.to_string(),
                detail: format!(
                    "writable device '{}' carries a wildcard but no readable device does",
                    device.name.as_deref().unwrap_or("?")
                ),
            });
        }
        return Ok(NodeWildcards::default());
    }

    let (first_query, first_set) = &node_queries[0];
    let count = first_set.urls.len();
    for (query, set) in &node_queries[1..] {
        if set.urls.len() != count {
            return Err(CompileError::WildcardMismatch {
                node: label.to_string(),
                detail: format!(
                    "device '{}' matched {} object(s) but device '{}' matched {}",
                    first_query.device,
                    count,
                    query.device,
                    set.urls.len()
                ),
            });
        }
    }
    if count == 0 {
        return Err(CompileError::WildcardMismatch {
            node: label.to_string(),
            detail: format!("device '{}' matched no objects", first_query.device),
        });
    }

    let captures_per_match = first_set.captures.first().map_or(0, Vec::len);
    for (_, device) in &writable_wildcards {
        let stars = device
            .path
            .as_deref()
            .map_or(0, |path| path.matches('*').count());
        if stars > captures_per_match {
            return Err(CompileError::WildcardMismatch {
                node: label.to_string(),
                detail: format!(
                    "device '{}' has {} wildcard(s) but the readable source captures only {}",
                    device.name.as_deref().unwrap_or("?"),
                    stars,
                    captures_per_match
                ),
            });
        }
    }

    // A concrete storage-backed writable path on an expanded node would
    // make every instance write the same object.
    if count > 1 {
        for (index, device) in node.devices.iter().enumerate() {
            let Some(path) = device.path.as_deref() else {
                continue;
            };
            if device.is_wildcard()
                || queried.contains(&index)
                || !StoragePath::is_storage_url(path)
            {
                continue;
            }
            if is_plain_writable(device, sysimages) {
                return Err(CompileError::WildcardMismatch {
                    node: label.to_string(),
                    detail: format!(
                        "writable device '{}' must carry a wildcard on a wildcard-expanded node",
                        device.name.as_deref().unwrap_or("?")
                    ),
                });
            }
        }
    }

    let mut result = NodeWildcards {
        count: Some(count),
        matches: HashMap::new(),
        captures: first_set.captures.clone(),
    };
    for (query, set) in node_queries {
        result.matches.insert(query.device_index, set.urls.clone());
    }
    Ok(result)
}

/// Writable, non-network device classification. Runs after validation, so
/// an unknown name can only be one validation already rejected.
fn is_plain_writable(device: &DeviceSpec, sysimages: &SysimageConfig) -> bool {
    device
        .name
        .as_deref()
        .and_then(|name| DeviceKind::classify(name, sysimages))
        .is_some_and(|kind| {
            let access = kind.rule().access;
            access.is_writable() && !access.is_network()
        })
}

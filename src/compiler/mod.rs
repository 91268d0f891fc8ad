//! The servlet configuration compiler pipeline.
//!
//! Stages run in dependency order: schema validation (error-accumulating),
//! wildcard resolution against the object store, node expansion,
//! connection graph construction, placement, then executable and content
//! resolution. Validation reports everything it finds; every stage after
//! it aborts on the first error. Compilation mutates nothing external, so
//! an aborted or cancelled compile needs no rollback, and concurrent
//! compiles of independent specs share no mutable state.

mod exec;
mod expand;
mod graph;
mod placement;
mod wildcard;


use tracing::{debug, info};

use crate::devices::SysimageConfig;
use crate::error::CompileReport;
use crate::plan::{ExecutionPlan, NodeGroup};
use crate::servlet::{validate, ServletSpec};
use crate::storage::ObjectStore;

/// Compiles servlet configurations into execution plans.
pub struct Compiler<'a> {
    sysimages: SysimageConfig,
    store: &'a dyn ObjectStore,
}

impl<'a> Compiler<'a> {
    /// The system-image allow-list is injected here once per compiler;
    /// the device rule table and executable resolver both read it.
    pub fn new(sysimages: SysimageConfig, store: &'a dyn ObjectStore) -> Self {
        Self { sysimages, store }
    }

    /// Compile one servlet configuration into an immutable execution
    /// plan, or a report of everything wrong with it.
    pub fn compile(&self, spec: &ServletSpec) -> Result<ExecutionPlan, CompileReport> {
        let errors = validate(spec, &self.sysimages);
        if !errors.is_empty() {
            debug!(errors = errors.len(), "schema validation failed");
            return Err(CompileReport::new(errors));
        }

        let resolved = wildcard::resolve(spec, &self.sysimages, self.store)?;
        let (mut instances, groups) = expand::expand(spec, &resolved, &self.sysimages)?;
        let edges = graph::build(spec, &groups)?;
        placement::assign(spec, &groups, &mut instances);
        exec::resolve(spec, &groups, &self.sysimages, self.store, &mut instances)?;

        info!(
            nodes = spec.nodes.len(),
            instances = instances.len(),
            edges = edges.len(),
            "servlet configuration compiled"
        );

        Ok(ExecutionPlan {
            instances,
            edges,
            groups: groups
                .into_iter()
                .map(|group| NodeGroup {
                    node: group.name,
                    instances: group.instances,
                })
                .collect(),
        })
    }
}

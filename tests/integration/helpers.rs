//! Shared helpers for integration tests.

use lattice::compiler::Compiler;
use lattice::devices::SysimageConfig;
use lattice::error::CompileReport;
use lattice::plan::ExecutionPlan;
use lattice::servlet::ServletSpec;
use lattice::storage::MemoryStore;

/// Compile a JSON spec against the given store with no system images.
pub fn compile(json: &str, store: &MemoryStore) -> Result<ExecutionPlan, CompileReport> {
    compile_with(json, SysimageConfig::new(), store)
}

pub fn compile_with(
    json: &str,
    sysimages: SysimageConfig,
    store: &MemoryStore,
) -> Result<ExecutionPlan, CompileReport> {
    let spec = ServletSpec::from_json(json).expect("spec parses");
    Compiler::new(sysimages, store).compile(&spec)
}

/// Store holding `count` mapper input chunks under acct/data.
pub fn chunk_store(count: usize) -> MemoryStore {
    let mut store = MemoryStore::new();
    for index in 0..count {
        store.add_object("acct", "data", &format!("chunk_{index:02}"));
    }
    store
}

//! Compile flow behavior: error reporting, aliases, plan output, and the
//! directory-backed store.

use std::fs;

use lattice::compiler::Compiler;
use lattice::devices::SysimageConfig;
use lattice::error::CompileError;
use lattice::servlet::ServletSpec;
use lattice::storage::{DirStore, MemoryStore};

use super::helpers::compile;

#[test]
fn test_all_schema_errors_reported_in_one_pass() {
    let store = MemoryStore::new();
    let report = compile(
        r#"[{"name": "one"},
            {"name": "one", "exec": {"path": "/x"}},
            {"name": "three", "exec": {"path": "/x"},
             "devices": [{"name": "debug", "path": "not-a-url"},
                         {"name": "image"}]},
            {"name": "four", "exec": {"path": "/x"}, "attach": "ghost"}]"#,
        &store,
    )
    .unwrap_err();

    // missing exec, duplicate name, bad debug URL, missing image path,
    // bad attach target - all in one report.
    assert_eq!(report.len(), 5);
    let kinds: Vec<_> = report
        .errors()
        .iter()
        .map(|error| match error {
            CompileError::Schema { .. } => "schema",
            CompileError::Name { .. } => "name",
            CompileError::Path { .. } => "path",
            CompileError::Attach { .. } => "attach",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["schema", "name", "path", "path", "attach"]);
}

#[test]
fn test_deprecated_aliases_compile() {
    let mut store = MemoryStore::new();
    store.add_object("acct", "data", "in_1");
    let plan = compile(
        r#"[{"name": "legacy", "exec": {"path": "/bin/app"},
             "file_list": [{"device": "stdin", "path": "swift://acct/data/in_*"}]}]"#,
        &store,
    )
    .unwrap();
    assert_eq!(plan.instances.len(), 1);
    assert_eq!(plan.instances[0].devices[0].name, "stdin");
}

#[test]
fn test_plan_json_is_consumable() {
    let store = MemoryStore::new();
    let plan = compile(
        r#"[{"name": "a", "exec": {"path": "/x"}, "count": 2, "connect": ["a"],
             "devices": [{"name": "stdout", "path": "swift://acct/c/out*"},
                         {"name": "stdin", "path": "swift://acct/c/in"}]}]"#,
        &store,
    );
    // stdout wildcard has no readable wildcard source.
    assert!(plan.is_err());

    let plan = compile(
        r#"[{"name": "a", "exec": {"path": "/x"}, "count": 2, "connect": ["a"]}]"#,
        &store,
    )
    .unwrap();
    let json = plan.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["instances"].as_array().unwrap().len(), 2);
    assert_eq!(value["edges"].as_array().unwrap().len(), 2);
    assert_eq!(value["groups"][0]["node"], "a");
}

#[test]
fn test_compile_against_directory_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = dir.path().join("acct/data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("part_aa.bin"), b"x").unwrap();
    fs::write(data.join("part_bb.bin"), b"x").unwrap();
    let sysimage = dir.path().join("images/python");
    fs::create_dir_all(sysimage.join("bin")).unwrap();
    fs::write(sysimage.join("bin/worker"), b"x").unwrap();

    let store = DirStore::new(dir.path());
    let sysimages =
        SysimageConfig::from_pairs([("python", sysimage.to_string_lossy().to_string())]);
    let spec = ServletSpec::from_json(
        r#"[{"name": "job", "exec": {"path": "bin/worker"},
             "devices": [{"name": "stdin", "path": "swift://acct/data/part_*.bin"},
                         {"name": "stdout", "path": "swift://acct/data/done_*.bin"}]}]"#,
    )
    .expect("spec parses");

    let plan = Compiler::new(sysimages, &store).compile(&spec).unwrap();
    assert_eq!(plan.instances.len(), 2);
    assert_eq!(
        plan.instances[0].devices[1].path.as_deref(),
        Some("swift://acct/data/done_aa.bin")
    );
    assert_eq!(
        plan.instances[1].devices[1].path.as_deref(),
        Some("swift://acct/data/done_bb.bin")
    );
}

#[test]
fn test_cancelled_compile_leaves_nothing_behind() {
    // Dropping the result of a failed or abandoned compile is the whole
    // cancellation story: nothing external was mutated.
    let store = MemoryStore::new();
    let result = compile(
        r#"[{"name": "job", "exec": {"path": "/bin/app"},
             "devices": [{"name": "stdin", "path": "swift://acct/data/none_*"}]}]"#,
        &store,
    );
    drop(result);

    let plan = compile(r#"[{"name": "job", "exec": {"path": "/bin/app"}}]"#, &store).unwrap();
    assert_eq!(plan.instances.len(), 1);
}

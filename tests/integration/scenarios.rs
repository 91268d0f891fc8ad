//! End-to-end scenarios over realistic job shapes.

use lattice::devices::SysimageConfig;
use lattice::error::CompileError;
use lattice::plan::{ExecSource, PlacementTarget};
use lattice::storage::MemoryStore;

use super::helpers::{chunk_store, compile, compile_with};

#[test]
fn test_sort_job_with_paired_wildcards() {
    let mut store = MemoryStore::new();
    store.add_object("acct", "data", "binary_log_345.data");
    store.add_object("acct", "data", "binary_log_678.data");

    let plan = compile(
        r#"[{"name": "sort",
             "exec": {"path": "swift://acct/exec/sort.nexe", "args": "1048576"},
             "devices": [{"name": "stdin", "path": "swift://acct/data/binary*.data"},
                         {"name": "stdout", "path": "swift://acct/data/sorted*.data"},
                         {"name": "stderr"}]}]"#,
        &store,
    )
    .unwrap();

    assert_eq!(plan.instances.len(), 2);
    assert_eq!(plan.instances[0].name, "sort-1");
    assert_eq!(plan.instances[1].name, "sort-2");

    for (instance, suffix) in plan.instances.iter().zip(["_log_345", "_log_678"]) {
        assert_eq!(
            instance.devices[0].path.as_deref(),
            Some(format!("swift://acct/data/binary{suffix}.data").as_str())
        );
        assert_eq!(
            instance.devices[1].path.as_deref(),
            Some(format!("swift://acct/data/sorted{suffix}.data").as_str())
        );
        assert!(instance.devices[2].path.is_none());
        assert_eq!(instance.exec.args.as_deref(), Some("1048576"));
    }

    // Default attach points each instance at its own input object.
    assert_eq!(
        plan.instances[0].placement.target,
        PlacementTarget::Near("swift://acct/data/binary_log_345.data".to_string())
    );
}

#[test]
fn test_map_reduce_topology() {
    let store = chunk_store(10);
    let plan = compile(
        r#"[{"name": "mapper", "exec": {"path": "/bin/map"},
             "devices": [{"name": "stdin", "path": "swift://acct/data/chunk_*"}],
             "connect": ["mapper", "reducer"]},
            {"name": "reducer", "exec": {"path": "/bin/reduce"}, "count": 5,
             "connect": ["manager"]},
            {"name": "manager", "exec": {"path": "/bin/manage"}}]"#,
        &store,
    )
    .unwrap();

    assert_eq!(plan.instances.len(), 16);
    let mappers = plan.instances_of("mapper");
    let mapper_originated = plan
        .edges
        .iter()
        .filter(|edge| mappers.contains(&edge.from))
        .count();
    assert_eq!(mapper_originated, 140);

    let reducers = plan.instances_of("reducer");
    let managers = plan.instances_of("manager");
    let reducer_to_manager = plan
        .edges
        .iter()
        .filter(|edge| reducers.contains(&edge.from) && managers.contains(&edge.to))
        .count();
    assert_eq!(reducer_to_manager, 5);

    // The mapper mesh is cyclic by construction; edges are directed and
    // never join an instance to itself.
    assert!(plan.edges.iter().all(|edge| edge.from != edge.to));
}

#[test]
fn test_wildcard_count_mismatch_fails_compile() {
    let mut store = chunk_store(3);
    store.add_object("acct", "out", "ready_1");

    let report = compile(
        r#"[{"name": "job", "exec": {"path": "/bin/app"},
             "devices": [{"name": "stdin", "path": "swift://acct/data/chunk_*"},
                         {"name": "input", "path": "swift://acct/out/ready_*"}]}]"#,
        &store,
    )
    .unwrap_err();

    assert_eq!(report.len(), 1);
    assert!(matches!(
        report.errors()[0],
        CompileError::WildcardMismatch { .. }
    ));
}

#[test]
fn test_exec_resolution_walks_sysimages_in_order() {
    let mut store = MemoryStore::new();
    store.add_archive_member("/sys/third.tar", "usr/bin/tool");
    let sysimages = SysimageConfig::from_pairs([
        ("base", "/sys/first.tar"),
        ("extras", "/sys/second.tar"),
        ("tools", "/sys/third.tar"),
    ]);

    let plan = compile_with(
        r#"[{"name": "job", "exec": {"path": "usr/bin/tool"}}]"#,
        sysimages,
        &store,
    )
    .unwrap();
    assert_eq!(
        plan.instances[0].exec.source,
        ExecSource::SystemImage("tools".to_string())
    );
}

#[test]
fn test_exec_resolution_failure_is_fatal() {
    let store = MemoryStore::new();
    let sysimages = SysimageConfig::from_pairs([("base", "/sys/first.tar")]);
    let report = compile_with(
        r#"[{"name": "job", "exec": {"path": "usr/bin/tool"}}]"#,
        sysimages,
        &store,
    )
    .unwrap_err();
    assert!(matches!(
        report.errors()[0],
        CompileError::ExecResolution { .. }
    ));
}

#[test]
fn test_replicated_pipeline() {
    let store = chunk_store(2);
    let plan = compile(
        r#"[{"name": "stage", "exec": {"path": "/bin/app"}, "replicate": 2,
             "devices": [{"name": "stdin", "path": "swift://acct/data/chunk_*"}],
             "connect": ["sink"]},
            {"name": "sink", "exec": {"path": "/bin/sink"}}]"#,
        &store,
    )
    .unwrap();

    // 2 matches x 2 replicas + 1 sink.
    assert_eq!(plan.instances.len(), 5);
    let stage = plan.instances_of("stage");
    assert_eq!(stage.len(), 4);

    // Replicas of the same ordinal read the same object.
    let by_index = |i: usize| &plan.instances[stage[i]];
    assert_eq!(by_index(0).devices[0].path, by_index(1).devices[0].path);
    assert_ne!(by_index(0).devices[0].path, by_index(2).devices[0].path);

    // 4 stage->sink edges plus 2x2 implicit replica pairs.
    assert_eq!(plan.edges.len(), 8);

    let names: Vec<_> = stage
        .iter()
        .map(|&index| plan.instances[index].name.as_str())
        .collect();
    assert_eq!(names, vec!["stage-1.1", "stage-1.2", "stage-2.1", "stage-2.2"]);
}

#[test]
fn test_cgi_job_content_tagging() {
    let mut store = MemoryStore::new();
    store.add_archive_member("swift://acct/app/site.tar", "cgi/handler");

    let plan = compile(
        r#"[{"name": "web", "exec": {"path": "cgi/handler"},
             "devices": [{"name": "image", "path": "swift://acct/app/site.tar"},
                         {"name": "stdout", "content_type": "message/cgi"},
                         {"name": "stdin"}]}]"#,
        &store,
    )
    .unwrap();

    let instance = &plan.instances[0];
    assert_eq!(
        instance.exec.source,
        ExecSource::Image("swift://acct/app/site.tar".to_string())
    );
    let stdout = instance
        .devices
        .iter()
        .find(|device| device.name == "stdout")
        .unwrap();
    assert!(stdout.content.is_message());
}

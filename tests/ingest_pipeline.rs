use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;
use ttfx_ingest::DatasetBuilder;
use ttfx_ingest::ingest::store::{FsLogStore, GitLogStore};
use ttfx_ingest::model::Stage;

const PRECOMPILE_LOG: &str = "\
Precompiling project...
  12 dependencies successfully precompiled in 38 seconds
 37.914211 seconds (9.91 M allocations: 612.1 MiB, 1.52% gc time, 96.41% compilation time)
";

const TASK_LOG: &str = "\
Loading package
0.512, 1.234, 1.746 seconds
";

const TIME_V: &str = "\
\tCommand being timed: \"julia --startup-file=no task.jl\"
\tPercent of CPU this job got: 101%
\tMaximum resident set size (kbytes): 498112
\tExit status: 0
";

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn write_run(root: &Path, stem: &str) {
    write(root, &format!("{stem}.precompile"), PRECOMPILE_LOG);
    write(root, &format!("{stem}.task"), TASK_LOG);
    write(root, &format!("{stem}.precompile.rusage"), TIME_V);
    write(root, &format!("{stem}.task.rusage"), TIME_V);
}

#[test]
fn complete_run_is_fully_populated() {
    let dir = TempDir::new().unwrap();
    write_run(dir.path(), "snippets/Plots/plot/abc1234_2023-05-01_1.9.0_hostA");

    let store = FsLogStore::new(dir.path());
    let (dataset, report) = DatasetBuilder::new(&store).build().unwrap();
    assert_eq!(report.discovered, 1);
    assert_eq!(report.accepted, 1);
    assert_eq!(report.skipped, 0);

    let record = &dataset.records()[0];
    assert_eq!(record.identity.hash, "abc1234");
    assert_eq!(record.identity.date.to_string(), "2023-05-01");
    assert_eq!(record.identity.julia_version, "1.9.0");
    assert_eq!(record.identity.hostname, "hostA");
    assert_eq!(record.package_name, "Plots");
    assert_eq!(record.task_name, "plot");
    assert_eq!(record.precompile_time, 37.914211);
    assert_eq!(record.loading_time, 0.512);
    assert_eq!(record.task_time, 1.234);
    assert_eq!(record.precompile_cpu, Some(101.0));
    assert_eq!(record.task_cpu, Some(101.0));
    assert_eq!(record.precompile_resident, Some(498112));
    assert_eq!(record.task_resident, Some(498112));
}

#[test]
fn unreadable_resource_logs_leave_fields_absent() {
    let dir = TempDir::new().unwrap();
    let stem = "snippets/CSV/read/abc1234_2023-05-01_1.9.0_hostA";
    write(dir.path(), &format!("{stem}.precompile"), PRECOMPILE_LOG);
    write(dir.path(), &format!("{stem}.task"), TASK_LOG);
    // A directory where the file should be cannot be read as text.
    fs::create_dir_all(dir.path().join(format!("{stem}.precompile.rusage"))).unwrap();

    let store = FsLogStore::new(dir.path());
    let (dataset, report) = DatasetBuilder::new(&store).build().unwrap();
    assert_eq!(report.accepted, 1);

    let record = &dataset.records()[0];
    assert_eq!(record.precompile_cpu, None);
    assert_eq!(record.task_cpu, None);
    assert_eq!(record.precompile_resident, None);
    assert_eq!(record.task_resident, None);
    assert_eq!(record.package_name, "CSV");
    assert_eq!(record.precompile_time, 37.914211);
    assert_eq!(record.loading_time, 0.512);
    assert_eq!(record.task_time, 1.234);
}

#[test]
fn rejected_runs_are_audited_by_stage() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_run(root, "snippets/A/t/aaa_2023-05-01_1.9.0_box");
    // No task file at all.
    write(root, "snippets/A/t/bbb_2023-05-02_1.9.0_box.precompile", PRECOMPILE_LOG);
    // Task output without a timing line.
    write(root, "snippets/A/t/ccc_2023-05-03_1.9.0_box.precompile", PRECOMPILE_LOG);
    write(root, "snippets/A/t/ccc_2023-05-03_1.9.0_box.task", "crashed\n");
    // Companions without a primary are never discovered.
    write(root, "snippets/A/t/ddd_2023-05-04_1.9.0_box.task", TASK_LOG);

    let store = FsLogStore::new(root);
    let (dataset, report) = DatasetBuilder::new(&store).build().unwrap();
    assert_eq!(report.discovered, 3);
    assert_eq!(report.accepted, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.accepted + report.skipped, report.discovered);
    assert_eq!(dataset.len(), 1);

    let stages: Vec<_> = report.skipped_runs.iter().map(|run| run.stage).collect();
    assert_eq!(stages, vec![Stage::TaskRead, Stage::TaskTiming]);
    assert_eq!(
        report.skipped_runs[0].path,
        "snippets/A/t/bbb_2023-05-02_1.9.0_box.task"
    );
    assert!(report.skipped_runs[1].reason.contains("seconds"));
}

#[test]
fn dataset_keeps_discovery_order() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_run(root, "snippets/B/t/zzz_2023-05-01_1.9.0_box");
    write_run(root, "snippets/A/t/yyy_2023-05-02_1.9.0_box");
    write_run(root, "snippets/A/t/xxx_2023-05-03_1.9.0_box");

    let store = FsLogStore::new(root);
    let (dataset, _) = DatasetBuilder::new(&store).build().unwrap();
    let hashes: Vec<_> = dataset.iter().map(|r| r.identity.hash.as_str()).collect();
    assert_eq!(hashes, vec!["xxx", "yyy", "zzz"]);
}

fn git(root: &Path, args: &[&str]) -> bool {
    Command::new("git")
        .arg("-C")
        .arg(root)
        .args(args)
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

#[test]
fn git_store_reads_committed_revision() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    if !git(root, &["init", "-q"]) {
        eprintln!("git unavailable, skipping");
        return;
    }
    write_run(root, "snippets/Plots/plot/abc1234_2023-05-01_1.9.0_hostA");
    assert!(git(root, &["add", "."]));
    assert!(git(
        root,
        &[
            "-c",
            "user.name=bench",
            "-c",
            "user.email=bench@localhost",
            "commit",
            "-q",
            "-m",
            "logs",
        ]
    ));
    // Uncommitted runs are invisible at HEAD.
    write_run(root, "snippets/Plots/plot/def5678_2023-05-02_1.9.0_hostA");

    let store = GitLogStore::new(root, "HEAD");
    let (dataset, report) = DatasetBuilder::new(&store).build().unwrap();
    assert_eq!(report.discovered, 1);
    assert_eq!(dataset.records()[0].identity.hash, "abc1234");
    assert_eq!(dataset.records()[0].task_resident, Some(498112));
}

#[test]
fn git_store_rooted_at_subdirectory() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    if !git(root, &["init", "-q"]) {
        eprintln!("git unavailable, skipping");
        return;
    }
    write_run(root, "logs/snippets/Plots/plot/abc1234_2023-05-01_1.9.0_hostA");
    write(root, "README", "benchmark logs\n");
    assert!(git(root, &["add", "."]));
    assert!(git(
        root,
        &[
            "-c",
            "user.name=bench",
            "-c",
            "user.email=bench@localhost",
            "commit",
            "-q",
            "-m",
            "logs",
        ]
    ));

    let store = GitLogStore::new(root.join("logs"), "HEAD");
    let (dataset, report) = DatasetBuilder::new(&store).build().unwrap();
    assert_eq!(report.discovered, 1);
    assert_eq!(report.accepted, 1, "skipped: {:?}", report.skipped_runs);
    let record = &dataset.records()[0];
    assert_eq!(record.package_name, "Plots");
    assert_eq!(record.precompile_time, 37.914211);
    assert_eq!(record.task_resident, Some(498112));
}

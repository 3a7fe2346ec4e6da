//! End-to-end scenarios driven through the actual `vosim` binary:
//! process file in, report files out. Covers §8's worked scenarios and
//! the CLI-level failure modes from the ambient-coverage goals in §8.

use std::fs;
use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn vosim() -> Command {
    Command::cargo_bin("vosim").expect("vosim binary must build")
}

fn process_file(dir: &std::path::Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("processes.txt");
    let mut file = fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn s1_single_job_hpf_produces_expected_perf() {
    let dir = tempfile::tempdir().unwrap();
    let file = process_file(dir.path(), "1\t0\t5\t1\t64\n");

    vosim()
        .current_dir(dir.path())
        .args(["-s", "hpf", "-f"])
        .arg(&file)
        .assert()
        .success();

    let perf = fs::read_to_string(dir.path().join("scheduler.perf")).unwrap();
    assert_eq!(
        perf,
        "CPU utilization = 100%\nAvg WTA = 1.00\nAvg Waiting = 0.00\nStd WTA = 0.00\n"
    );

    let scheduler_log = fs::read_to_string(dir.path().join("scheduler.log")).unwrap();
    assert!(scheduler_log.lines().next().unwrap().starts_with('#'));
    assert!(scheduler_log.contains("process 1 finished"));

    let memory_log = fs::read_to_string(dir.path().join("memory.log")).unwrap();
    assert!(memory_log.contains("allocated 64 bytes for process 1 from 0 to 63"));
    assert!(memory_log.contains("freed"));
}

#[test]
fn s3_round_robin_quantum_two() {
    let dir = tempfile::tempdir().unwrap();
    let file = process_file(dir.path(), "1\t0\t4\t1\t64\n2\t0\t4\t1\t64\n");

    vosim()
        .current_dir(dir.path())
        .args(["-s", "rr", "-q", "2", "-f"])
        .arg(&file)
        .assert()
        .success();

    let perf = fs::read_to_string(dir.path().join("scheduler.perf")).unwrap();
    assert!(perf.contains("CPU utilization = 100%"));
}

#[test]
fn missing_policy_flag_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = process_file(dir.path(), "1\t0\t5\t1\t64\n");

    vosim()
        .current_dir(dir.path())
        .args(["-f"])
        .arg(&file)
        .assert()
        .failure()
        .code(2);

    assert!(!dir.path().join("scheduler.log").exists());
}

#[test]
fn rr_without_quantum_exits_with_input_error_code() {
    let dir = tempfile::tempdir().unwrap();
    let file = process_file(dir.path(), "1\t0\t5\t1\t64\n");

    vosim()
        .current_dir(dir.path())
        .args(["-s", "rr", "-f"])
        .arg(&file)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("quantum"));

    assert!(!dir.path().join("scheduler.log").exists());
}

#[test]
fn quantum_with_hpf_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let file = process_file(dir.path(), "1\t0\t5\t1\t64\n");

    vosim()
        .current_dir(dir.path())
        .args(["-s", "hpf", "-q", "2", "-f"])
        .arg(&file)
        .assert()
        .failure()
        .code(1);
}

#[test]
fn memory_bound_third_job_is_deferred_not_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let file = process_file(
        dir.path(),
        "1\t0\t2\t1\t512\n2\t0\t2\t1\t512\n3\t0\t2\t1\t512\n",
    );

    vosim()
        .current_dir(dir.path())
        .args(["-s", "hpf", "-f"])
        .arg(&file)
        .assert()
        .success();

    let scheduler_log = fs::read_to_string(dir.path().join("scheduler.log")).unwrap();
    assert!(scheduler_log.contains("process 3 finished"));
}

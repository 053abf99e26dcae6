use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const GOOD_DTA: &str =
    "EXPLAIN\nTAG\tPWRGEIS\nZCURVE\tTABLE\nFreq\tZreal\tZimag\tExtra\n1000\t50\t-10\t0\n2000\t48\t-9\t0\n";
const BAD_CELL_DTA: &str = "EXPLAIN\nZCURVE\tTABLE\nFreq\tZreal\tZimag\n1000\toops\t-10\n";

fn write_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn drtprep() -> Command {
    Command::cargo_bin("drtprep").unwrap()
}

#[test]
fn converts_a_tree_and_writes_all_artifacts() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    write_file(&root.join("cellA/PWRGEIS_500mA_A.dta"), GOOD_DTA);
    write_file(&root.join("cellA/PWRGEIS_500mA_A_Raw.dta"), "raw dump\n");

    drtprep()
        .arg(root)
        .args(["--output-format", "plain", "--quiet"])
        .assert()
        .success();

    let output = root.join("DRT_PWRGEIS_500mA");
    let csv = fs::read_to_string(output.join("PWRGEIS_500mA_cellA.csv")).unwrap();
    assert_eq!(csv, "1000,50,-10\n2000,48,-9\n");

    let log = fs::read_to_string(output.join("conversion_log.txt")).unwrap();
    assert!(log.contains("converted: PWRGEIS_500mA_cellA.dta -> PWRGEIS_500mA_cellA.csv"));
    assert!(log.contains("converted: 1"));

    assert!(output.join("hash_registry.json").exists());
}

#[test]
fn second_run_skips_unchanged_inputs() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    write_file(&root.join("cellA/PWRGEIS_500mA_A.dta"), GOOD_DTA);

    drtprep().arg(root).arg("--quiet").assert().success();
    drtprep().arg(root).arg("--quiet").assert().success();

    let log =
        fs::read_to_string(root.join("DRT_PWRGEIS_500mA/conversion_log.txt")).unwrap();
    assert!(log.contains("skipped duplicate: PWRGEIS_500mA_cellA.dta"));
    assert!(log.contains("converted: 0"));
}

#[test]
fn per_file_failure_yields_warning_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    write_file(&root.join("bad/PWRGEIS_500mA_A.dta"), BAD_CELL_DTA);
    write_file(&root.join("good/PWRGEIS_500mA_A.dta"), GOOD_DTA);

    drtprep()
        .arg(root)
        .arg("--quiet")
        .assert()
        .code(2);

    let output = root.join("DRT_PWRGEIS_500mA");
    assert!(output.join("PWRGEIS_500mA_good.csv").exists());
    assert!(!output.join("PWRGEIS_500mA_bad.csv").exists());
}

#[test]
fn corrupt_registry_aborts_with_dedicated_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    write_file(&root.join("cellA/PWRGEIS_500mA_A.dta"), GOOD_DTA);
    let output = root.join("DRT_PWRGEIS_500mA");
    fs::create_dir_all(&output).unwrap();
    fs::write(output.join("hash_registry.json"), "{ truncated").unwrap();

    drtprep()
        .arg(root)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("unreadable"));
}

#[test]
fn dry_run_lists_candidates_without_converting() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    write_file(&root.join("cellA/PWRGEIS_500mA_A.dta"), GOOD_DTA);

    drtprep()
        .arg(root)
        .args(["--dry-run", "--output-format", "plain", "-v"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DRY RUN MODE"))
        .stdout(predicate::str::contains("would stage:"));

    assert!(!root.join("DRT_PWRGEIS_500mA").exists());
}

#[test]
fn generate_config_writes_sample_toml() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("drtprep.toml");

    drtprep()
        .arg(".")
        .args(["--generate-config", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated sample configuration"));

    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[discovery]"));
    assert!(content.contains("[pipeline]"));
}

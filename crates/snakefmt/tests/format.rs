//! Black-box round-trip tests driving `snakefmt::run` directly (no
//! `assert_cmd` subprocess), mirroring `crates/ruff/tests/format.rs`'s style
//! of exercising the CLI glue as a library.

use std::fs;
use std::path::PathBuf;

use snakefmt::args::Cli;
use snakefmt::ExitStatus;

fn cli(files: Vec<PathBuf>) -> Cli {
    Cli {
        files,
        line_length: None,
        include: None,
        exclude: None,
        check: false,
        diff: false,
        verbose: false,
        config: None,
        no_script_format: true,
    }
}

#[test]
fn formats_a_directory_of_workflow_files_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Snakefile");
    fs::write(&file, "rule a:\n\tinput: \"a\"\n\toutput: \"b\"\n").unwrap();

    let status = snakefmt::run(cli(vec![dir.path().to_path_buf()])).unwrap();
    assert!(matches!(status, ExitStatus::Success));

    let contents = fs::read_to_string(&file).unwrap();
    assert!(contents.starts_with("rule a:\n    input:\n"));
}

#[test]
fn check_mode_reports_would_reformat_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Snakefile");
    fs::write(&file, "rule a:\n\tinput: \"a\"\n").unwrap();
    let original = fs::read_to_string(&file).unwrap();

    let mut args = cli(vec![dir.path().to_path_buf()]);
    args.check = true;
    let status = snakefmt::run(args).unwrap();

    assert!(matches!(status, ExitStatus::WouldReformat));
    assert_eq!(fs::read_to_string(&file).unwrap(), original);
}

#[test]
fn already_canonical_directory_reports_success() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Snakefile");
    fs::write(&file, "rule a:\n    input:\n        \"a\",\n").unwrap();

    let mut args = cli(vec![dir.path().to_path_buf()]);
    args.check = true;
    let status = snakefmt::run(args).unwrap();
    assert!(matches!(status, ExitStatus::Success));
}

#[test]
fn syntax_error_is_reported_as_process_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("Snakefile");
    fs::write(&file, "rule a\n").unwrap();

    let status = snakefmt::run(cli(vec![dir.path().to_path_buf()])).unwrap();
    assert!(matches!(status, ExitStatus::Error));
}

#[test]
fn no_paths_given_is_a_success_no_op() {
    let status = snakefmt::run(cli(vec![])).unwrap();
    assert!(matches!(status, ExitStatus::Success));
}

//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A `memo` command isolated in `dir`: its own database, no config files.
fn memo(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("memo").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("MEMO_DATABASE", dir.path().join("memo.db"))
        .env_remove("MEMO_QUESTIONS_PER_TEST")
        .env_remove("RUST_LOG");
    cmd
}

fn add_pair(dir: &TempDir, first: &str, second: &str) {
    memo(dir)
        .args(["add-pair", "--first", first, "--second", second])
        .assert()
        .success();
}

const REPLY: &str = "Test ID: 1\n\
                     \n\
                     polski → español:\n  wąż = serpiente\n\
                     \n\
                     español → polski:\n  serpiente = żmija\n";

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();

    memo(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created memo.toml"));

    assert!(dir.path().join("memo.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    memo(&dir).arg("init").assert().success();

    memo(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn add_pair_then_list() {
    let dir = TempDir::new().unwrap();

    memo(&dir)
        .args([
            "add-pair",
            "--first",
            "polski:wąż",
            "--second",
            "español:serpiente",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added pair 1"));

    memo(&dir)
        .arg("pairs")
        .assert()
        .success()
        .stdout(predicate::str::contains("wąż"))
        .stdout(predicate::str::contains("serpiente"))
        .stdout(predicate::str::contains("español"));
}

#[test]
fn swapped_pair_is_rejected() {
    let dir = TempDir::new().unwrap();
    add_pair(&dir, "polski:wąż", "español:serpiente");

    memo(&dir)
        .args([
            "add-pair",
            "--first",
            "español:serpiente",
            "--second",
            "polski:wąż",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("duplicate pair"));
}

#[test]
fn add_pair_needs_language_prefix() {
    let dir = TempDir::new().unwrap();

    memo(&dir)
        .args(["add-pair", "--first", "wąż", "--second", "español:serpiente"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("language:phrase"));
}

#[test]
fn add_pair_rejects_phrase_with_equals() {
    let dir = TempDir::new().unwrap();

    memo(&dir)
        .args(["add-pair", "--first", "polski:a = b", "--second", "español:c"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid phrase").and(predicate::str::contains("`=`")));

    memo(&dir)
        .arg("pairs")
        .assert()
        .success()
        .stdout(predicate::str::contains("No pairs yet"));
}

#[test]
fn prepare_without_pairs_fails() {
    let dir = TempDir::new().unwrap();

    memo(&dir)
        .arg("prepare")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no pairs"));
}

#[test]
fn prepare_prints_both_directions() {
    let dir = TempDir::new().unwrap();
    add_pair(&dir, "polski:wąż", "español:serpiente");

    memo(&dir)
        .arg("prepare")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Test ID: 1\n"))
        .stdout(predicate::str::contains("polski → español:\n  wąż = \n"))
        .stdout(predicate::str::contains("español → polski:\n  serpiente = \n"));
}

#[test]
fn prepare_respects_question_limit() {
    let dir = TempDir::new().unwrap();
    add_pair(&dir, "polski:wąż", "español:serpiente");
    add_pair(&dir, "polski:cebula", "español:cebolla");

    memo(&dir)
        .args(["prepare", "--questions", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  wąż = \n"))
        .stdout(predicate::str::contains("cebula").not());
}

#[test]
fn prepare_to_file_then_show() {
    let dir = TempDir::new().unwrap();
    add_pair(&dir, "polski:wąż", "español:serpiente");

    memo(&dir)
        .args(["prepare", "--output", "tests/first.txt"])
        .assert()
        .success()
        .stderr(predicate::str::contains("written to"));

    let written = std::fs::read_to_string(dir.path().join("tests/first.txt")).unwrap();
    assert!(written.starts_with("Test ID: 1\n"));

    memo(&dir)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::diff(written));
}

#[test]
fn show_without_tests_fails() {
    let dir = TempDir::new().unwrap();

    memo(&dir)
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no tests yet"));
}

#[test]
fn grade_reply_from_stdin() {
    let dir = TempDir::new().unwrap();
    add_pair(&dir, "polski:wąż", "español:serpiente");
    memo(&dir).arg("prepare").assert().success();

    memo(&dir)
        .arg("grade")
        .write_stdin(REPLY)
        .assert()
        .success()
        .stdout(predicate::str::contains("Test 1: 1/2 correct (50%)"))
        .stdout(predicate::str::contains(
            "  serpiente = żmija (expected: wąż)",
        ));

    // The miss moves the inverted question to the top.
    memo(&dir)
        .arg("ranking")
        .assert()
        .success()
        .stdout(predicate::str::contains("serpiente (español) → wąż (polski)"))
        .stdout(predicate::str::contains("2/1"));
}

#[test]
fn grade_json_and_report_file() {
    let dir = TempDir::new().unwrap();
    add_pair(&dir, "polski:wąż", "español:serpiente");
    memo(&dir).arg("prepare").assert().success();
    std::fs::write(dir.path().join("reply.txt"), REPLY).unwrap();

    memo(&dir)
        .args([
            "grade",
            "--input",
            "reply.txt",
            "--format",
            "json",
            "--report",
            "out/report.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"correct\": 1"))
        .stdout(predicate::str::contains("\"incorrect\": 1"));

    let saved = std::fs::read_to_string(dir.path().join("out/report.json")).unwrap();
    assert!(saved.contains("\"test_id\": 1"));
}

#[test]
fn graded_question_cannot_be_graded_again() {
    let dir = TempDir::new().unwrap();
    add_pair(&dir, "polski:wąż", "español:serpiente");
    memo(&dir).arg("prepare").assert().success();
    memo(&dir).arg("grade").write_stdin(REPLY).assert().success();

    memo(&dir)
        .arg("grade")
        .write_stdin(REPLY)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no open question"));
}

#[test]
fn unknown_prompt_leaves_test_open() {
    let dir = TempDir::new().unwrap();
    add_pair(&dir, "polski:wąż", "español:serpiente");
    memo(&dir).arg("prepare").assert().success();

    memo(&dir)
        .arg("grade")
        .write_stdin("polski → español:\n  wąż = serpiente\n  pies = perro\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 3"));

    // Nothing was recorded, so the full reply still grades.
    memo(&dir)
        .arg("grade")
        .write_stdin(REPLY)
        .assert()
        .success()
        .stdout(predicate::str::contains("1/2 correct"));
}

#[test]
fn explicit_test_must_match_reply() {
    let dir = TempDir::new().unwrap();
    add_pair(&dir, "polski:wąż", "español:serpiente");
    memo(&dir).arg("prepare").assert().success();
    memo(&dir).arg("prepare").assert().success();

    memo(&dir)
        .args(["grade", "--test", "2"])
        .write_stdin(REPLY)
        .assert()
        .failure()
        .stderr(predicate::str::contains("reply is for test 1, expected test 2"));
}

#[test]
fn unknown_format_is_rejected() {
    let dir = TempDir::new().unwrap();

    memo(&dir)
        .args(["grade", "--format", "xml"])
        .write_stdin(REPLY)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn database_flag_overrides_environment() {
    let dir = TempDir::new().unwrap();

    memo(&dir)
        .args(["--database", "other.db"])
        .args(["add-pair", "--first", "polski:kot", "--second", "español:gato"])
        .assert()
        .success();

    assert!(dir.path().join("other.db").exists());
    memo(&dir)
        .arg("pairs")
        .assert()
        .success()
        .stdout(predicate::str::contains("No pairs yet"));
}

#[test]
fn config_file_sets_question_limit() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("memo.toml"), "questions_per_test = 1\n").unwrap();
    add_pair(&dir, "polski:wąż", "español:serpiente");

    memo(&dir)
        .arg("prepare")
        .assert()
        .success()
        .stdout(predicate::str::contains("español → polski").not());
}

#[test]
fn missing_config_file_fails() {
    let dir = TempDir::new().unwrap();

    memo(&dir)
        .args(["--config", "nope.toml", "pairs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn help_output() {
    let dir = TempDir::new().unwrap();
    memo(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Vocabulary tutor"));
}

#[test]
fn version_output() {
    let dir = TempDir::new().unwrap();
    memo(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("memo"));
}

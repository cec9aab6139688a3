//! `.env` reconciliation properties and settings resolution against real files.

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use ragstrap_core::{
    env_file::{lookup, reconcile},
    settings::SETTINGS_FILE,
    EnvEdit, ModelName, Settings, MODEL_ENV_KEY,
};
use rstest::rstest;

// ---------------------------------------------------------------------------
// 1. Idempotence on the key's value
// ---------------------------------------------------------------------------

#[rstest]
#[case::plain("OLLAMA_MODEL=x\n")]
#[case::with_comments("# app settings\nOLLAMA_MODEL=x\n# LANGSMITH_API_KEY=\n")]
#[case::no_trailing_newline("A=1\nOLLAMA_MODEL=x")]
#[case::crlf("A=1\r\nOLLAMA_MODEL=x\r\n")]
fn same_model_twice_is_byte_identical(#[case] input: &str) {
    let model = ModelName::from("x");
    let (once, edit) = reconcile(Some(input), &model).expect("first");
    assert_eq!(edit, EnvEdit::Unchanged);
    assert_eq!(once, input);

    let (twice, edit) = reconcile(Some(&once), &model).expect("second");
    assert_eq!(edit, EnvEdit::Unchanged);
    assert_eq!(twice.as_bytes(), input.as_bytes());
}

#[test]
fn created_then_reconciled_again_is_stable() {
    let model = ModelName::default();
    let (created, edit) = reconcile(None, &model).expect("create");
    assert_eq!(edit, EnvEdit::Created);
    let (again, edit) = reconcile(Some(&created), &model).expect("again");
    assert_eq!(edit, EnvEdit::Unchanged);
    assert_eq!(again, created);
}

#[test]
fn appended_then_reconciled_again_is_stable() {
    let model = ModelName::from("qwen2.5:7b");
    let (appended, edit) = reconcile(Some("KEEP=me\n"), &model).expect("append");
    assert_eq!(edit, EnvEdit::Appended);
    let (again, edit) = reconcile(Some(&appended), &model).expect("again");
    assert_eq!(edit, EnvEdit::Unchanged);
    assert_eq!(again, appended);
}

// ---------------------------------------------------------------------------
// 2. Changing the model touches exactly one line
// ---------------------------------------------------------------------------

#[test]
fn different_model_changes_only_the_key_line() {
    let input = "# top\nLANGSMITH_PROJECT=demo\nOLLAMA_MODEL=x\n\nOTHER=1\n";
    let (out, edit) = reconcile(Some(input), &ModelName::from("y")).expect("reconcile");
    assert_eq!(edit, EnvEdit::Updated);

    let before: Vec<&str> = input.lines().collect();
    let after: Vec<&str> = out.lines().collect();
    assert_eq!(before.len(), after.len());

    let changed: Vec<usize> = before
        .iter()
        .zip(&after)
        .enumerate()
        .filter(|(_, (b, a))| b != a)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(changed, vec![2]);
    assert_eq!(after[2], "OLLAMA_MODEL=y");
    assert_eq!(lookup(&out, MODEL_ENV_KEY), Some("y"));
}

// ---------------------------------------------------------------------------
// 3. Settings on disk
// ---------------------------------------------------------------------------

#[test]
fn local_settings_file_is_picked_up() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child(SETTINGS_FILE)
        .write_str("entry_file: main.py\ndaemon_startup_delay_secs: 1\n")
        .expect("write");

    let settings = Settings::resolve(dir.path(), None).expect("resolve");
    assert_eq!(settings.entry_file, std::path::PathBuf::from("main.py"));
    assert_eq!(settings.daemon_startup_delay_secs, 1);
    assert_eq!(settings.manifest_file, std::path::PathBuf::from("requirements.txt"));

    // Resolution is read-only.
    dir.child(".env").assert(predicate::path::missing());
}

#[test]
fn explicit_settings_beat_local_file() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child(SETTINGS_FILE).write_str("venv_dir: local\n").expect("write");
    let explicit = dir.child("other.yaml");
    explicit.write_str("venv_dir: explicit\n").expect("write");

    let settings = Settings::resolve(dir.path(), Some(explicit.path())).expect("resolve");
    assert_eq!(settings.venv_dir, std::path::PathBuf::from("explicit"));
}

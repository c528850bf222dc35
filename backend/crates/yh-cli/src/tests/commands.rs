use crate::tests::settings_in;
use crate::{CliError, commands, render};

use yh_config::ConfigResolver;
use yh_supervisor::{LockFileCoordinator, LockRecord};

use googletest::assert_that;
use googletest::prelude::{eq, err, pat};
use serde_json::json;
use tempfile::TempDir;

fn seed(settings_lock: &std::path::Path, record: &LockRecord) {
    std::fs::write(settings_lock, serde_json::to_vec(record).unwrap()).unwrap();
}

// =========================================================================
// status
// =========================================================================

#[test]
fn given_no_lock_file_when_status_then_not_live() {
    let temp = TempDir::new().unwrap();

    let settings = settings_in(temp.path());

    let value = commands::status(&settings).unwrap();

    assert_eq!(value["record"], json!(null));
    assert_eq!(value["live"], json!(false));
    assert_eq!(value["pid_alive"], json!(null));
    assert_eq!(
        value["server_log"],
        json!(settings.lock_file.with_extension("log"))
    );
}

#[test]
fn given_live_record_when_status_then_reports_count_and_pid() {
    let temp = TempDir::new().unwrap();
    let settings = settings_in(temp.path());
    seed(
        &settings.lock_file,
        &LockRecord {
            running: true,
            count: 2,
            pid: Some(std::process::id()),
            spawning_since: None,
            updated_at: None,
        },
    );

    let value = commands::status(&settings).unwrap();

    assert_eq!(value["record"]["count"], json!(2));
    assert_eq!(value["live"], json!(true));
    assert_eq!(value["stale"], json!(false));
    assert_eq!(value["pid_alive"], json!(true));
}

// =========================================================================
// expand
// =========================================================================

#[test]
fn given_config_when_expand_then_reports_command_and_unresolved() {
    // Given
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config.json");
    std::fs::write(
        &config,
        json!({
            "mainURL": "https://site.test",
            "siteFiles": ".",
            "startTrigger": "serve --port [port] --key [key]",
        })
        .to_string(),
    )
    .unwrap();

    // When
    let value = commands::expand(&ConfigResolver::new(vec![config])).unwrap();

    // Then
    assert_eq!(value["command"], json!("serve --port 443 --key [key]"));
    assert_eq!(value["unresolved"], json!(["[key]"]));
    assert_eq!(value["source_directory_exists"], json!(true));
}

#[test]
fn given_no_config_when_expand_then_config_error() {
    let temp = TempDir::new().unwrap();

    let result = commands::expand(&ConfigResolver::new(vec![temp.path().join("none.json")]));

    assert_that!(result, err(pat!(CliError::Config { .. })));
}

// =========================================================================
// reset
// =========================================================================

#[test]
fn given_stale_record_when_reset_then_cleared_and_previous_returned() {
    let temp = TempDir::new().unwrap();
    let settings = settings_in(temp.path());
    seed(
        &settings.lock_file,
        &LockRecord {
            running: false,
            count: 3,
            pid: None,
            spawning_since: None,
            updated_at: None,
        },
    );

    let value = commands::reset(&settings, false).unwrap();

    assert_eq!(value["previous"]["count"], json!(3));
    let record = LockFileCoordinator::new(&settings.lock_file)
        .read()
        .unwrap()
        .unwrap();
    assert_that!(record.count, eq(0_u32));
    assert!(!record.running);
}

#[test]
fn given_live_record_when_reset_without_force_then_refused() {
    let temp = TempDir::new().unwrap();
    let settings = settings_in(temp.path());
    seed(
        &settings.lock_file,
        &LockRecord {
            running: true,
            count: 1,
            pid: Some(std::process::id()),
            spawning_since: None,
            updated_at: None,
        },
    );

    let result = commands::reset(&settings, false);

    assert_that!(result, err(pat!(CliError::Refused { .. })));
    let record = LockFileCoordinator::new(&settings.lock_file)
        .read()
        .unwrap()
        .unwrap();
    assert_that!(record.count, eq(1_u32));
}

#[test]
fn given_live_record_when_reset_with_force_then_cleared() {
    let temp = TempDir::new().unwrap();
    let settings = settings_in(temp.path());
    seed(
        &settings.lock_file,
        &LockRecord {
            running: true,
            count: 1,
            pid: Some(std::process::id()),
            spawning_since: None,
            updated_at: None,
        },
    );

    commands::reset(&settings, true).unwrap();

    assert!(!LockFileCoordinator::new(&settings.lock_file).is_running());
}

// =========================================================================
// Output
// =========================================================================

#[test]
fn given_pretty_when_render_then_multiline() {
    let value = json!({ "count": 1 });

    assert_that!(render(&value, false).unwrap(), eq(r#"{"count":1}"#));
    assert!(render(&value, true).unwrap().contains('\n'));
}

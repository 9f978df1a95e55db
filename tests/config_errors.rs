// tests/config_errors.rs

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;

use dagexec::config::{load_and_validate, load_from_str, parse_duration, ExecutionBehaviour, RunWhen};
use dagexec::errors::DagexecError;
use dagexec_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_dag_cycle_returns_structured_error() {
    let file = config_file(
        r#"
[task.A]
cmd = "echo A"
after = ["B"]

[task.B]
cmd = "echo B"
after = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagexecError::DagCycle { from, to }) => {
            let mut pair = [from, to];
            pair.sort();
            assert_eq!(pair, ["A".to_string(), "B".to_string()]);
        }
        Err(e) => panic!("Expected DagCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_dependency_returns_unknown_task() {
    let file = config_file(
        r#"
[task.A]
cmd = "echo A"
after = ["NonExistent"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagexecError::UnknownTask(msg)) => {
            assert!(msg.contains("unknown dependency"));
            assert!(msg.contains("NonExistent"));
        }
        Err(e) => panic!("Expected UnknownTask, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_bad_duration_names_the_field() {
    let file = config_file(
        r#"
[task.A]
cmd = "echo A"
timeout = "10 parsecs"
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagexecError::ConfigError(msg)) => {
            assert!(msg.contains("[task.A].timeout"), "message: {msg}");
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_retry_behaviour_without_retry_count_is_rejected() {
    let result = ConfigFileBuilder::new()
        .with_behaviour(ExecutionBehaviour::ImmediateRetryTerminating, 0)
        .with_task("A", TaskConfigBuilder::new("echo A").build())
        .try_build();

    assert!(matches!(result, Err(DagexecError::ConfigError(_))));
}

#[test]
fn test_retry_count_without_retry_behaviour_is_accepted() {
    let cfg = ConfigFileBuilder::new()
        .with_behaviour(ExecutionBehaviour::Terminating, 2)
        .with_task("A", TaskConfigBuilder::new("echo A").build())
        .try_build()
        .unwrap();

    let execution = cfg.execution_config();
    assert_eq!(execution.behaviour, ExecutionBehaviour::Terminating);
    assert!(execution.validate().is_ok());
}

#[test]
fn test_zero_workers_is_rejected() {
    let result = ConfigFileBuilder::new()
        .with_workers(0)
        .with_task("A", TaskConfigBuilder::new("echo A").build())
        .try_build();

    assert!(matches!(result, Err(DagexecError::ConfigError(_))));
}

#[test]
fn test_empty_config_is_rejected() {
    assert!(matches!(
        ConfigFileBuilder::new().try_build(),
        Err(DagexecError::ConfigError(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("Dagexec.toml"));
    assert!(matches!(result, Err(DagexecError::IoError(_))));
}

#[test]
fn test_malformed_toml_is_toml_error() {
    assert!(matches!(
        load_from_str("[task.A\ncmd = "),
        Err(DagexecError::TomlError(_))
    ));
}

#[test]
fn test_unknown_behaviour_is_toml_error() {
    let raw = load_from_str(
        r#"
[config]
behaviour = "sometimes"

[task.A]
cmd = "echo A"
"#,
    );
    assert!(matches!(raw, Err(DagexecError::TomlError(_))));
}

#[test]
fn test_full_config_parses_with_defaults() {
    let file = config_file(
        r#"
[config]
behaviour = "scheduled-retry"
retry_count = 2
retry_delay = "250ms"
workers = 3

[task.fetch]
cmd = "echo fetch"

[task.build]
cmd = "echo build"
after = ["fetch", "build"]
timeout = "1m"
run_when = "all-parents-succeeded"

[task.docs]
cmd = "echo docs"
enabled = false
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let execution = cfg.execution_config();
    assert_eq!(execution.behaviour, ExecutionBehaviour::ScheduledRetryTerminating);
    assert_eq!(execution.retry_count, 2);
    assert_eq!(execution.retry_delay, Duration::from_millis(250));

    let options = cfg.engine_options();
    assert_eq!(options.workers, 3);
    assert_eq!(options.retry_workers, 2);

    assert_eq!(cfg.task_timeout("build"), Some(Duration::from_secs(60)));
    assert_eq!(cfg.task_timeout("fetch"), None);
    assert_eq!(cfg.task["build"].run_when, RunWhen::AllParentsSucceeded);
    assert_eq!(cfg.task["fetch"].run_when, RunWhen::AnyParentRan);
    assert!(!cfg.task["docs"].enabled);
}

#[test]
fn test_parse_duration_units() {
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration("3s"), Ok(Duration::from_secs(3)));
    assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
    assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    assert!(parse_duration("").is_err());
    assert!(parse_duration("10").is_err());
    assert!(parse_duration("5d").is_err());
}

#[test]
fn test_parse_duration_rejects_overflow() {
    let err = parse_duration("6000000000000000h").unwrap_err();
    assert!(err.contains("out of range"), "message: {err}");
    assert!(parse_duration("18446744073709551615ms").is_ok());
    assert!(parse_duration("18446744073709551615s").is_err());
}

#[test]
fn test_huge_retry_delay_is_config_error() {
    let file = config_file(
        r#"
[config]
behaviour = "scheduled-retry"
retry_count = 1
retry_delay = "99999999999999999m"

[task.A]
cmd = "echo A"
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagexecError::ConfigError(msg)) => {
            assert!(msg.contains("out of range"), "message: {msg}");
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_missing_config_section_defaults_to_terminating() {
    let raw = load_from_str("[task.A]\ncmd = \"echo A\"\n").unwrap();
    let cfg = dagexec::config::ConfigFile::try_from(raw).unwrap();
    assert_eq!(cfg.execution_config().behaviour, ExecutionBehaviour::Terminating);
    assert_eq!(ExecutionBehaviour::default(), ExecutionBehaviour::Terminating);
    assert_eq!(dagexec::Phase::default(), dagexec::Phase::Building);
}

#[test]
fn test_behaviour_from_str() {
    assert_eq!(
        "non-terminating".parse::<ExecutionBehaviour>(),
        Ok(ExecutionBehaviour::NonTerminating)
    );
    assert!("retry".parse::<ExecutionBehaviour>().is_err());
}

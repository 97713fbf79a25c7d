use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::NamedTempFile;
use pollwatch::config::{load_and_validate, load_or_default, ConfigFile};
use pollwatch::errors::WatchError;
use pollwatch::types::RestartPolicy;
use pollwatch_test_utils::builders::ConfigFileBuilder;
use pollwatch_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{contents}")?;
    Ok(file)
}

#[test]
fn full_config_round_trips_into_typed_settings() -> TestResult {
    init_tracing();

    let file = write_config(
        r#"
[watcher]
interval = "2s"
max_restarts = 5
restart_window = "1m"

[discovery]
patterns = ["**/*.md", "**/*.txt"]
exclude = ["target/**"]

[[project]]
path = "/srv/docs"
interval = "250ms"

[[project]]
path = "/srv/notes"
exclude = []
"#,
    )?;

    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg.defaults.interval, Duration::from_secs(2));
    assert_eq!(
        cfg.restart_policy,
        RestartPolicy {
            max_restarts: 5,
            window: Duration::from_secs(60)
        }
    );
    assert_eq!(cfg.patterns, vec!["**/*.md", "**/*.txt"]);

    let docs = cfg.options_for(&PathBuf::from("/srv/docs"));
    assert_eq!(docs.interval, Duration::from_millis(250));
    assert_eq!(docs.exclude, vec!["target/**"]);

    let notes = cfg.options_for(&PathBuf::from("/srv/notes"));
    assert_eq!(notes.interval, Duration::from_secs(2));
    assert!(notes.exclude.is_empty());

    // Paths without a [[project]] entry fall back to the defaults.
    assert_eq!(cfg.options_for(&PathBuf::from("/other")), cfg.defaults);

    Ok(())
}

#[test]
fn bad_duration_returns_config_error() -> TestResult {
    let file = write_config("[watcher]\ninterval = \"soon\"\n")?;

    match load_and_validate(file.path()) {
        Err(WatchError::ConfigError(msg)) => {
            assert!(msg.contains("[watcher].interval"), "unexpected message: {msg}");
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
    Ok(())
}

#[test]
fn oversized_project_interval_returns_config_error() -> TestResult {
    let file = write_config("[[project]]\npath = \"/srv/docs\"\ninterval = \"6000000000000000h\"\n")?;

    match load_and_validate(file.path()) {
        Err(WatchError::ConfigError(msg)) => {
            assert!(msg.contains("too large"), "unexpected message: {msg}");
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
    Ok(())
}

#[test]
fn malformed_toml_returns_toml_error() -> TestResult {
    let file = write_config("[watcher\ninterval = 1")?;

    assert!(matches!(
        load_and_validate(file.path()),
        Err(WatchError::TomlError(_))
    ));
    Ok(())
}

#[test]
fn explicit_missing_config_is_io_error() {
    let result = load_or_default(Some(Path::new("/definitely/not/here.toml")));
    assert!(matches!(result, Err(WatchError::IoError(_))));
}

#[test]
fn builder_produces_validated_config() {
    let cfg: ConfigFile = ConfigFileBuilder::new()
        .interval("10ms")
        .patterns(&["**/*.rs"])
        .with_global_exclude("target/**")
        .with_project("/proj", None)
        .build();

    assert_eq!(cfg.projects.len(), 1);
    assert_eq!(cfg.projects[0].options.interval, Duration::from_millis(10));
    assert_eq!(cfg.projects[0].options.exclude, vec!["target/**"]);
    assert_eq!(cfg.patterns, vec!["**/*.rs"]);
}

#[test]
fn builder_rejects_zero_restart_window() {
    let raw = ConfigFileBuilder::new().restart_window("0ms").raw();
    assert!(matches!(
        ConfigFile::try_from(raw),
        Err(WatchError::ConfigError(_))
    ));
}

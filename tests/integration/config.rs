//! Configuration loading integration tests

use std::io::Write;

use pledge::util::config::{self, load_config, ENV_TASK_BUDGET, ENV_TRACE};

#[test]
fn test_load_full_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[trace]\ntransitions = true\nwarn_on_misuse = false\n\n[scheduler]\ntask_budget = 64"
    )
    .unwrap();

    let cfg = load_config(file.path()).unwrap();
    assert!(!cfg.trace.warn_on_misuse);
    // Environment overrides win over the file
    if std::env::var(ENV_TRACE).is_err() {
        assert!(cfg.trace.transitions);
    }
    if std::env::var(ENV_TASK_BUDGET).is_err() {
        assert_eq!(cfg.scheduler.task_budget, 64);
    }
}

#[test]
fn test_current_defaults() {
    let cfg = config::current();
    assert!(cfg.scheduler.task_budget > 0);
    assert_eq!(config::task_budget(), cfg.scheduler.task_budget);
}

/*!
 * Configuration Tests
 * Environment and JSON file loading
 */

use pretty_assertions::assert_eq;
use proc_core::core::config::CONFIG_PATH_ENV;
use proc_core::{ConfigError, KernelConfig};
use serial_test::serial;
use std::io::Write;
use tempfile::NamedTempFile;

const VARS: [&str; 6] = [
    CONFIG_PATH_ENV,
    "KERNEL_MAX_PROCESSES",
    "KERNEL_STACK_SIZE",
    "KERNEL_BLOCK_SIZE",
    "KERNEL_MEMORY_POOL",
    "KERNEL_TICK_MS",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

fn json_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_env_defaults() {
    clear_env();
    assert_eq!(KernelConfig::from_env().unwrap(), KernelConfig::default());
}

#[test]
#[serial]
fn test_env_overrides() {
    clear_env();
    std::env::set_var("KERNEL_MAX_PROCESSES", "16");
    std::env::set_var("KERNEL_STACK_SIZE", "8192");
    std::env::set_var("KERNEL_TICK_MS", "25");

    let config = KernelConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.max_processes, 16);
    assert_eq!(config.stack_size, 8192);
    assert_eq!(config.tick_interval_ms, 25);
    assert_eq!(config.block_size, 4096);
}

#[test]
#[serial]
fn test_env_rejects_garbage() {
    clear_env();
    std::env::set_var("KERNEL_MAX_PROCESSES", "many");
    let err = KernelConfig::from_env().unwrap_err();
    clear_env();

    assert!(matches!(
        err,
        ConfigError::InvalidValue { ref key, .. } if key == "KERNEL_MAX_PROCESSES"
    ));
}

#[test]
#[serial]
fn test_env_validates_result() {
    clear_env();
    std::env::set_var("KERNEL_BLOCK_SIZE", "3000");
    let err = KernelConfig::from_env().unwrap_err();
    clear_env();

    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "block_size"));
}

#[test]
#[serial]
fn test_config_file_with_env_override() {
    clear_env();
    let file = json_file(r#"{ "max_processes": 8, "memory_pool": 1048576 }"#);
    std::env::set_var(CONFIG_PATH_ENV, file.path());
    std::env::set_var("KERNEL_MAX_PROCESSES", "12");

    let config = KernelConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.max_processes, 12);
    assert_eq!(config.memory_pool, 1_048_576);
    assert_eq!(config.stack_size, 64 * 1024);
}

#[test]
fn test_file_missing_fields_take_defaults() {
    let file = json_file(r#"{ "tick_interval_ms": 5 }"#);
    let config = KernelConfig::from_json_file(file.path()).unwrap();
    assert_eq!(
        config,
        KernelConfig {
            tick_interval_ms: 5,
            ..KernelConfig::default()
        }
    );
}

#[test]
fn test_unreadable_file() {
    let err = KernelConfig::from_json_file("/nonexistent/kernel.json").unwrap_err();
    assert!(matches!(err, ConfigError::Unreadable(_)));

    let file = json_file("not json");
    assert!(matches!(
        KernelConfig::from_json_file(file.path()),
        Err(ConfigError::Unreadable(_))
    ));
}

#[test]
fn test_invalid_file_values() {
    let file = json_file(r#"{ "stack_size": 64 }"#);
    let err = KernelConfig::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "stack_size"));
}

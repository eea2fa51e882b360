use std::path::PathBuf;
use std::sync::Arc;

use compenv_core::{CompilerConfiguration, DefaultSetup, Environment, EnvironmentOptions, SourceUnit};

/// Environment with the default setup and keepalive off
///
/// Tests never go through `Environment::global()` so they cannot see each
/// other's shared application.
#[allow(dead_code)]
pub fn new_environment() -> Environment {
    Environment::with_options(Arc::new(DefaultSetup), EnvironmentOptions::default())
}

#[allow(dead_code)]
pub fn keepalive_environment() -> Environment {
    Environment::with_options(Arc::new(DefaultSetup), EnvironmentOptions { keepalive: true })
}

#[allow(dead_code)]
pub fn empty_config() -> CompilerConfiguration {
    CompilerConfiguration::new()
}

/// Source unit whose text has exactly `lines` terminated lines
#[allow(dead_code)]
pub fn unit_with_lines(path: &str, lines: usize) -> SourceUnit {
    let text: String = (0..lines).map(|i| format!("val x{} = {}\n", i, i)).collect();
    SourceUnit::new(path, text)
}

/// Write `contents` to `name` inside `dir` and return the full path
#[allow(dead_code)]
pub fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

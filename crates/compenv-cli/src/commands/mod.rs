pub mod lines;
pub mod points;

use std::path::Path;

use compenv_core::{CompilerConfiguration, Result};

/// Configuration from `--config`, or an empty one
pub fn load_config(path: Option<&Path>) -> Result<CompilerConfiguration> {
    match path {
        Some(path) => CompilerConfiguration::from_toml_file(path),
        None => Ok(CompilerConfiguration::new()),
    }
}

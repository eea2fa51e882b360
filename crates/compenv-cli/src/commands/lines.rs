//! Lines command
//!
//! Usage: compenv lines [--isolated] [--config <FILE>] <FILES>...

use clap::Args;
use compenv_core::{Environment, ProjectHandle, SourceUnit};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct LinesArgs {
    /// Source files to count
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Use a private application instead of the shared one
    #[arg(long)]
    pub isolated: bool,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Execute lines command
///
/// Prints one `<lines> <path>` row per file and a final `<lines> total` row.
pub fn execute(args: LinesArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(args.config.as_deref())?;
    let units = args
        .files
        .iter()
        .map(|path| SourceUnit::from_file(path))
        .collect::<Result<Vec<_>, _>>()?;

    let env = Environment::global();
    let (handle, scope) = if args.isolated {
        env.create_isolated(&config)?
    } else {
        let scope = env.new_scope("compenv lines");
        match env.create_shared(&config, scope) {
            Ok(handle) => (handle, scope),
            Err(e) => {
                env.dispose_scope(scope);
                return Err(e.into());
            }
        }
    };

    let result = report(&handle, units);
    env.dispose_scope(scope);
    let rows = result?;

    for (count, label) in rows {
        println!("{:>8} {}", count, label);
    }
    Ok(())
}

fn report(handle: &ProjectHandle, units: Vec<SourceUnit>) -> compenv_core::Result<Vec<(usize, String)>> {
    let mut rows: Vec<(usize, String)> = units
        .iter()
        .map(|unit| (unit.line_count(), unit.path.clone()))
        .collect();

    handle.add_source_units(units)?;
    let total = handle.line_count()?;
    tracing::debug!(files = rows.len(), total, "counted lines");

    rows.push((total, "total".to_string()));
    Ok(rows)
}

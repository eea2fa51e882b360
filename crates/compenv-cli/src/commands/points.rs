//! Points command
//!
//! Usage: compenv points [--config <FILE>]

use clap::Args;
use compenv_core::{Environment, ExtensionArea};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct PointsArgs {
    /// TOML configuration file (extension manifests are read from it)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Execute points command
///
/// Builds an isolated project so the shared application is left alone,
/// prints `<scope> <point> <extensions>` rows, then disposes it.
pub fn execute(args: PointsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(args.config.as_deref())?;

    let env = Environment::global();
    let (handle, scope) = env.create_isolated(&config)?;

    let mut rows = rows_for(handle.application().extensions());
    rows.extend(rows_for(handle.project().extensions()));
    env.dispose_scope(scope);

    for row in rows {
        println!("{}", row);
    }
    Ok(())
}

fn rows_for(area: &ExtensionArea) -> Vec<String> {
    area.points()
        .into_iter()
        .map(|point| format!("{}\t{}\t{}", area.scope(), point.name, point.extensions))
        .collect()
}

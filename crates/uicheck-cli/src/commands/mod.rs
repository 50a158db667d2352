//! Command implementations for the uicheck CLI.

pub mod check;
pub mod init;
pub mod run;
pub mod schema;
pub mod templates;

pub use check::execute as check_execute;
pub use init::execute as init_execute;
pub use run::execute as run_execute;
pub use schema::execute as schema_execute;

use crate::error::{CliError, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;
use uicheck_core::{Scenario, discover};

/// Discovers, loads, validates and binds every scenario under `paths`.
///
/// # Errors
///
/// Fails on the first file that does not load, and when no scenario file
/// is found at all.
pub fn load_scenarios(paths: &[PathBuf], params: &[(String, String)]) -> Result<Vec<Scenario>> {
    let overrides: BTreeMap<String, String> = params.iter().cloned().collect();

    let files = discover(paths)?;
    if files.is_empty() {
        let searched: Vec<_> = paths.iter().map(|p| p.display().to_string()).collect();
        return Err(CliError::InvalidArgument(format!(
            "No scenario files (.toml, .json) found in {}",
            searched.join(", ")
        )));
    }

    files
        .iter()
        .map(|path| {
            debug!("Loading scenario {}", path.display());
            Ok(Scenario::from_file(path)?.bind(&overrides)?)
        })
        .collect()
}

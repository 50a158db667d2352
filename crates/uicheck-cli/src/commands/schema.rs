//! Schema command implementation.

use crate::cli::SchemaArgs;
use crate::config::UicheckConfig;
use crate::error::{Result, ResultExt};
use crate::ui;

/// Print (or write) the JSON schema of the config file.
///
/// # Errors
///
/// Returns serialization and I/O errors.
pub async fn execute(args: SchemaArgs) -> Result<()> {
    let schema = serde_json::to_string_pretty(&UicheckConfig::json_schema()?)?;

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, schema).await.with_path(&path)?;
            ui::success(&format!("Schema written to {}", path.display()));
        }
        None => println!("{}", schema),
    }
    Ok(())
}

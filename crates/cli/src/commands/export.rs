//! Write a snapshot to a file that `--snapshot` can read back.
//!
//! # Usage
//!
//! ```bash
//! # Pull the live data once, then work offline
//! costeo export -o data.json
//! costeo --snapshot data.json issues
//! ```

use std::ffi::OsStr;
use std::path::Path;

use costeo_core::CostingSnapshot;
use tracing::info;

use super::CommandError;

/// Serialize `snapshot` to `path`, as YAML for `.yaml`/`.yml` and JSON
/// otherwise.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub async fn run(snapshot: &CostingSnapshot, path: &Path) -> Result<(), CommandError> {
    let content = match path.extension().and_then(OsStr::to_str) {
        Some("yaml" | "yml") => serde_yaml::to_string(snapshot)?,
        _ => serde_json::to_string_pretty(snapshot)?,
    };
    tokio::fs::write(path, content)
        .await
        .map_err(|source| CommandError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    info!(
        path = %path.display(),
        products = snapshot.products.len(),
        recipes = snapshot.recipes.len(),
        "Exported snapshot"
    );
    Ok(())
}

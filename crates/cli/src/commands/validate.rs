//! Check a snapshot for data the engine would silently mis-cost.

use std::io::Write;

use costeo_core::CostingSnapshot;
use costeo_core::engine::check_snapshot;
use tracing::{info, warn};

use super::{CommandError, Format, write_json};

/// List every integrity problem.
///
/// # Errors
///
/// Returns `CommandError::ValidationFailed` if any problem was found, or an
/// error if the report cannot be written.
pub fn run(out: &mut impl Write, snapshot: &CostingSnapshot, format: Format) -> Result<(), CommandError> {
    let problems = check_snapshot(snapshot);

    if format == Format::Json {
        let messages: Vec<String> = problems.iter().map(ToString::to_string).collect();
        write_json(out, &messages)?;
    } else {
        for problem in &problems {
            writeln!(out, "{problem}")?;
        }
    }

    if problems.is_empty() {
        info!(
            products = snapshot.products.len(),
            recipes = snapshot.recipes.len(),
            "Snapshot is consistent"
        );
        Ok(())
    } else {
        warn!(count = problems.len(), "Snapshot has integrity problems");
        Err(CommandError::ValidationFailed(problems.len()))
    }
}

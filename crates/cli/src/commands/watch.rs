//! Re-render the dashboard every time the data changes.
//!
//! # Usage
//!
//! ```bash
//! COSTEO_POLL_INTERVAL_SECS=2 costeo watch
//! ```
//!
//! A refresh that fails (a dropped request, a malformed record) prints a
//! "data unavailable" notice and the watch carries on with the next change.

use std::future::Future;
use std::io::{self, Write};

use costeo_store::{Backend, SnapshotWatcher, Store, StoreError};
use serde_json::json;
use tracing::{info, warn};

use super::{CommandError, Format, report, write_json};

/// Write a dashboard for the current data and again after every change,
/// until Ctrl-C.
///
/// # Errors
///
/// Returns an error if watching cannot start, a subscription closes, or a
/// dashboard cannot be written.
pub async fn run<B: Backend>(store: &Store<B>, format: Format) -> Result<(), CommandError> {
    let mut watcher = store.watch().await?;
    info!("Watching for changes, press Ctrl-C to stop");

    follow(&mut watcher, &mut io::stdout(), format, tokio::signal::ctrl_c()).await
}

async fn follow<B: Backend>(
    watcher: &mut SnapshotWatcher<B>,
    out: &mut impl Write,
    format: Format,
    shutdown: impl Future<Output = io::Result<()>>,
) -> Result<(), CommandError> {
    tokio::pin!(shutdown);

    loop {
        let next = tokio::select! {
            next = watcher.next() => next,
            signal = &mut shutdown => {
                signal?;
                info!("Stopped watching");
                return Ok(());
            }
        };

        match next {
            Ok(snapshot) => {
                report::dashboard(out, &snapshot, format)?;
                writeln!(out)?;
            }
            Err(e @ StoreError::Closed(_)) => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "Failed to refresh data");
                unavailable(out, &e, format)?;
            }
        }
        out.flush()?;
    }
}

fn unavailable(out: &mut impl Write, error: &StoreError, format: Format) -> Result<(), CommandError> {
    match format {
        Format::Json => write_json(out, &json!({"status": "unavailable", "error": error.to_string()})),
        Format::Text => {
            writeln!(out, "Data unavailable: {error}")?;
            writeln!(out)?;
            Ok(())
        }
    }
}

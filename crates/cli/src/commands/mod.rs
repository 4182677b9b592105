//! Command implementations.
//!
//! Reports go to the writer handed in (stdout from `main`); progress and
//! diagnostics go through `tracing`, which writes to stderr.

pub mod export;
pub mod preview;
mod render;
pub mod report;
pub mod simulate;
pub mod source;
pub mod validate;
pub mod watch;

use std::io::{self, Write};
use std::path::PathBuf;

use costeo_store::{ConfigError, StoreError};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("output error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] costeo_core::NormalizeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("product not found: {0}")]
    ProductNotFound(String),

    #[error("recipe not found: {0}")]
    RecipeNotFound(String),

    #[error("product {0} has no active recipe")]
    NoActiveRecipe(String),

    #[error("price must be greater than 0 (got {0})")]
    InvalidPrice(Decimal),

    #[error("{0} integrity problems found")]
    ValidationFailed(usize),
}

/// How reports are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> Result<(), CommandError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

//! Reads and validates the trigger table file.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::domain::{Trigger, TriggerTable};

use super::dto::TriggerFileDto;

/// Reasons a trigger table could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TriggerConfigError {
    #[error("cannot read trigger table {path}: {message}", path = path.display())]
    Read { path: PathBuf, message: String },
    #[error("trigger table {path} is not valid JSON: {message}", path = path.display())]
    Parse { path: PathBuf, message: String },
    #[error("trigger table {path} has an invalid record: {message}", path = path.display())]
    InvalidRecord { path: PathBuf, message: String },
}

/// Decode a trigger table from JSON text.
///
/// Unknown `type` values load as unsupported triggers; structurally broken
/// records reject the whole table.
///
/// # Errors
///
/// Returns [`TriggerConfigError::Parse`] or
/// [`TriggerConfigError::InvalidRecord`], tagged with `path`.
pub fn parse_trigger_table(path: &Path, contents: &str) -> Result<TriggerTable, TriggerConfigError> {
    let file: TriggerFileDto =
        serde_json::from_str(contents).map_err(|err| TriggerConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    let triggers = file
        .triggers
        .into_iter()
        .map(|record| record.into_domain())
        .collect::<Result<Vec<Trigger>, String>>()
        .map_err(|message| TriggerConfigError::InvalidRecord {
            path: path.to_path_buf(),
            message,
        })?;
    let table = TriggerTable::new(triggers);
    for id in table.duplicate_ids() {
        warn!(trigger_id = %id, path = %path.display(), "duplicate trigger id; the first definition wins");
    }
    Ok(table)
}

/// Read and decode the trigger table at `path`.
///
/// # Errors
///
/// Returns [`TriggerConfigError::Read`] when the file cannot be read, plus
/// the errors of [`parse_trigger_table`].
pub async fn load_trigger_table(path: &Path) -> Result<TriggerTable, TriggerConfigError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| TriggerConfigError::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    parse_trigger_table(path, &contents)
}

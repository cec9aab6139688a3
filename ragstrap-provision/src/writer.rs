//! Atomic `.env` writer.
//!
//! ## `write_env_file` protocol
//!
//! 1. Read the current file, if any.
//! 2. Reconcile the `OLLAMA_MODEL` line in memory.
//! 3. Skip the write entirely if the result is byte-identical.
//! 4. Write to `<path>.ragstrap.tmp`, carrying over the old file's permissions.
//! 5. Rename over the final path (atomic on POSIX).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ragstrap_core::{env_file, EnvEdit, ModelName};

use crate::error::{io_err, ProvisionError};

/// Reconcile the `.env` file at `path` so it binds `OLLAMA_MODEL` to `model`.
pub fn write_env_file(path: &Path, model: &ModelName) -> Result<EnvEdit, ProvisionError> {
    let tmp = PathBuf::from(format!("{}.ragstrap.tmp", path.display()));
    write_env_file_with_tmp(path, model, &tmp)
}

fn write_env_file_with_tmp(path: &Path, model: &ModelName, tmp: &Path) -> Result<EnvEdit, ProvisionError> {
    let existing = match std::fs::read_to_string(path) {
        Ok(contents) => Some(contents),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => return Err(io_err(path, e)),
    };

    let (contents, edit) = env_file::reconcile(existing.as_deref(), model)?;
    if edit == EnvEdit::Unchanged {
        tracing::debug!("unchanged: {}", path.display());
        return Ok(edit);
    }

    std::fs::write(tmp, &contents).map_err(|e| io_err(tmp, e))?;
    if existing.is_some() {
        if let Ok(meta) = std::fs::metadata(path) {
            std::fs::set_permissions(tmp, meta.permissions()).map_err(|e| io_err(tmp, e))?;
        }
    }

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::info!("{edit} {}", path.display());
    Ok(edit)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

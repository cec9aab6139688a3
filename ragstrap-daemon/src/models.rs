//! Local model inventory and pulls.

use ragstrap_core::{ModelName, Runner};

use crate::error::DaemonError;
use crate::paths::{list_command, pull_command};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    AlreadyPresent,
    Pulled,
}

/// `true` if `model` appears anywhere in `ollama list` output.
///
/// This is a plain substring match: `llama3` matches an installed
/// `llama3.2:latest`.
pub fn has_model(runner: &dyn Runner, model: &ModelName) -> Result<bool, DaemonError> {
    let cmd = list_command();
    let output = runner.capture(&cmd)?;
    if !output.success {
        return Err(DaemonError::Inventory {
            command: cmd.to_string(),
            code: output.code,
        });
    }
    Ok(output.stdout.contains(model.as_str()))
}

/// Pull `model` unless the inventory already lists it. Blocks until the pull
/// finishes; a failed pull is an error.
pub fn ensure_pulled(runner: &dyn Runner, model: &ModelName) -> Result<ModelStatus, DaemonError> {
    if has_model(runner, model)? {
        tracing::debug!("model {model} already present");
        return Ok(ModelStatus::AlreadyPresent);
    }
    tracing::info!("pulling model {model}");
    runner.run(&pull_command(model))?;
    Ok(ModelStatus::Pulled)
}

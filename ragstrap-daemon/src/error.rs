use thiserror::Error;

/// Error surface for daemon install, start and model operations.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Core(#[from] ragstrap_core::CoreError),

    #[error(transparent)]
    Detect(#[from] ragstrap_detector::DetectError),

    #[error("`{command}` failed (status {code:?}); is the Ollama daemon running?")]
    Inventory { command: String, code: Option<i32> },
}

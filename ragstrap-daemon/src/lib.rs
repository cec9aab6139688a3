//! Ollama model-serving daemon: install, start-if-not-running, model pull.

mod error;
pub mod lifecycle;
pub mod models;
pub mod paths;

pub use error::DaemonError;
pub use lifecycle::{ensure_installed, ensure_running, is_running, DaemonStatus};
pub use models::{ensure_pulled, has_model, ModelStatus};

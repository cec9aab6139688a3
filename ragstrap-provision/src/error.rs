//! Error types for ragstrap-provision.

use std::path::PathBuf;

use thiserror::Error;

use ragstrap_core::CoreError;
use ragstrap_daemon::DaemonError;
use ragstrap_detector::DetectError;

/// All errors that can abort provisioning.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error(transparent)]
    Daemon(#[from] DaemonError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`ProvisionError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ProvisionError {
    ProvisionError::Io {
        path: path.into(),
        source,
    }
}

//! Error types for ragstrap-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from settings loading, process execution and `.env` handling.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `ragstrap.yaml` could not be parsed.
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The `.env` template failed to render.
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    /// The external program could not be started at all.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program ran and exited unsuccessfully.
    #[error("`{command}` exited with {}", describe_code(*code))]
    CommandFailed { command: String, code: Option<i32> },

    /// A settings path is not a single name inside the application directory.
    #[error("invalid `{field}` setting '{}': expected a plain name inside the application directory", value.display())]
    InvalidSetting { field: &'static str, value: PathBuf },
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Convenience constructor for [`CoreError::Io`].
pub fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}

//! # ragstrap-provision
//!
//! Everything between "the daemon is up" and "exec the app": runtime install,
//! virtualenv reset, dependency install, `.env` write, launch plan, and the
//! [`pipeline::Bootstrapper`] that runs the stages in order.

pub mod error;
pub mod launch;
pub mod pipeline;
pub mod runtime;
pub mod venv;
pub mod writer;

pub use error::ProvisionError;
pub use launch::LaunchPlan;
pub use pipeline::{BootstrapReport, Bootstrapper, NoopReporter, Reporter, StageOutcome};
pub use runtime::{ensure_runtime, RuntimeStatus};
pub use venv::Venv;
pub use writer::write_env_file;

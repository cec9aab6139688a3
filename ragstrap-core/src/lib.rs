//! ragstrap core library: domain types, settings, process seam, `.env` editing.
//!
//! - [`types`]: newtypes and enums shared by every stage
//! - [`error`]: [`CoreError`]
//! - [`settings`]: optional `ragstrap.yaml` overrides
//! - [`process`]: the [`process::Runner`] trait and its system implementation
//! - [`env_file`]: `.env` parse / reconcile / render

pub mod env_file;
pub mod error;
pub mod process;
pub mod settings;
pub mod types;

pub use error::CoreError;
pub use process::{CommandOutput, CommandSpec, Runner, SystemRunner};
pub use settings::Settings;
pub use types::{EnvEdit, ModelName, PackageManager, Platform, Stage, MODEL_ENV_KEY};

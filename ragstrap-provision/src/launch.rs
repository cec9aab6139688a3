//! Hand-off to the application.

use std::fmt;
use std::path::PathBuf;

use ragstrap_core::{CommandSpec, CoreError};

use crate::venv::Venv;

/// The final command: the venv's interpreter running the entry file, from the
/// application root, with the venv activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub command: CommandSpec,
}

impl LaunchPlan {
    pub fn new(venv: &Venv, root: PathBuf, entry_file: &std::path::Path) -> Self {
        let command = venv
            .python_command([entry_file.display().to_string()])
            .current_dir(root);
        Self { command }
    }

    /// Replace the current process with the application.
    ///
    /// On Unix this only returns if `exec` itself fails. Elsewhere the
    /// application runs as a child and its exit code is returned.
    pub fn exec(&self) -> Result<i32, CoreError> {
        let mut command = self.command.to_command();
        tracing::info!("launching: {}", self.command);

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            let source = command.exec();
            Err(CoreError::Spawn {
                command: self.command.to_string(),
                source,
            })
        }

        #[cfg(not(unix))]
        {
            let status = command.status().map_err(|source| CoreError::Spawn {
                command: self.command.to_string(),
                source,
            })?;
            Ok(status.code().unwrap_or(1))
        }
    }
}

impl fmt::Display for LaunchPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.command.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn plan_runs_entry_file_from_root_inside_venv() {
        let root = PathBuf::from("/srv/app");
        let venv = Venv::new(&root, Path::new("venv"));
        let plan = LaunchPlan::new(&venv, root.clone(), Path::new("app.py"));

        assert_eq!(plan.command.program, venv.python().display().to_string());
        assert_eq!(plan.command.args, vec!["app.py".to_string()]);
        assert_eq!(plan.command.current_dir, Some(root));
        assert!(plan.command.envs.iter().any(|(k, _)| k == "VIRTUAL_ENV"));
    }

    #[test]
    #[cfg(unix)]
    fn exec_of_missing_interpreter_returns_spawn_error() {
        let root = std::env::temp_dir().join("ragstrap-no-such-app");
        let venv = Venv::new(&root, Path::new("venv"));
        let plan = LaunchPlan::new(&venv, std::env::temp_dir(), Path::new("app.py"));
        let err = plan.exec().unwrap_err();
        assert!(matches!(err, CoreError::Spawn { .. }));
    }
}

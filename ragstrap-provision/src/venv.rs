//! The application's virtualenv: destroy, recreate, activate, install into.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use ragstrap_core::process::path_with_prefix;
use ragstrap_core::{CommandSpec, Runner};
use ragstrap_detector::RUNTIME_BINARY;

use crate::error::{io_err, ProvisionError};

#[cfg(windows)]
const BIN_DIR: &str = "Scripts";
#[cfg(not(windows))]
const BIN_DIR: &str = "bin";

#[cfg(windows)]
const PYTHON: &str = "python.exe";
#[cfg(not(windows))]
const PYTHON: &str = "python";

/// A virtualenv rooted at an absolute directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Venv {
    dir: PathBuf,
}

impl Venv {
    /// `venv_dir` is a plain name checked by `Settings::validate`.
    pub fn new(root: &Path, venv_dir: &Path) -> Self {
        Self {
            dir: root.join(venv_dir),
        }
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.dir.join(BIN_DIR)
    }

    pub fn python(&self) -> PathBuf {
        self.bin_dir().join(PYTHON)
    }

    /// Environment an activated shell would have: `VIRTUAL_ENV` set and the
    /// venv's bin directory first on `PATH`.
    pub fn activation_env(&self) -> Vec<(String, OsString)> {
        vec![
            ("VIRTUAL_ENV".to_string(), self.dir.clone().into_os_string()),
            ("PATH".to_string(), path_with_prefix(&self.bin_dir())),
        ]
    }

    /// Apply [`Self::activation_env`] to a command.
    pub fn activate(&self, cmd: CommandSpec) -> CommandSpec {
        self.activation_env()
            .into_iter()
            .fold(cmd, |cmd, (key, value)| cmd.env(key, value))
    }

    /// `<venv>/bin/python <args…>`, activated.
    pub fn python_command<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.activate(CommandSpec::new(self.python().display().to_string()).args(args))
    }

    /// Delete any existing virtualenv and create a fresh one with `python3 -m venv`.
    ///
    /// Returns `true` if an old directory was removed. There is no reuse or
    /// in-place upgrade.
    pub fn recreate(&self, root: &Path, runner: &dyn Runner) -> Result<bool, ProvisionError> {
        let existed = self.dir.exists();
        if existed {
            tracing::info!("removing existing virtualenv {}", self.dir.display());
            if self.dir.is_dir() {
                std::fs::remove_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))?;
            } else {
                std::fs::remove_file(&self.dir).map_err(|e| io_err(&self.dir, e))?;
            }
        }

        let cmd = CommandSpec::new(RUNTIME_BINARY)
            .args(["-m", "venv"])
            .arg(self.dir.display().to_string())
            .current_dir(root);
        runner.run(&cmd)?;
        Ok(existed)
    }

    /// Upgrade pip, then install everything listed in `manifest`.
    pub fn install_requirements(&self, manifest: &Path, runner: &dyn Runner) -> Result<(), ProvisionError> {
        runner.run(&self.python_command(["-m", "pip", "install", "--upgrade", "pip"]))?;
        runner.run(&self.python_command([
            "-m".to_string(),
            "pip".to_string(),
            "install".to_string(),
            "-r".to_string(),
            manifest.display().to_string(),
        ]))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn python_lives_under_bin() {
        let venv = Venv::new(Path::new("/srv/app"), Path::new("venv"));
        assert_eq!(venv.python(), PathBuf::from("/srv/app/venv/bin/python"));
    }

    #[test]
    fn activation_sets_virtual_env_and_path() {
        let venv = Venv::new(Path::new("/srv/app"), Path::new("venv"));
        let cmd = venv.python_command(["-V"]);
        let keys: Vec<&str> = cmd.envs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["VIRTUAL_ENV", "PATH"]);
        assert_eq!(cmd.envs[0].1, OsString::from("/srv/app/venv"));
        let first = std::env::split_paths(&cmd.envs[1].1).next().expect("path entry");
        assert_eq!(first, venv.bin_dir());
    }
}

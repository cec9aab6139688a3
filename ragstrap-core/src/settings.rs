//! Optional `ragstrap.yaml` overrides for the fixed names the bootstrapper uses.
//!
//! Every field has a default, so an absent file and an empty file behave the
//! same. Resolution order: explicit path > `<dir>/ragstrap.yaml` > defaults.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};
use crate::types::{ModelName, DEFAULT_MODEL};

/// File name looked up in the working directory when no `--config` is given.
pub const SETTINGS_FILE: &str = "ragstrap.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Application entry point, run with the virtualenv's interpreter.
    pub entry_file: PathBuf,
    /// Dependency manifest handed to `pip install -r`.
    pub manifest_file: PathBuf,
    /// Virtualenv directory; destroyed and recreated on every run.
    pub venv_dir: PathBuf,
    pub env_file: PathBuf,
    pub default_model: String,
    /// Fixed wait after spawning `ollama serve`.
    pub daemon_startup_delay_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            entry_file: PathBuf::from("app.py"),
            manifest_file: PathBuf::from("requirements.txt"),
            venv_dir: PathBuf::from("venv"),
            env_file: PathBuf::from(".env"),
            default_model: DEFAULT_MODEL.to_string(),
            daemon_startup_delay_secs: 5,
        }
    }
}

impl Settings {
    pub fn default_model(&self) -> ModelName {
        ModelName::from(self.default_model.as_str())
    }

    pub fn daemon_startup_delay(&self) -> Duration {
        Duration::from_secs(self.daemon_startup_delay_secs)
    }

    /// Check that every path setting names a single entry directly inside the
    /// application directory. `venv_dir` is deleted recursively on every run,
    /// so `.`, `..`, absolute paths and nested paths are all rejected.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (field, value) in [
            ("entry_file", &self.entry_file),
            ("manifest_file", &self.manifest_file),
            ("venv_dir", &self.venv_dir),
            ("env_file", &self.env_file),
        ] {
            if !is_plain_name(value) {
                return Err(CoreError::InvalidSetting {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    /// Load settings from an explicit file. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_yaml::from_str(&contents).map_err(|e| CoreError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Resolve settings for a working directory.
    ///
    /// `explicit` wins when given; otherwise `<dir>/ragstrap.yaml` is used if it
    /// exists, and built-in defaults if it does not.
    pub fn resolve(dir: &Path, explicit: Option<&Path>) -> Result<Self, CoreError> {
        if let Some(path) = explicit {
            tracing::debug!("loading settings from {}", path.display());
            return Self::load_from(path);
        }
        let local = dir.join(SETTINGS_FILE);
        if local.is_file() {
            tracing::debug!("loading settings from {}", local.display());
            return Self::load_from(&local);
        }
        Ok(Self::default())
    }
}

fn is_plain_name(path: &Path) -> bool {
    let mut components = path.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_local_file_yields_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let settings = Settings::resolve(dir.path(), None).expect("resolve");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.venv_dir, PathBuf::from("venv"));
        assert_eq!(settings.daemon_startup_delay(), Duration::from_secs(5));
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(
            dir.path().join(SETTINGS_FILE),
            "venv_dir: .venv\ndefault_model: mistral\n",
        )
        .expect("write");

        let settings = Settings::resolve(dir.path(), None).expect("resolve");
        assert_eq!(settings.venv_dir, PathBuf::from(".venv"));
        assert_eq!(settings.default_model().as_str(), "mistral");
        assert_eq!(settings.entry_file, PathBuf::from("app.py"));
    }

    #[test]
    fn empty_file_is_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("custom.yaml");
        fs::write(&path, "\n").expect("write");
        assert_eq!(Settings::load_from(&path).expect("load"), Settings::default());
    }

    #[test]
    fn unknown_field_is_a_parse_error_with_path() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "venv: .venv\n").expect("write");

        let err = Settings::resolve(dir.path(), None).unwrap_err();
        match err {
            CoreError::Parse { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        Settings::default().validate().expect("defaults");
    }

    #[rstest]
    #[case::current_dir("venv_dir", ".")]
    #[case::parent_dir("venv_dir", "..")]
    #[case::empty("venv_dir", "''")]
    #[case::absolute("venv_dir", "/home/u")]
    #[case::nested("venv_dir", "build/venv")]
    #[case::escapes("venv_dir", "../venv")]
    #[case::dot_prefixed("venv_dir", "./venv")]
    #[case::env_outside("env_file", "../.env")]
    #[case::entry_absolute("entry_file", "/etc/passwd")]
    #[case::manifest_nested("manifest_file", "deps/requirements.txt")]
    fn path_settings_must_be_plain_names(#[case] field: &str, #[case] value: &str) {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, format!("{field}: {value}\n")).expect("write");

        let err = Settings::resolve(dir.path(), None).unwrap_err();
        match err {
            CoreError::InvalidSetting { field: f, .. } => assert_eq!(f, field),
            other => panic!("expected invalid setting, got {other:?}"),
        }
    }

    #[test]
    fn hidden_names_are_accepted() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join(SETTINGS_FILE), "venv_dir: .venv
env_file: .env.local
")
            .expect("write");
        let settings = Settings::resolve(dir.path(), None).expect("resolve");
        assert_eq!(settings.venv_dir, PathBuf::from(".venv"));
    }

    #[test]
    fn explicit_missing_path_is_io_error() {
        let dir = TempDir::new().expect("tempdir");
        let err = Settings::resolve(dir.path(), Some(&dir.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, CoreError::Io { .. }));
    }
}

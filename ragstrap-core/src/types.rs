//! Domain types for the ragstrap bootstrapper.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The single `.env` key this tool owns.
pub const MODEL_ENV_KEY: &str = "OLLAMA_MODEL";

/// Model pulled and configured when no positional argument is given.
pub const DEFAULT_MODEL: &str = "llama3.2";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque model identifier, passed verbatim to `ollama list`/`ollama pull`
/// and written verbatim into `.env`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelName(pub String);

impl ModelName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ModelName {
    fn default() -> Self {
        Self(DEFAULT_MODEL.to_owned())
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ModelName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ModelName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Host operating system, as far as provisioning cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    /// Anything else; carries the raw OS string for diagnostics.
    Unknown(String),
}

impl Platform {
    /// Classify an OS string as reported by `std::env::consts::OS`.
    pub fn from_os(os: &str) -> Self {
        match os {
            "macos" => Platform::MacOs,
            "linux" => Platform::Linux,
            other => Platform::Unknown(other.to_owned()),
        }
    }

    /// The platform this binary is running on.
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Platform::Unknown(_))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::MacOs => write!(f, "macOS"),
            Platform::Linux => write!(f, "Linux"),
            Platform::Unknown(os) => write!(f, "unknown ({os})"),
        }
    }
}

/// System package managers the runtime installer knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    Brew,
    Apt,
    Dnf,
    Yum,
}

impl PackageManager {
    /// Linux package managers in the order they are tried.
    pub const LINUX_PRIORITY: [PackageManager; 3] =
        [PackageManager::Apt, PackageManager::Dnf, PackageManager::Yum];

    /// Executable probed on `PATH` to decide whether this manager is present.
    pub fn binary(self) -> &'static str {
        match self {
            PackageManager::Brew => "brew",
            PackageManager::Apt => "apt-get",
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

/// The ordered provisioning stages. Control only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    ParseArgs,
    Precondition,
    Runtime,
    DaemonInstall,
    DaemonStart,
    ModelPull,
    EnvReset,
    DepsInstall,
    ConfigReconcile,
    Launch,
}

impl Stage {
    /// `S0` … `S9`.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::ParseArgs => "parse arguments",
            Stage::Precondition => "check working directory",
            Stage::Runtime => "ensure Python runtime",
            Stage::DaemonInstall => "ensure Ollama installed",
            Stage::DaemonStart => "ensure Ollama running",
            Stage::ModelPull => "ensure model pulled",
            Stage::EnvReset => "recreate virtualenv",
            Stage::DepsInstall => "install dependencies",
            Stage::ConfigReconcile => "reconcile .env",
            Stage::Launch => "launch application",
        };
        write!(f, "S{} {label}", self.index())
    }
}

/// What reconciling `.env` did to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvEdit {
    /// File did not exist; rendered from the template.
    Created,
    /// File existed without the key; a line was appended.
    Appended,
    /// Key line existed with a different value; replaced in place.
    Updated,
    /// Key line already held the requested value.
    Unchanged,
}

impl fmt::Display for EnvEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvEdit::Created => write!(f, "created"),
            EnvEdit::Appended => write!(f, "appended"),
            EnvEdit::Updated => write!(f, "updated"),
            EnvEdit::Unchanged => write!(f, "unchanged"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_classification() {
        assert_eq!(Platform::from_os("macos"), Platform::MacOs);
        assert_eq!(Platform::from_os("linux"), Platform::Linux);
        assert_eq!(
            Platform::from_os("freebsd"),
            Platform::Unknown("freebsd".to_string())
        );
        assert!(!Platform::from_os("windows").is_supported());
    }

    #[test]
    fn model_name_defaults_to_literal() {
        assert_eq!(ModelName::default().as_str(), DEFAULT_MODEL);
        assert_eq!(ModelName::from("mistral").to_string(), "mistral");
    }

    #[test]
    fn stages_are_linear() {
        assert_eq!(Stage::ParseArgs.index(), 0);
        assert_eq!(Stage::Launch.index(), 9);
        assert_eq!(Stage::DepsInstall.index(), Stage::EnvReset.index() + 1);
        assert_eq!(Stage::ModelPull.to_string(), "S5 ensure model pulled");
    }

    #[test]
    fn linux_priority_is_apt_dnf_yum() {
        let bins: Vec<_> = PackageManager::LINUX_PRIORITY
            .iter()
            .map(|pm| pm.binary())
            .collect();
        assert_eq!(bins, vec!["apt-get", "dnf", "yum"]);
    }
}

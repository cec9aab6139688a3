//! Host and workspace detection for `ragstrap-detector`.
//!
//! Answers the questions the bootstrapper asks before it changes anything:
//! is the working directory an application root, and which package manager
//! should install the runtime on this platform.

use std::fmt;
use std::path::{Path, PathBuf};

use ragstrap_core::{PackageManager, Platform, Runner, Settings};
use thiserror::Error;

/// Interpreter probed on `PATH` and used to create the virtualenv.
pub const RUNTIME_BINARY: &str = "python3";

/// Model-serving daemon CLI.
pub const DAEMON_BINARY: &str = "ollama";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Which required workspace file is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceFile {
    Entry,
    Manifest,
}

impl fmt::Display for WorkspaceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkspaceFile::Entry => write!(f, "application entry file"),
            WorkspaceFile::Manifest => write!(f, "dependency manifest"),
        }
    }
}

/// Verified application root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub entry_file: PathBuf,
    pub manifest_file: PathBuf,
}

/// Errors from detection.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error(
        "{role} '{}' not found in {}; run ragstrap from the application directory",
        path.display(),
        root.display()
    )]
    MissingWorkspaceFile {
        role: WorkspaceFile,
        path: PathBuf,
        root: PathBuf,
    },

    #[error("unsupported operating system: {platform}; install {component} manually")]
    UnsupportedPlatform {
        platform: Platform,
        component: &'static str,
    },

    #[error("{tool} is required on {platform} but was not found on PATH; {hint}")]
    MissingPrerequisite {
        tool: &'static str,
        platform: Platform,
        hint: &'static str,
    },

    #[error("no supported package manager found (tried {tried}); install {component} manually")]
    NoPackageManager {
        tried: String,
        component: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Verify that `dir` holds the application's entry file and dependency manifest.
///
/// Looks only at `dir` itself; there is no upward search.
pub fn check_workspace(dir: &Path, settings: &Settings) -> Result<Workspace, DetectError> {
    let entry_file = dir.join(&settings.entry_file);
    let manifest_file = dir.join(&settings.manifest_file);

    for (role, path) in [
        (WorkspaceFile::Entry, &entry_file),
        (WorkspaceFile::Manifest, &manifest_file),
    ] {
        if !path.is_file() {
            return Err(DetectError::MissingWorkspaceFile {
                role,
                path: path.strip_prefix(dir).unwrap_or(path).to_path_buf(),
                root: dir.to_path_buf(),
            });
        }
    }

    tracing::debug!("application root {}", dir.display());
    Ok(Workspace {
        entry_file,
        manifest_file,
    })
}

/// Pick the package manager that will install the Python runtime.
///
/// macOS requires Homebrew. Linux uses the first of apt-get, dnf, yum found on
/// `PATH`. Any other platform is rejected without probing.
pub fn select_package_manager(
    platform: &Platform,
    runner: &dyn Runner,
) -> Result<PackageManager, DetectError> {
    match platform {
        Platform::MacOs => {
            if runner.has(PackageManager::Brew.binary()) {
                Ok(PackageManager::Brew)
            } else {
                Err(DetectError::MissingPrerequisite {
                    tool: "Homebrew",
                    platform: platform.clone(),
                    hint: "install it from https://brew.sh and re-run",
                })
            }
        }
        Platform::Linux => PackageManager::LINUX_PRIORITY
            .into_iter()
            .find(|pm| runner.has(pm.binary()))
            .ok_or_else(|| DetectError::NoPackageManager {
                tried: PackageManager::LINUX_PRIORITY
                    .iter()
                    .map(|pm| pm.binary())
                    .collect::<Vec<_>>()
                    .join(", "),
                component: "Python 3",
            }),
        Platform::Unknown(_) => Err(DetectError::UnsupportedPlatform {
            platform: platform.clone(),
            component: "Python 3",
        }),
    }
}

#[cfg(test)]
mod tests {
    use ragstrap_core::process::testing::FakeRunner;

    use super::*;

    #[test]
    fn unknown_platform_probes_nothing() {
        let fake = FakeRunner::new().with_binary("apt-get").with_binary("brew");
        let err = select_package_manager(&Platform::from_os("freebsd"), &fake).unwrap_err();
        assert!(matches!(err, DetectError::UnsupportedPlatform { .. }));
        assert!(err.to_string().contains("install Python 3 manually"));
        assert!(fake.calls().is_empty());
    }
}

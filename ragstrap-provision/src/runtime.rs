//! Python runtime installation.

use ragstrap_core::{CommandSpec, PackageManager, Platform, Runner};
use ragstrap_detector::{select_package_manager, RUNTIME_BINARY};

use crate::error::ProvisionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeStatus {
    AlreadyInstalled,
    Installed(PackageManager),
}

/// Commands that install Python 3 with pip and venv support via `pm`.
pub fn install_commands(pm: PackageManager) -> Vec<CommandSpec> {
    match pm {
        PackageManager::Brew => vec![CommandSpec::new("brew").args(["install", "python"])],
        PackageManager::Apt => vec![
            CommandSpec::sudo("apt-get").arg("update"),
            CommandSpec::sudo("apt-get").args([
                "install",
                "-y",
                "python3",
                "python3-pip",
                "python3-venv",
            ]),
        ],
        PackageManager::Dnf | PackageManager::Yum => vec![CommandSpec::sudo(pm.binary())
            .args(["install", "-y", "python3", "python3-pip"])],
    }
}

/// Install Python 3 unless `python3` already resolves on `PATH`.
pub fn ensure_runtime(platform: &Platform, runner: &dyn Runner) -> Result<RuntimeStatus, ProvisionError> {
    if runner.has(RUNTIME_BINARY) {
        tracing::debug!("{RUNTIME_BINARY} already on PATH");
        return Ok(RuntimeStatus::AlreadyInstalled);
    }

    let pm = select_package_manager(platform, runner)?;
    tracing::info!("installing Python 3 with {pm}");
    for cmd in install_commands(pm) {
        runner.run(&cmd)?;
    }
    Ok(RuntimeStatus::Installed(pm))
}

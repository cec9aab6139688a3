//! Install and start the Ollama daemon.

use std::time::Duration;

use ragstrap_core::{CoreError, Platform, Runner};
use ragstrap_detector::{DetectError, DAEMON_BINARY};

use crate::error::DaemonError;
use crate::paths::{install_command, running_probe, serve_command};

/// What the start step found or did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonStatus {
    AlreadyInstalled,
    Installed,
    AlreadyRunning,
    Started,
}

/// Install Ollama via the official script unless `ollama` is already on `PATH`.
///
/// An unsupported platform fails before any command is run.
pub fn ensure_installed(platform: &Platform, runner: &dyn Runner) -> Result<DaemonStatus, DaemonError> {
    if runner.has(DAEMON_BINARY) {
        tracing::debug!("{DAEMON_BINARY} already on PATH");
        return Ok(DaemonStatus::AlreadyInstalled);
    }
    match platform {
        Platform::MacOs | Platform::Linux => {
            tracing::info!("installing Ollama on {platform}");
            runner.run(&install_command())?;
            Ok(DaemonStatus::Installed)
        }
        Platform::Unknown(_) => Err(DetectError::UnsupportedPlatform {
            platform: platform.clone(),
            component: "Ollama (see https://ollama.com/download)",
        }
        .into()),
    }
}

/// `true` if a process named exactly `ollama` exists.
///
/// A probe that cannot be started (no `pgrep` on the host) counts as "not
/// running", the same as a probe that finds nothing.
pub fn is_running(runner: &dyn Runner) -> Result<bool, DaemonError> {
    match runner.capture(&running_probe()) {
        Ok(output) => Ok(output.success),
        Err(CoreError::Spawn { command, source }) => {
            tracing::warn!("could not run `{command}` ({source}); assuming ollama is not running");
            Ok(false)
        }
        Err(err) => Err(err.into()),
    }
}

/// Start `ollama serve` in the background unless it is already running, then
/// wait `startup_delay`. There is no readiness check beyond the wait.
pub fn ensure_running(runner: &dyn Runner, startup_delay: Duration) -> Result<DaemonStatus, DaemonError> {
    if is_running(runner)? {
        tracing::debug!("ollama already running");
        return Ok(DaemonStatus::AlreadyRunning);
    }
    runner.spawn_detached(&serve_command())?;
    tracing::info!("waiting {}s for ollama to start", startup_delay.as_secs());
    runner.sleep(startup_delay);
    Ok(DaemonStatus::Started)
}

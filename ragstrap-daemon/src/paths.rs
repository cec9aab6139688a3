//! Fixed names and command lines for the Ollama CLI.

use ragstrap_core::{CommandSpec, ModelName};
use ragstrap_detector::DAEMON_BINARY;

/// Official install script; identical on macOS and Linux.
pub const INSTALL_SCRIPT_URL: &str = "https://ollama.com/install.sh";

/// Process name matched exactly by `pgrep -x`.
pub const PROCESS_NAME: &str = "ollama";

pub fn install_command() -> CommandSpec {
    CommandSpec::shell(format!("curl -fsSL {INSTALL_SCRIPT_URL} | sh"))
}

pub fn running_probe() -> CommandSpec {
    CommandSpec::new("pgrep").args(["-x", PROCESS_NAME])
}

pub fn serve_command() -> CommandSpec {
    CommandSpec::new(DAEMON_BINARY).arg("serve")
}

pub fn list_command() -> CommandSpec {
    CommandSpec::new(DAEMON_BINARY).arg("list")
}

pub fn pull_command(model: &ModelName) -> CommandSpec {
    CommandSpec::new(DAEMON_BINARY).arg("pull").arg(model.as_str())
}

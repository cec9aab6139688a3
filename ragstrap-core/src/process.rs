//! Process execution seam.
//!
//! Every stage talks to the outside world through [`Runner`]: PATH lookup,
//! blocking runs with inherited stdio, captured runs, and detached spawns.
//! [`SystemRunner`] is the real implementation; tests use
//! [`testing::FakeRunner`].

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Command description
// ---------------------------------------------------------------------------

/// A program invocation, independent of how it is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, OsString)>,
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// `sudo <program> <args…>`
    pub fn sudo(program: impl Into<String>) -> Self {
        Self::new("sudo").arg(program)
    }

    /// `sh -c <script>`
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }

    /// Build the equivalent `std::process::Command`.
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        for (key, value) in &self.envs {
            command.env(key, value);
        }
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Result of a captured run. A non-zero exit is data here, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
        }
    }

    pub fn failure(code: i32) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

pub trait Runner {
    /// Resolve `program` on `PATH`.
    fn which(&self, program: &str) -> Option<PathBuf>;

    /// Run to completion with inherited stdio; non-zero exit is an error.
    fn run(&self, cmd: &CommandSpec) -> Result<(), CoreError>;

    /// Run to completion capturing stdout; stdin is closed.
    fn capture(&self, cmd: &CommandSpec) -> Result<CommandOutput, CoreError>;

    /// Start a background process and return immediately without waiting.
    fn spawn_detached(&self, cmd: &CommandSpec) -> Result<(), CoreError>;

    fn sleep(&self, duration: Duration);

    /// `true` when `program` resolves on `PATH`.
    fn has(&self, program: &str) -> bool {
        self.which(program).is_some()
    }
}

/// Runs real processes on the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn which(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    fn run(&self, cmd: &CommandSpec) -> Result<(), CoreError> {
        tracing::info!("running: {cmd}");
        let status = cmd.to_command().status().map_err(|e| spawn_err(cmd, e))?;
        if status.success() {
            return Ok(());
        }
        Err(CoreError::CommandFailed {
            command: cmd.to_string(),
            code: status.code(),
        })
    }

    fn capture(&self, cmd: &CommandSpec) -> Result<CommandOutput, CoreError> {
        tracing::debug!("capturing: {cmd}");
        let output = cmd
            .to_command()
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| spawn_err(cmd, e))?;
        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    fn spawn_detached(&self, cmd: &CommandSpec) -> Result<(), CoreError> {
        tracing::info!("spawning in background: {cmd}");
        let mut command = cmd.to_command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        detach_process_group(&mut command);
        // Never waited on, like `cmd &` in a shell; the daemon outlives us.
        let child = command.spawn().map_err(|e| spawn_err(cmd, e))?;
        tracing::debug!("background pid {}", child.id());
        Ok(())
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

fn spawn_err(cmd: &CommandSpec, source: std::io::Error) -> CoreError {
    CoreError::Spawn {
        command: cmd.to_string(),
        source,
    }
}

// A Ctrl-C aimed at the bootstrapper must not take the daemon down with it.
#[cfg(unix)]
fn detach_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn detach_process_group(_command: &mut Command) {}

/// Prepend `dir` to the current `PATH`, as `source <venv>/bin/activate` does.
pub fn path_with_prefix(dir: &Path) -> OsString {
    let mut paths = vec![dir.to_path_buf()];
    if let Some(existing) = std::env::var_os("PATH") {
        paths.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(paths).unwrap_or_else(|_| dir.as_os_str().to_owned())
}

// ---------------------------------------------------------------------------
// Test double
// ---------------------------------------------------------------------------

#[cfg(any(test, feature = "testing"))]
pub mod testing {
    //! Recording [`Runner`] for stage tests. Nothing is executed; every call is
    //! recorded as its rendered command line.

    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::path::PathBuf;
    use std::time::Duration;

    use super::{CommandOutput, CommandSpec, Runner};
    use crate::error::CoreError;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Run(String),
        Capture(String),
        Spawn(String),
        Sleep(Duration),
    }

    #[derive(Debug, Default)]
    pub struct FakeRunner {
        binaries: HashSet<String>,
        captures: HashMap<String, CommandOutput>,
        failing: HashSet<String>,
        unspawnable: HashSet<String>,
        calls: RefCell<Vec<Call>>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make `program` resolvable on the fake `PATH`.
        pub fn with_binary(mut self, program: &str) -> Self {
            self.binaries.insert(program.to_string());
            self
        }

        /// Script the output of a captured command line.
        pub fn with_capture(mut self, line: &str, output: CommandOutput) -> Self {
            self.captures.insert(line.to_string(), output);
            self
        }

        /// Make a blocking run of `line` exit with status 1.
        pub fn failing(mut self, line: &str) -> Self {
            self.failing.insert(line.to_string());
            self
        }

        /// Make any call of `line` fail as if the program were not installed.
        pub fn unspawnable(mut self, line: &str) -> Self {
            self.unspawnable.insert(line.to_string());
            self
        }

        fn check_spawnable(&self, line: &str) -> Result<(), CoreError> {
            if self.unspawnable.contains(line) {
                return Err(CoreError::Spawn {
                    command: line.to_string(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            Ok(())
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        /// Command lines of every `run` and `spawn_detached`, in order.
        pub fn executed(&self) -> Vec<String> {
            self.calls
                .borrow()
                .iter()
                .filter_map(|c| match c {
                    Call::Run(line) | Call::Spawn(line) => Some(line.clone()),
                    _ => None,
                })
                .collect()
        }

        pub fn ran(&self, line: &str) -> bool {
            self.executed().iter().any(|l| l == line)
        }

        pub fn ran_prefix(&self, prefix: &str) -> bool {
            self.executed().iter().any(|l| l.starts_with(prefix))
        }
    }

    impl Runner for FakeRunner {
        fn which(&self, program: &str) -> Option<PathBuf> {
            self.binaries
                .contains(program)
                .then(|| PathBuf::from("/usr/bin").join(program))
        }

        fn run(&self, cmd: &CommandSpec) -> Result<(), CoreError> {
            let line = cmd.to_string();
            self.calls.borrow_mut().push(Call::Run(line.clone()));
            self.check_spawnable(&line)?;
            if self.failing.contains(&line) {
                return Err(CoreError::CommandFailed {
                    command: line,
                    code: Some(1),
                });
            }
            materialize_venv(cmd);
            Ok(())
        }

        fn capture(&self, cmd: &CommandSpec) -> Result<CommandOutput, CoreError> {
            let line = cmd.to_string();
            self.calls.borrow_mut().push(Call::Capture(line.clone()));
            self.check_spawnable(&line)?;
            Ok(self
                .captures
                .get(&line)
                .cloned()
                .unwrap_or_else(|| CommandOutput::failure(1)))
        }

        fn spawn_detached(&self, cmd: &CommandSpec) -> Result<(), CoreError> {
            let line = cmd.to_string();
            self.calls.borrow_mut().push(Call::Spawn(line.clone()));
            self.check_spawnable(&line)
        }

        fn sleep(&self, duration: Duration) {
            self.calls.borrow_mut().push(Call::Sleep(duration));
        }
    }

    // `python3 -m venv <dir>` leaves a directory behind; mimic that so later
    // stages see the same filesystem a real run would.
    fn materialize_venv(cmd: &CommandSpec) {
        let mut args = cmd.args.iter();
        while let Some(arg) = args.next() {
            if arg == "-m" {
                if args.next().map(String::as_str) == Some("venv") {
                    if let Some(target) = args.next() {
                        let base = cmd.current_dir.clone().unwrap_or_default();
                        let _ = std::fs::create_dir_all(base.join(target).join("bin"));
                    }
                }
                return;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

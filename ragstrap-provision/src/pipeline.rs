//! Ordered provisioning pipeline shared by the CLI and tests.
//!
//! [`Bootstrapper::run`] drives stages S1–S8 strictly in order and stops at the
//! first error. S0 (argument parsing) happens before it is constructed and S9
//! (launch) is left to the caller via the returned [`LaunchPlan`], because
//! `exec` never returns.

use std::fmt;
use std::path::PathBuf;

use ragstrap_core::{EnvEdit, ModelName, Platform, Runner, Settings, Stage};
use ragstrap_daemon::{ensure_installed, ensure_pulled, ensure_running, DaemonStatus, ModelStatus};
use ragstrap_detector::check_workspace;

use crate::error::ProvisionError;
use crate::launch::LaunchPlan;
use crate::runtime::{ensure_runtime, RuntimeStatus};
use crate::venv::Venv;
use crate::writer::write_env_file;

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

/// How a stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Done(String),
    Skipped(String),
}

impl StageOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, StageOutcome::Skipped(_))
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageOutcome::Done(detail) | StageOutcome::Skipped(detail) => f.write_str(detail),
        }
    }
}

/// Progress sink for stage transitions.
pub trait Reporter {
    fn started(&mut self, stage: Stage);
    fn finished(&mut self, stage: Stage, outcome: &StageOutcome);
}

#[derive(Debug, Default)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn started(&mut self, _stage: Stage) {}
    fn finished(&mut self, _stage: Stage, _outcome: &StageOutcome) {}
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Everything a successful run did, in stage order.
#[derive(Debug, Clone)]
pub struct BootstrapReport {
    pub model: ModelName,
    pub runtime: RuntimeStatus,
    pub daemon_install: DaemonStatus,
    pub daemon_start: DaemonStatus,
    pub model_status: ModelStatus,
    /// `true` if an existing virtualenv was deleted before recreation.
    pub venv_replaced: bool,
    pub env_edit: EnvEdit,
    pub outcomes: Vec<(Stage, StageOutcome)>,
    pub launch: LaunchPlan,
}

impl BootstrapReport {
    pub fn skipped(&self) -> Vec<Stage> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_skipped())
            .map(|(s, _)| *s)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Bootstrapper
// ---------------------------------------------------------------------------

pub struct Bootstrapper<'a> {
    root: PathBuf,
    settings: Settings,
    model: ModelName,
    platform: Platform,
    runner: &'a dyn Runner,
}

impl<'a> Bootstrapper<'a> {
    /// `root` should be absolute; every path the pipeline hands to external
    /// programs is derived from it.
    pub fn new(
        root: PathBuf,
        settings: Settings,
        model: ModelName,
        platform: Platform,
        runner: &'a dyn Runner,
    ) -> Self {
        Self {
            root,
            settings,
            model,
            platform,
            runner,
        }
    }

    /// Run S1–S8. Stops at the first failing stage; nothing is rolled back.
    pub fn run(&self, reporter: &mut dyn Reporter) -> Result<BootstrapReport, ProvisionError> {
        let mut outcomes = Vec::new();
        let mut record = |stage: Stage, outcome: StageOutcome, reporter: &mut dyn Reporter| {
            tracing::debug!(stage = %stage, outcome = %outcome, "stage finished");
            reporter.finished(stage, &outcome);
            outcomes.push((stage, outcome));
        };

        // S1
        reporter.started(Stage::Precondition);
        self.settings.validate()?;
        let workspace = check_workspace(&self.root, &self.settings)?;
        record(
            Stage::Precondition,
            StageOutcome::Done(format!(
                "found {} and {}",
                self.settings.entry_file.display(),
                self.settings.manifest_file.display()
            )),
            reporter,
        );

        // S2
        reporter.started(Stage::Runtime);
        let runtime = ensure_runtime(&self.platform, self.runner)?;
        record(
            Stage::Runtime,
            match runtime {
                RuntimeStatus::AlreadyInstalled => {
                    StageOutcome::Skipped("python3 already installed".to_string())
                }
                RuntimeStatus::Installed(pm) => {
                    StageOutcome::Done(format!("installed Python 3 with {pm}"))
                }
            },
            reporter,
        );

        // S3
        reporter.started(Stage::DaemonInstall);
        let daemon_install = ensure_installed(&self.platform, self.runner)?;
        record(
            Stage::DaemonInstall,
            match daemon_install {
                DaemonStatus::Installed => StageOutcome::Done("installed Ollama".to_string()),
                _ => StageOutcome::Skipped("ollama already installed".to_string()),
            },
            reporter,
        );

        // S4
        reporter.started(Stage::DaemonStart);
        let daemon_start = ensure_running(self.runner, self.settings.daemon_startup_delay())?;
        record(
            Stage::DaemonStart,
            match daemon_start {
                DaemonStatus::Started => StageOutcome::Done(format!(
                    "started ollama serve, waited {}s",
                    self.settings.daemon_startup_delay_secs
                )),
                _ => StageOutcome::Skipped("ollama already running".to_string()),
            },
            reporter,
        );

        // S5
        reporter.started(Stage::ModelPull);
        let model_status = ensure_pulled(self.runner, &self.model)?;
        record(
            Stage::ModelPull,
            match model_status {
                ModelStatus::Pulled => StageOutcome::Done(format!("pulled {}", self.model)),
                ModelStatus::AlreadyPresent => {
                    StageOutcome::Skipped(format!("{} already pulled", self.model))
                }
            },
            reporter,
        );

        // S6
        reporter.started(Stage::EnvReset);
        let venv = Venv::new(&self.root, &self.settings.venv_dir);
        let venv_replaced = venv.recreate(&self.root, self.runner)?;
        record(
            Stage::EnvReset,
            StageOutcome::Done(if venv_replaced {
                format!("replaced {}", self.settings.venv_dir.display())
            } else {
                format!("created {}", self.settings.venv_dir.display())
            }),
            reporter,
        );

        // S7
        reporter.started(Stage::DepsInstall);
        venv.install_requirements(&workspace.manifest_file, self.runner)?;
        record(
            Stage::DepsInstall,
            StageOutcome::Done(format!(
                "installed {}",
                self.settings.manifest_file.display()
            )),
            reporter,
        );

        // S8
        reporter.started(Stage::ConfigReconcile);
        let env_path = self.root.join(&self.settings.env_file);
        let env_edit = write_env_file(&env_path, &self.model)?;
        let detail = format!(
            "{} {} (OLLAMA_MODEL={})",
            env_edit,
            self.settings.env_file.display(),
            self.model
        );
        record(
            Stage::ConfigReconcile,
            if env_edit == EnvEdit::Unchanged {
                StageOutcome::Skipped(detail)
            } else {
                StageOutcome::Done(detail)
            },
            reporter,
        );

        let launch = LaunchPlan::new(&venv, self.root.clone(), &self.settings.entry_file);

        Ok(BootstrapReport {
            model: self.model.clone(),
            runtime,
            daemon_install,
            daemon_start,
            model_status,
            venv_replaced,
            env_edit,
            outcomes,
            launch,
        })
    }
}

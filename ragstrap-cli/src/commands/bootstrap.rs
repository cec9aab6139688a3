//! `ragstrap [MODEL_NAME]`: provision the application directory, then run it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use ragstrap_core::{ModelName, Platform, Settings, SystemRunner};
use ragstrap_provision::{BootstrapReport, Bootstrapper, StageOutcome};
use tabled::{settings::Style, Table, Tabled};

use crate::progress::ConsoleReporter;

#[derive(Args, Debug)]
pub struct BootstrapArgs {
    /// Ollama model to pull and write to `.env` as OLLAMA_MODEL [default: llama3.2].
    #[arg(value_name = "MODEL_NAME")]
    pub model: Option<String>,

    /// Application directory holding app.py and requirements.txt.
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub dir: PathBuf,

    /// Settings file to use instead of `<dir>/ragstrap.yaml`.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Provision everything and print the launch command instead of running it.
    #[arg(long)]
    pub no_launch: bool,
}

impl BootstrapArgs {
    /// Returns the exit status the process should end with.
    pub fn run(self) -> Result<i32> {
        let root = self
            .dir
            .canonicalize()
            .with_context(|| format!("cannot open application directory {}", self.dir.display()))?;
        let settings = Settings::resolve(&root, self.config.as_deref())
            .context("failed to load settings")?;
        let model = self
            .model
            .map(ModelName::from)
            .unwrap_or_else(|| settings.default_model());

        let platform = Platform::current();
        tracing::debug!(%platform, %model, root = %root.display(), "starting bootstrap");

        let runner = SystemRunner;
        let mut reporter = ConsoleReporter;
        let report = Bootstrapper::new(root, settings, model, platform, &runner)
            .run(&mut reporter)
            .context("bootstrap aborted")?;

        print_summary(&report);

        if self.no_launch {
            println!("{} {}", "launch:".bold(), report.launch);
            return Ok(0);
        }

        println!("{} {}", "→".cyan(), ragstrap_core::Stage::Launch.to_string().bold());
        let code = report
            .launch
            .exec()
            .context("failed to launch application")?;
        Ok(code)
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Stage")]
    stage: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

fn print_summary(report: &BootstrapReport) {
    let rows: Vec<SummaryRow> = report
        .outcomes
        .iter()
        .map(|(stage, outcome)| SummaryRow {
            stage: stage.to_string(),
            result: match outcome {
                StageOutcome::Done(_) => "done".to_string(),
                StageOutcome::Skipped(_) => "skipped".to_string(),
            },
            detail: outcome.to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let skipped = report.skipped().len();
    println!(
        "{} stages performed, {} skipped; model {}",
        report.outcomes.len() - skipped,
        skipped,
        report.model.as_str().bold()
    );
}

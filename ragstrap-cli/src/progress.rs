//! Colored stage lines on stdout.

use colored::Colorize;
use ragstrap_core::Stage;
use ragstrap_provision::{Reporter, StageOutcome};

#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn started(&mut self, stage: Stage) {
        println!("{} {}", "→".cyan(), stage.to_string().bold());
    }

    fn finished(&mut self, stage: Stage, outcome: &StageOutcome) {
        match outcome {
            StageOutcome::Done(detail) => {
                println!("{} {} ({})", "✓".green(), stage, detail);
            }
            StageOutcome::Skipped(detail) => {
                println!("{} {} ({})", "↷".yellow(), stage, detail.dimmed());
            }
        }
    }
}

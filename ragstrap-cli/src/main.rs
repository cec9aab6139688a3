//! ragstrap: provision a local Ollama-backed Python application and launch it.
//!
//! # Usage
//!
//! ```text
//! ragstrap [MODEL_NAME] [--dir PATH] [--config PATH] [--no-launch]
//! ```

mod commands;
mod progress;
mod signals;

use clap::Parser;
use colored::Colorize;

use commands::bootstrap::BootstrapArgs;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "ragstrap",
    version,
    about = "Install Python and Ollama, pull a model, rebuild the virtualenv, then run app.py",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    bootstrap: BootstrapArgs,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    // Help, version and usage errors exit here, before anything is touched.
    let cli = Cli::parse();

    init_tracing();
    if let Err(err) = signals::install() {
        tracing::warn!("could not install signal handler: {err}");
    }

    match cli.bootstrap.run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

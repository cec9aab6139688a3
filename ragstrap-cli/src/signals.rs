//! Interrupt handling.
//!
//! SIGINT and SIGTERM abort the run with exit status 1. Nothing already done
//! is rolled back; the `.env` write is atomic so it is never left half-written.

use colored::Colorize;

pub fn install() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        eprintln!("{} interrupted, aborting", "error:".red().bold());
        std::process::exit(1);
    })
}

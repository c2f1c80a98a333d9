use clap::Parser;
use projectindex::cli::{commands, Cli};
use projectindex::logging;
use std::process::ExitCode;

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();
    let root = cli.root.clone().unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    match commands::run(cli.command, &root) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            for hint in e.recovery_suggestions() {
                eprintln!("  hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

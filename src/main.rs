//! ltag binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    match labeltree::cli::run() {
        Ok(code) => code,
        Err(err) => {
            labeltree::ui::output::error(format!("{err:#}"));
            ExitCode::from(2)
        }
    }
}

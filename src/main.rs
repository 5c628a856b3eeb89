//! Pagepack - Command-line dispatcher for page bundle jobs

use std::process::ExitCode;

use pagepack::cli;

fn main() -> ExitCode {
    cli::run()
}

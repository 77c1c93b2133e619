use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match nexus_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::debug!(error = ?error, "command failed");
            let _ = writeln!(io::stderr().lock(), "{}", nexus_cli::failure_message(&error));
            ExitCode::FAILURE
        }
    }
}

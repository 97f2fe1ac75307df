//! Entry point for the `vwmd` display server binary.

use std::process::ExitCode;

#[expect(
    clippy::print_stderr,
    reason = "telemetry is not installed when bootstrap itself failed"
)]
fn main() -> ExitCode {
    match vwmd::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(target: "vwmd", %error, "display server exited with an error");
            eprintln!("vwmd: {error}");
            ExitCode::FAILURE
        }
    }
}

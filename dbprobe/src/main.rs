//! MySQL connectivity checker.
//!
//! Parses `--key value` connection flags, opens one connection, runs
//! `SELECT 1 AS test_column` and `SHOW TABLES`, prints the results and
//! exits 0. Any failure is reported on stderr with exit status 1.
//!
//! # Security Guarantees
//! - The password is never printed or logged
//! - Read-only statements only
//! - No files written, no state persisted

use dbprobe::{Cli, LogOptions, report_error, run};
use dbprobe_core::init_logging;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned());
    let cli = match Cli::from_args(args) {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too, and they are not failures
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let flags = cli.flags();
    let log = LogOptions::from_flags(&flags);
    if let Err(e) = init_logging(log.verbose, log.quiet) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let mut stdout = std::io::stdout().lock();
    match run(&flags, &mut stdout).await {
        Ok(report) => {
            info!(
                "✓ Probe of {} {} completed",
                report.server.product, report.server.version
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            drop(stdout);
            if !e.is_configuration() {
                error!("Probe failed: {}", e);
            }
            let _ = report_error(&e, &mut std::io::stderr().lock());
            ExitCode::FAILURE
        }
    }
}

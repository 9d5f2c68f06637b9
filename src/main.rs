//! shell-scribe binary entry point.

use std::process::ExitCode;
use std::time::Duration;

use shell_scribe::{cli, logging, Config, InputOutcome, SessionController};
use tracing::{error, info};

/// Grace period for blocked PTY threads once the session is over.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Try 'shell-scribe --help' for more information.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_with_filter(Some(config.log_filter()));
    info!("shell-scribe v{}", env!("CARGO_PKG_VERSION"));

    let controller = match SessionController::from_config(&config) {
        Ok(controller) => controller,
        Err(e) => {
            error!("startup failed: {}", e);
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(
        transcript = %config.transcript.path.display(),
        shell = %config.shell_program(),
        "recording session"
    );

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(controller.run());
    // A reader thread may still be parked on the PTY; don't wait forever.
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);

    match result {
        Ok(InputOutcome::ExitToken) | Ok(InputOutcome::EndOfInput) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

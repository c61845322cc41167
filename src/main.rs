//! Entry point for the `roadlock` CLI. Parses arguments, installs logging,
//! dispatches to the command handler and maps errors to exit codes.

use roadlock::cli::Cli;
use roadlock::{commands, exit_codes, telemetry};
use serde_json::json;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    telemetry::init(cli.verbose);

    match commands::dispatch(cli.command, cli.json) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            if cli.json {
                println!(
                    "{}",
                    json!({"error": {"kind": err.kind(), "message": err.to_string()}})
                );
            } else {
                eprintln!("Error: {}", err);
            }

            ExitCode::from(err.exit_code() as u8)
        }
    }
}

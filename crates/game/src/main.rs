mod app;

use std::env;
use std::process::ExitCode;

use app::bootstrap::{self, CliCommand};
use tracing::error;

fn main() -> ExitCode {
    let args = env::args().skip(1).collect::<Vec<_>>();
    let cli = match bootstrap::parse_args(&args) {
        Ok(CliCommand::Run(cli)) => cli,
        Ok(CliCommand::Help) => {
            println!("{}", bootstrap::usage_text());
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{message}\n\n{}", bootstrap::usage_text());
            return ExitCode::from(2);
        }
    };

    bootstrap::init_tracing();
    match bootstrap::build_app(cli) {
        Ok(wiring) => app::loop_runner::run(wiring),
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}

use std::process::ExitCode;

use clap::Parser;
use framegrab_cli::{Cli, init_tracing, run};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("framegrab: {e}");
            ExitCode::FAILURE
        }
    }
}

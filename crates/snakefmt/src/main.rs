use std::process::ExitCode;

use clap::Parser;

use snakefmt::args::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match snakefmt::run(cli) {
        Ok(status) => status.into(),
        Err(err) => {
            eprintln!("error: {err:?}");
            ExitCode::from(123)
        }
    }
}

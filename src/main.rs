use clap::Parser;
use portfolio_tracker::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}

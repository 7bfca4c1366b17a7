use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use gems_runner::cli::{Args, Command};
use gems_runner::runtime;

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match args.into_command()? {
        Command::ListApi => {
            runtime::print_api();
            Ok(())
        }
        Command::Run(run) => runtime::execute(run),
    }
}

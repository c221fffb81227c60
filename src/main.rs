use clap::Parser;
use eyre::Result;
use hoopoes::prelude::*;
use hoopoes::logger;

mod cli;

use cli::{Args, Command};

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = settings::read(args.config.as_str())?;
    logger::setup_log(&settings)?;
    settings.write()?;
    tracing::info!("Using settings from {}", args.config);

    match args.command {
        Command::Observe => {
            entrypoints::observe(&settings)?;
        }
        Command::Hm => {
            entrypoints::history_match(&settings)?;
        }
        Command::AnalyseHm => {
            entrypoints::analyse_hm(&settings)?;
        }
        Command::Abc => {
            entrypoints::abc(&settings)?;
        }
        Command::AnalyseAbc => {
            entrypoints::analyse_abc(&settings)?;
        }
        Command::All => {
            entrypoints::run_all(&settings)?;
        }
        Command::Status => {
            print!("{}", entrypoints::status(&settings)?);
        }
    }

    Ok(())
}

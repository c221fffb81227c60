use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Path to config TOML
    #[arg(long, default_value = "config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Sample the ground-truth parameters and generate their observations
    Observe,
    /// Run history matching for every observed sample
    Hm,
    /// Summarise the history matching results
    AnalyseHm,
    /// Run ABC rejection with and without the history matching prior
    Abc,
    /// Compare the ABC rejection runs
    AnalyseAbc,
    /// Run every stage in turn
    All,
    /// Count the samples in each state
    Status,
}

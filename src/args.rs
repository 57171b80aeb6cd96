use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[clap(name = "filter-import")]
#[clap(author, version, about)]
pub struct Args {
    /// Path to the exported filter feed to import.
    #[clap(short, long)]
    pub file: PathBuf,
    /// Display name of the mailbox to import into.
    #[clap(short, long)]
    pub user: Option<String>,
    /// Path to the rule store file.
    #[clap(short, long, default_value = "rules.xml")]
    pub store: PathBuf,
    /// Print each filter as it is applied.
    #[clap(short, long)]
    pub verbose: bool,
    /// Suppress any progress output if set.
    #[clap(short, long)]
    pub quiet: bool,
}

mod args;
mod feed;
mod reduce;
mod report;
mod store;
mod sync;

use anyhow::{Context, Result};
use args::Args;
use clap::Parser;
use report::{ConsoleReporter, Reporter, RunTotals};
use std::fs;
use store::LocalRuleStore;

fn main() -> Result<()> {
    do_main(&Args::parse())
}

fn do_main(args: &Args) -> Result<()> {
    let document = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    eprintln!("Parsing {}...", args.file.display());
    let groups = feed::parse_feed(&document)?;
    let reduction = reduce::reduce_entries(groups);

    let mut store = LocalRuleStore::open(&args.store, args.user.as_deref())?;

    eprintln!(
        "Applying {} filters to mailbox {}...",
        reduction.entries.len(),
        store.mailbox_name()
    );
    let mut reporter = ConsoleReporter::new(reduction.entries.len(), args.verbose, args.quiet);
    let outcomes = sync::synchronize(&reduction.entries, &mut store, &mut reporter);

    reporter.run_summary(&RunTotals::tally(&outcomes, reduction.discarded));
    Ok(())
}

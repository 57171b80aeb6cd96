use crate::reduce::FilterEntry;
use crate::sync::SyncOutcome;
use indicatif::ProgressBar;

/// Aggregate counts for one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    pub discarded: usize,
}

impl RunTotals {
    pub fn tally(outcomes: &[SyncOutcome], discarded: usize) -> Self {
        let mut totals = RunTotals {
            discarded,
            ..RunTotals::default()
        };
        for outcome in outcomes {
            match outcome {
                SyncOutcome::Created => totals.created += 1,
                SyncOutcome::SkippedAlreadyExists => totals.skipped += 1,
                SyncOutcome::Failed(_) => totals.failed += 1,
            }
        }
        totals
    }
}

/// Receives structured result events; owns all display concerns. The
/// synchronization engine emits values only and never writes to a display
/// surface itself.
pub trait Reporter {
    /// Called once per processed entry, in processing order.
    fn entry_outcome(&mut self, entry: &FilterEntry, outcome: &SyncOutcome);

    /// Called once at the end of a run.
    fn run_summary(&mut self, totals: &RunTotals);
}

/// Progress bar on stderr, per-entry lines when verbose, summary at the end.
pub struct ConsoleReporter {
    progress: ProgressBar,
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(len: usize, verbose: bool, quiet: bool) -> Self {
        let progress = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(len as u64)
        };
        ConsoleReporter { progress, verbose }
    }
}

impl Reporter for ConsoleReporter {
    fn entry_outcome(&mut self, entry: &FilterEntry, outcome: &SyncOutcome) {
        if self.verbose {
            let status = match outcome {
                SyncOutcome::Created => "created".to_string(),
                SyncOutcome::SkippedAlreadyExists => "already exists".to_string(),
                SyncOutcome::Failed(e) => format!("failed: {}", e),
            };
            self.progress.println(format!(
                "{} -> {}: {}",
                entry.sender, entry.destination_label, status
            ));
        }
        self.progress.inc(1);
    }

    fn run_summary(&mut self, totals: &RunTotals) {
        self.progress.finish_and_clear();
        eprintln!(
            "{} created, {} already present, {} failed, {} discarded",
            totals.created, totals.skipped, totals.failed, totals.discarded
        );
    }
}

/// Discards all events.
pub struct NullReporter;

impl Reporter for NullReporter {
    fn entry_outcome(&mut self, _entry: &FilterEntry, _outcome: &SyncOutcome) {}

    fn run_summary(&mut self, _totals: &RunTotals) {}
}

use crate::{
    cmd::{print_json, rule, Result},
    experiment::{self, ExperimentRecord},
    matcher::MatchStrategy,
    properties::PropertyMapper,
    settings::Settings,
    store::Store,
    sync::{self, Progress, SyncOutcome},
    Error,
};
use std::path::PathBuf;

/// Create or update a database page for every experiment in the input.
///
/// This is the default command.
#[derive(Debug, Default, clap::Args)]
pub struct Cmd {
    /// The CSV file to read, overriding the configured input
    input: Option<PathBuf>,
    /// Print the outcome as JSON after the summary
    #[arg(long)]
    json: bool,
}

impl Cmd {
    pub async fn run(&self, settings: &Settings) -> Result {
        let credentials = settings.credentials()?;
        let input = settings.input(self.input.as_deref())?;

        println!("Starting sync to Notion...");
        println!("CSV file: {}", input.display());
        println!("Database ID: {}", credentials.database_id);

        let records = experiment::read(&input, settings.sync.delimiter)?;
        println!("Found {} experiments in CSV", records.len());

        let client = settings.client(&credentials)?;
        if settings.sync.matching == MatchStrategy::Index {
            println!("Fetching existing pages from Notion...");
        }
        let outcome = upsert(
            &client,
            &credentials.database_id,
            &records,
            &settings.mapper(),
            settings.sync.matching,
        )
        .await?;

        print_summary(&outcome);
        if self.json {
            print_json(&outcome)?;
        }
        finish(&outcome, &settings.sync.station_options)
    }
}

/// Run the sync, turning a failed index build into an outcome so it is
/// reported like any other run where nothing was written.
async fn upsert<S>(
    store: &S,
    database_id: &str,
    records: &[ExperimentRecord],
    mapper: &PropertyMapper,
    strategy: MatchStrategy,
) -> crate::Result<SyncOutcome>
where
    S: Store + ?Sized,
{
    match sync::run(store, database_id, records, mapper, strategy, print_progress).await {
        Err(Error::Remote(err)) => {
            let message = format!("Error fetching existing pages: {err}");
            print_progress(Progress::Failed(&message));
            Ok(SyncOutcome::aborted(records.len(), message))
        }
        result => result,
    }
}

fn print_progress(progress: Progress<'_>) {
    match progress {
        Progress::Indexed(count) => println!("Found {count} existing pages in Notion"),
        Progress::Created(name) => println!("+ Created: {name}"),
        Progress::Updated(name) => println!("✓ Updated: {name}"),
        Progress::Failed(message) => println!("✗ {message}"),
    }
}

/// How a finished run is reported.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Verdict {
    Success,
    /// Some records failed, others were written.
    Partial,
    /// Nothing was written from a non-empty input.
    Systemic,
}

impl From<&SyncOutcome> for Verdict {
    fn from(outcome: &SyncOutcome) -> Self {
        if outcome.is_systemic_failure() {
            Self::Systemic
        } else if outcome.has_failures() {
            Self::Partial
        } else {
            Self::Success
        }
    }
}

/// Print the follow-up for the outcome. Only a systemic failure is an error.
fn finish(outcome: &SyncOutcome, station_options: &[String]) -> Result {
    match Verdict::from(outcome) {
        Verdict::Systemic => {
            print_troubleshooting(station_options);
            print_errors(outcome, 3);
            anyhow::bail!("no pages were created or updated");
        }
        Verdict::Partial => {
            println!("\n⚠️  Warning: {} operation(s) failed", outcome.failed);
            print_errors(outcome, 5);
            Ok(())
        }
        Verdict::Success => Ok(()),
    }
}

fn print_summary(outcome: &SyncOutcome) {
    println!();
    rule(60);
    println!("Sync complete!");
    println!("Created: {} pages", outcome.created);
    println!("Updated: {} pages", outcome.updated);
    println!("Errors: {}", outcome.failed);
    rule(60);
}

fn print_troubleshooting(station_options: &[String]) {
    let options = station_options
        .iter()
        .map(|option| format!("'{option}'"))
        .collect::<Vec<_>>()
        .join(" and ");
    println!("\n⚠️  WARNING: No pages were created or updated!");
    println!("\nCommon issues:");
    println!("1. Database not shared with integration");
    println!("   → Open database in Notion → Click '...' → 'Add connections' → Select integration");
    println!("\n2. Property type mismatch");
    println!("   → Ensure 'Station' property is type 'Select' (not 'Text')");
    println!("   → Ensure 'Station' has options: {options}");
    println!("\n3. Invalid database ID or token");
    println!("   → Verify NOTION_DATABASE_ID in secrets");
    println!("   → Verify NOTION_TOKEN is valid and not expired");
}

fn print_errors(outcome: &SyncOutcome, limit: usize) {
    if outcome.errors.is_empty() {
        return;
    }
    println!("\nFirst few errors:");
    for error in outcome.errors.iter().take(limit) {
        println!("  • {error}");
    }
}

use crate::{
    experiment::ExperimentRecord,
    matcher::{MatchStrategy, Matcher},
    properties::PropertyMapper,
    store::Store,
    Result,
};
use serde::Serialize;
use std::time::Instant;

/// Counters and error messages accumulated over one sync run.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SyncOutcome {
    /// Records read from the input, including skipped ones
    pub read: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    /// Records without a name
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl SyncOutcome {
    /// True when nothing was created or updated from a non-empty input,
    /// which points at configuration (sharing, schema, credentials) rather
    /// than at individual records.
    pub fn is_systemic_failure(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.read > 0
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// The outcome of a run that stopped before writing any page.
    pub fn aborted(read: usize, message: String) -> Self {
        Self {
            read,
            failed: 1,
            errors: vec![message],
            ..Default::default()
        }
    }
}

/// Reported to the caller as a run makes progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress<'a> {
    /// The remote index was built with this many pages.
    Indexed(usize),
    Created(&'a str),
    Updated(&'a str),
    /// A record failed; carries the error message.
    Failed(&'a str),
}

fn fail<F>(outcome: &mut SyncOutcome, progress: &mut F, message: String)
where
    F: FnMut(Progress<'_>),
{
    progress(Progress::Failed(&message));
    outcome.failed += 1;
    outcome.errors.push(message);
}

/// Upsert every named record into the database, one at a time.
///
/// Errors from individual create, update or lookup calls are counted and do
/// not stop the run. Building the remote index is the only remote failure
/// that aborts, and it happens before any page is written.
#[tracing::instrument(skip_all, name = "sync", fields(database_id = %database_id, records = records.len()))]
pub async fn run<S, F>(
    store: &S,
    database_id: &str,
    records: &[ExperimentRecord],
    mapper: &PropertyMapper,
    strategy: MatchStrategy,
    mut progress: F,
) -> Result<SyncOutcome>
where
    S: Store + ?Sized,
    F: FnMut(Progress<'_>) + Send,
{
    let start = Instant::now();
    let mut outcome = SyncOutcome {
        read: records.len(),
        ..Default::default()
    };

    tracing::debug!(?strategy, "matching existing pages");
    let mut matcher = Matcher::new(store, database_id, strategy).await?;
    if let Some(indexed) = matcher.indexed() {
        progress(Progress::Indexed(indexed));
    }

    for record in records {
        let name = record.name.as_str();
        if name.is_empty() {
            tracing::debug!("skipping record without a name");
            outcome.skipped += 1;
            continue;
        }

        let properties = mapper.to_properties(record);
        let existing = match matcher.find(store, database_id, name).await {
            Ok(existing) => existing,
            Err(err) => {
                fail(
                    &mut outcome,
                    &mut progress,
                    format!("Error matching {name}: {err}"),
                );
                continue;
            }
        };

        match existing {
            Some(page_id) => match store.update_page(&page_id, &properties).await {
                Ok(_) => {
                    tracing::debug!(name, page_id = %page_id, "updated");
                    outcome.updated += 1;
                    progress(Progress::Updated(name));
                }
                Err(err) => fail(
                    &mut outcome,
                    &mut progress,
                    format!("Error updating {name}: {err}"),
                ),
            },
            None => match store.create_page(database_id, &properties).await {
                Ok(page) => {
                    tracing::debug!(name, page_id = %page.id, "created");
                    matcher.created(name, &page.id);
                    outcome.created += 1;
                    progress(Progress::Created(name));
                }
                Err(err) => fail(
                    &mut outcome,
                    &mut progress,
                    format!("Error creating {name}: {err}"),
                ),
            },
        }
    }

    tracing::info!(
        created = outcome.created,
        updated = outcome.updated,
        failed = outcome.failed,
        skipped = outcome.skipped,
        duration = start.elapsed().as_secs(),
        "sync completed"
    );
    Ok(outcome)
}

pub mod auth;
pub mod firestore;
pub mod sqlite;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::error::Result;
use crate::parser::Problem;
use crate::settings::{self, ServiceAccount, Settings, StoreKind};

/// A problem as it sits in the store, under its generated id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProblem {
    pub id: String,
    pub problem: Problem,
}

/// A collection-oriented document store. Ids are always assigned by the store.
pub trait ProblemStore {
    fn list(&self, collection: &str) -> Result<Vec<StoredProblem>>;

    fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Insert one problem and return the id the store gave it.
    fn insert(&self, collection: &str, problem: &Problem) -> Result<String>;

    /// Remove every entry in the collection; returns how many were removed.
    fn clear(&self, collection: &str) -> Result<usize> {
        let existing = self.list(collection)?;
        let pb = progress(existing.len(), "clear");
        for doc in &existing {
            self.delete(collection, &doc.id)?;
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(existing.len())
    }

    fn insert_all(&self, collection: &str, problems: &[Problem]) -> Result<usize> {
        let pb = progress(problems.len(), "insert");
        for problem in problems {
            self.insert(collection, problem)?;
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(problems.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceReport {
    pub removed: usize,
    pub inserted: usize,
}

/// Clear the collection, then insert `problems`. Not atomic: a failed insert
/// leaves the collection partially filled.
pub fn replace(
    store: &dyn ProblemStore,
    collection: &str,
    problems: &[Problem],
) -> Result<ReplaceReport> {
    let removed = store.clear(collection)?;
    info!(collection, removed, "Cleared collection");

    let inserted = store.insert_all(collection, problems)?;
    info!(collection, inserted, "Inserted problems");

    Ok(ReplaceReport { removed, inserted })
}

/// Open the configured backend. Credentials are loaded and exchanged here,
/// once, before any store operation.
pub fn open(settings: &Settings) -> Result<Box<dyn ProblemStore>> {
    match settings.store {
        StoreKind::Firestore => {
            let account = ServiceAccount::from_env()?;
            let emulator = settings::emulator_host();
            let store = firestore::FirestoreStore::connect(&account, emulator.as_deref())?;
            Ok(Box::new(store))
        }
        StoreKind::Sqlite => Ok(Box::new(sqlite::SqliteStore::open(&settings.sqlite_path)?)),
    }
}

fn progress(len: usize, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::with_template("{prefix:>7} [{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.set_prefix(label.to_string());
    pb
}

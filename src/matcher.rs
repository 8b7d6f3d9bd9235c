use crate::{
    properties::NAME,
    store::{self, Store},
};
use futures::TryStreamExt;
use notion::databases::{DatabaseQuery, Filter};
use serde::Deserialize;
use std::collections::HashMap;

/// How local records are matched to existing pages.
#[derive(Deserialize, PartialEq, Eq, Debug, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Page through the whole database once before syncing.
    #[default]
    Index,
    /// Issue one exact-title query per record.
    Lookup,
}

/// Experiment name to page id for every page in a database.
///
/// Duplicate titles are not an error: the page seen last in query order
/// wins.
#[derive(Debug, Clone, Default)]
pub struct RemoteIndex {
    pages: HashMap<String, String>,
}

impl RemoteIndex {
    pub async fn build<S>(store: &S, database_id: &str) -> notion::Result<Self>
    where
        S: Store + ?Sized,
    {
        let query = DatabaseQuery::default().with_page_size(notion::MAX_PAGE_SIZE);
        let index = store::all(store, database_id, query)
            .try_fold(Self::default(), |mut index, page| async move {
                if let Some(name) = page.title(NAME) {
                    index.insert(&name, &page.id);
                }
                Ok(index)
            })
            .await?;
        tracing::debug!(pages = index.len(), "built remote index");
        Ok(index)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pages.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: &str, page_id: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        if let Some(previous) = self.pages.insert(name.to_string(), page_id.to_string()) {
            tracing::debug!(name, previous = %previous, page_id, "duplicate page title");
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// The id of the first page whose title equals the given name.
pub async fn lookup<S>(store: &S, database_id: &str, name: &str) -> notion::Result<Option<String>>
where
    S: Store + ?Sized,
{
    let query = DatabaseQuery::default()
        .with_filter(Filter::title_equals(NAME, name))
        .with_page_size(1);
    let list = store.query_database(database_id, &query).await?;
    Ok(list.results.into_iter().next().map(|page| page.id))
}

/// Resolves record names to existing page ids using the configured
/// strategy.
#[derive(Debug)]
pub enum Matcher {
    Index(RemoteIndex),
    Lookup,
}

impl Matcher {
    /// Prepare a matcher. For the index strategy this pages through the
    /// whole database, so errors here are fatal to the run.
    pub async fn new<S>(store: &S, database_id: &str, strategy: MatchStrategy) -> notion::Result<Self>
    where
        S: Store + ?Sized,
    {
        match strategy {
            MatchStrategy::Index => RemoteIndex::build(store, database_id)
                .await
                .map(Self::Index),
            MatchStrategy::Lookup => Ok(Self::Lookup),
        }
    }

    pub async fn find<S>(
        &self,
        store: &S,
        database_id: &str,
        name: &str,
    ) -> notion::Result<Option<String>>
    where
        S: Store + ?Sized,
    {
        match self {
            Self::Index(index) => Ok(index.get(name).map(str::to_string)),
            Self::Lookup => lookup(store, database_id, name).await,
        }
    }

    /// Record a page created during this run so later records with the
    /// same name update it.
    pub fn created(&mut self, name: &str, page_id: &str) {
        if let Self::Index(index) = self {
            index.insert(name, page_id);
        }
    }

    /// Number of indexed pages, if this matcher holds an index.
    pub fn indexed(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(index.len()),
            Self::Lookup => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    #[tokio::test]
    async fn index_spans_all_pages() {
        let store = MemoryStore::with_page_size(2);
        store.insert("abc123", "Soil Moisture Sensor Array");
        store.insert("def456", "Cold Atoms");
        store.insert("ghi789", "  Fluid Loops ");
        let index = RemoteIndex::build(&store, "db1").await.unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.get("Soil Moisture Sensor Array"), Some("abc123"));
        assert_eq!(index.get("Fluid Loops"), Some("ghi789"));
        assert_eq!(index.get("cold atoms"), None);
    }

    #[tokio::test]
    async fn duplicate_titles_keep_last_seen() {
        let store = MemoryStore::new();
        store.insert("first", "Cold Atoms");
        store.insert("second", "Cold Atoms");
        let index = RemoteIndex::build(&store, "db1").await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("Cold Atoms"), Some("second"));
    }

    #[tokio::test]
    async fn untitled_pages_are_not_indexed() {
        let store = MemoryStore::new();
        store.insert("blank", "   ");
        let index = RemoteIndex::build(&store, "db1").await.unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn lookup_takes_first_exact_match() {
        let store = MemoryStore::new();
        store.insert("first", "Cold Atoms");
        store.insert("second", "Cold Atoms");
        store.insert("other", "Cold Atoms II");
        assert_eq!(
            lookup(&store, "db1", "Cold Atoms").await.unwrap().as_deref(),
            Some("first")
        );
        assert_eq!(lookup(&store, "db1", "Warm Atoms").await.unwrap(), None);
    }

    #[tokio::test]
    async fn matcher_remembers_created_pages() {
        let store = MemoryStore::new();
        let mut matcher = Matcher::new(&store, "db1", MatchStrategy::Index)
            .await
            .unwrap();
        assert_eq!(matcher.indexed(), Some(0));
        matcher.created("Cold Atoms", "page-1");
        assert_eq!(
            matcher
                .find(&store, "db1", "Cold Atoms")
                .await
                .unwrap()
                .as_deref(),
            Some("page-1")
        );

        let lookup = Matcher::new(&store, "db1", MatchStrategy::Lookup)
            .await
            .unwrap();
        assert_eq!(lookup.indexed(), None);
        let (queries, _, _) = store.counts();
        assert_eq!(queries, 1);
    }
}

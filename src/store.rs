use async_trait::async_trait;
use futures::{
    stream::{self, Stream, TryStreamExt},
    TryFutureExt,
};
use notion::{
    databases::{self, Database, DatabaseQuery},
    pages::{self, Page, PageList},
    properties::Properties,
};

/// The remote operations a sync run needs.
///
/// Paginated and filtered queries share `query_database`. Implemented by
/// `notion::Client`; tests substitute an in-memory store.
#[async_trait]
pub trait Store: Send + Sync {
    async fn query_database(
        &self,
        database_id: &str,
        query: &DatabaseQuery,
    ) -> notion::Result<PageList>;

    async fn create_page(&self, database_id: &str, properties: &Properties)
        -> notion::Result<Page>;

    async fn update_page(&self, page_id: &str, properties: &Properties) -> notion::Result<Page>;

    async fn retrieve_database(&self, database_id: &str) -> notion::Result<Database>;
}

#[async_trait]
impl Store for notion::Client {
    async fn query_database(
        &self,
        database_id: &str,
        query: &DatabaseQuery,
    ) -> notion::Result<PageList> {
        databases::query(self, database_id, query)
            .inspect_err(|err| tracing::debug!(database_id, %err, "query failed"))
            .await
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: &Properties,
    ) -> notion::Result<Page> {
        pages::create(self, database_id, properties).await
    }

    async fn update_page(&self, page_id: &str, properties: &Properties) -> notion::Result<Page> {
        pages::update(self, page_id, properties).await
    }

    async fn retrieve_database(&self, database_id: &str) -> notion::Result<Database> {
        databases::retrieve(self, database_id).await
    }
}

/// Stream every page matching the given query, following continuation
/// cursors until the store reports no more results.
pub fn all<'a, S>(
    store: &'a S,
    database_id: &'a str,
    query: DatabaseQuery,
) -> impl Stream<Item = notion::Result<Page>> + 'a
where
    S: Store + ?Sized,
{
    stream::try_unfold(Some(query), move |query| async move {
        let Some(query) = query else {
            return Ok(None);
        };
        let list = store.query_database(database_id, &query).await?;
        let next = list
            .continuation()
            .map(|cursor| query.clone().with_start_cursor(Some(cursor)));
        let pages = stream::iter(list.results.into_iter().map(Ok::<_, notion::Error>));
        Ok::<_, notion::Error>(Some((pages, next)))
    })
    .try_flatten()
}

#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use notion::{
        databases::{Filter, FilterCondition},
        properties::PropertyValue,
        ApiError, Error,
    };
    use std::sync::Mutex;

    /// A database held in memory, paginating like the real service.
    #[derive(Default)]
    pub struct MemoryStore {
        inner: Mutex<Inner>,
    }

    #[derive(Default)]
    struct Inner {
        pages: Vec<Page>,
        schema: Database,
        page_size: usize,
        next_id: usize,
        fail_writes: Option<Box<dyn Fn(&str) -> bool + Send>>,
        fail_queries: bool,
        queries: usize,
        creates: usize,
        updates: usize,
    }

    pub fn restricted() -> Error {
        Error::notion(ApiError {
            status: 403,
            code: "restricted_resource".into(),
            message: "Insufficient permissions for this endpoint.".into(),
        })
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::with_page_size(notion::MAX_PAGE_SIZE as usize)
        }

        pub fn with_page_size(page_size: usize) -> Self {
            let store = Self::default();
            store.inner.lock().unwrap().page_size = page_size;
            store
        }

        pub fn with_schema(self, schema: Database) -> Self {
            self.inner.lock().unwrap().schema = schema;
            self
        }

        /// Fail create and update calls for page names matching the predicate.
        pub fn fail_writes<F: Fn(&str) -> bool + Send + 'static>(self, predicate: F) -> Self {
            self.inner.lock().unwrap().fail_writes = Some(Box::new(predicate));
            self
        }

        pub fn fail_queries(self) -> Self {
            self.inner.lock().unwrap().fail_queries = true;
            self
        }

        pub fn insert(&self, id: &str, name: &str) {
            let mut properties = Properties::new();
            properties.insert(
                crate::properties::NAME.to_string(),
                PropertyValue::title(name),
            );
            self.inner.lock().unwrap().pages.push(Page {
                id: id.to_string(),
                properties,
                ..Default::default()
            });
        }

        pub fn pages(&self) -> Vec<Page> {
            self.inner.lock().unwrap().pages.clone()
        }

        pub fn counts(&self) -> (usize, usize, usize) {
            let inner = self.inner.lock().unwrap();
            (inner.queries, inner.creates, inner.updates)
        }
    }

    fn name_of(properties: &Properties) -> String {
        properties
            .get(crate::properties::NAME)
            .and_then(PropertyValue::plain_text)
            .unwrap_or_default()
    }

    impl Inner {
        fn check_write(&self, properties: &Properties) -> notion::Result<()> {
            match &self.fail_writes {
                Some(fail) if fail(name_of(properties).as_str()) => Err(restricted()),
                _ => Ok(()),
            }
        }
    }

    #[async_trait]
    impl Store for MemoryStore {
        async fn query_database(
            &self,
            _database_id: &str,
            query: &DatabaseQuery,
        ) -> notion::Result<PageList> {
            let mut inner = self.inner.lock().unwrap();
            inner.queries += 1;
            if inner.fail_queries {
                return Err(restricted());
            }
            let matching: Vec<Page> = inner
                .pages
                .iter()
                .filter(|page| match &query.filter {
                    Some(Filter {
                        property,
                        condition: FilterCondition::Title(condition),
                    }) => page.title(property) == condition.equals,
                    None => true,
                })
                .cloned()
                .collect();
            let start: usize = query
                .start_cursor
                .as_deref()
                .map(|cursor| cursor.parse().unwrap())
                .unwrap_or_default();
            let size = query
                .page_size
                .map(|size| size as usize)
                .unwrap_or(inner.page_size)
                .min(inner.page_size);
            let end = (start + size).min(matching.len());
            let has_more = end < matching.len();
            Ok(PageList {
                results: matching[start..end].to_vec(),
                has_more,
                next_cursor: has_more.then(|| end.to_string()),
            })
        }

        async fn create_page(
            &self,
            _database_id: &str,
            properties: &Properties,
        ) -> notion::Result<Page> {
            let mut inner = self.inner.lock().unwrap();
            inner.creates += 1;
            inner.check_write(properties)?;
            inner.next_id += 1;
            let page = Page {
                id: format!("page-{}", inner.next_id),
                properties: properties.clone(),
                ..Default::default()
            };
            inner.pages.push(page.clone());
            Ok(page)
        }

        async fn update_page(
            &self,
            page_id: &str,
            properties: &Properties,
        ) -> notion::Result<Page> {
            let mut inner = self.inner.lock().unwrap();
            inner.updates += 1;
            inner.check_write(properties)?;
            let page = inner
                .pages
                .iter_mut()
                .find(|page| page.id == page_id)
                .ok_or_else(|| {
                    Error::notion(ApiError {
                        status: 404,
                        code: "object_not_found".into(),
                        message: format!("Could not find page with ID: {page_id}."),
                    })
                })?;
            page.properties.extend(properties.clone());
            Ok(page.clone())
        }

        async fn retrieve_database(&self, _database_id: &str) -> notion::Result<Database> {
            let inner = self.inner.lock().unwrap();
            if inner.fail_queries {
                return Err(restricted());
            }
            Ok(inner.schema.clone())
        }
    }
}

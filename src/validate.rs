use crate::{
    properties::{PropertyMapper, STATION},
    store::Store,
};
use notion::databases::{DatabaseQuery, PropertyType};

/// The schema a database must declare to receive synced pages.
#[derive(Debug, Clone)]
pub struct Expectations {
    pub properties: Vec<(&'static str, PropertyType)>,
    pub station_options: Vec<String>,
}

impl Expectations {
    pub fn new(mapper: &PropertyMapper, station_options: &[String]) -> Self {
        Self {
            properties: mapper.schema(),
            station_options: station_options.to_vec(),
        }
    }
}

/// Confirm the database can be queried, returning the number of pages
/// in a single small result page.
pub async fn check_access<S>(store: &S, database_id: &str) -> notion::Result<usize>
where
    S: Store + ?Sized,
{
    let query = DatabaseQuery::default().with_page_size(1);
    let list = store.query_database(database_id, &query).await?;
    Ok(list.results.len())
}

/// Compare the database schema against the expectations.
///
/// Every check runs; the returned list holds one message per problem and
/// is empty for a conforming database.
pub async fn check_schema<S>(store: &S, database_id: &str, expected: &Expectations) -> Vec<String>
where
    S: Store + ?Sized,
{
    let database = match store.retrieve_database(database_id).await {
        Ok(database) => database,
        Err(err) => return vec![format!("Error retrieving database: {err}")],
    };

    let mut issues = Vec::new();
    for (name, expected_type) in &expected.properties {
        match database.properties.get(*name) {
            None => issues.push(format!("Missing property: {name}")),
            Some(schema) if schema.r#type != *expected_type => issues.push(format!(
                "Property '{name}' has wrong type: expected '{expected_type}', got '{}'",
                schema.r#type
            )),
            Some(_) => (),
        }
    }

    if let Some(station) = database
        .properties
        .get(STATION)
        .filter(|schema| schema.r#type == PropertyType::Select)
    {
        let options = station.select_options();
        for required in &expected.station_options {
            if !options.contains(&required.as_str()) {
                issues.push(format!("Station property missing option: '{required}'"));
            }
        }
    }

    tracing::debug!(database_id, issues = issues.len(), "checked schema");
    issues
}

/// The collected result of a validation run.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// The access check failed, so the schema was not checked.
    Unreachable(String),
    Checked { pages: usize, issues: Vec<String> },
}

impl Report {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Checked { issues, .. } if issues.is_empty())
    }
}

/// Run the access check and, if it succeeds, every schema check.
pub async fn run<S>(store: &S, database_id: &str, expected: &Expectations) -> Report
where
    S: Store + ?Sized,
{
    match check_access(store, database_id).await {
        Ok(pages) => Report::Checked {
            pages,
            issues: check_schema(store, database_id, expected).await,
        },
        Err(err) => Report::Unreachable(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{properties::FieldShape, store::memory::MemoryStore};
    use notion::{
        databases::{Database, PropertySchema, SelectSchema},
        properties::SelectOption,
    };

    fn expectations() -> Expectations {
        Expectations::new(
            &PropertyMapper::default(),
            &["Tiangong".to_string(), "ISS".to_string()],
        )
    }

    fn database(station_options: &[&str]) -> Database {
        let mut database = Database {
            id: "db1".into(),
            ..Default::default()
        };
        for (name, r#type) in PropertyMapper::default().schema() {
            let select = (r#type == PropertyType::Select).then(|| SelectSchema {
                options: station_options
                    .iter()
                    .map(|option| SelectOption::named(*option))
                    .collect(),
            });
            database.properties.insert(
                name.to_string(),
                PropertySchema {
                    id: name.to_lowercase(),
                    name: name.to_string(),
                    r#type,
                    select,
                },
            );
        }
        database
    }

    #[tokio::test]
    async fn conforming_schema_passes() {
        let store = MemoryStore::new().with_schema(database(&["Tiangong", "ISS", "Mir"]));
        let issues = check_schema(&store, "db1", &expectations()).await;
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[tokio::test]
    async fn reports_missing_station_option() {
        let store = MemoryStore::new().with_schema(database(&["Tiangong"]));
        let issues = check_schema(&store, "db1", &expectations()).await;
        assert_eq!(issues, vec!["Station property missing option: 'ISS'"]);
    }

    #[tokio::test]
    async fn reports_missing_and_mistyped_properties() {
        let mut schema = database(&["Tiangong", "ISS"]);
        schema.properties.remove("Objectives");
        schema
            .properties
            .get_mut("Discipline")
            .unwrap()
            .r#type = PropertyType::MultiSelect;
        let store = MemoryStore::new().with_schema(schema);
        let issues = check_schema(&store, "db1", &expectations()).await;
        assert_eq!(
            issues,
            vec![
                "Property 'Discipline' has wrong type: expected 'rich_text', got 'multi_select'",
                "Missing property: Objectives",
            ]
        );
    }

    #[tokio::test]
    async fn expectations_follow_mapper_shapes() {
        let mapper = PropertyMapper {
            discipline: FieldShape::Select,
            timeline_status: FieldShape::Text,
        };
        let store = MemoryStore::new().with_schema(database(&["Tiangong", "ISS"]));
        let issues = check_schema(&store, "db1", &Expectations::new(&mapper, &[])).await;
        assert_eq!(
            issues,
            vec!["Property 'Discipline' has wrong type: expected 'select', got 'rich_text'"]
        );
    }

    #[tokio::test]
    async fn text_station_skips_option_check() {
        let mut schema = database(&[]);
        schema.properties.get_mut(STATION).unwrap().r#type = PropertyType::RichText;
        let store = MemoryStore::new().with_schema(schema);
        let issues = check_schema(&store, "db1", &expectations()).await;
        assert_eq!(
            issues,
            vec!["Property 'Station' has wrong type: expected 'select', got 'rich_text'"]
        );
    }

    #[tokio::test]
    async fn access_and_retrieval_failures() {
        let store = MemoryStore::new().fail_queries();
        assert!(check_access(&store, "db1").await.is_err());
        let issues = check_schema(&store, "db1", &expectations()).await;
        assert_eq!(issues.len(), 1);
        assert!(issues[0].starts_with("Error retrieving database: notion error 403"));
    }

    #[tokio::test]
    async fn report_skips_schema_when_unreachable() {
        let store = MemoryStore::new().fail_queries();
        let report = run(&store, "db1", &expectations()).await;
        assert!(matches!(report, Report::Unreachable(_)));
        assert!(!report.passed());

        let store = MemoryStore::new().with_schema(database(&["Tiangong"]));
        store.insert("a", "A");
        let report = run(&store, "db1", &expectations()).await;
        assert_eq!(
            report,
            Report::Checked {
                pages: 1,
                issues: vec!["Station property missing option: 'ISS'".to_string()],
            }
        );
        assert!(!report.passed());

        let store = MemoryStore::new().with_schema(database(&["Tiangong", "ISS"]));
        assert!(run(&store, "db1", &expectations()).await.passed());
    }

    #[tokio::test]
    async fn access_counts_a_single_page() {
        let store = MemoryStore::new();
        store.insert("a", "A");
        store.insert("b", "B");
        assert_eq!(check_access(&store, "db1").await.unwrap(), 1);
    }
}

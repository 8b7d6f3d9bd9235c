use crate::{properties::Properties, Client, Result};
use serde::{Deserialize, Serialize};

pub async fn create(client: &Client, database_id: &str, properties: &Properties) -> Result<Page> {
    #[derive(Serialize)]
    struct CreatePageRequest<'a> {
        parent: Parent<'a>,
        properties: &'a Properties,
    }
    let request = CreatePageRequest {
        parent: Parent { database_id },
        properties,
    };
    client.post("/v1/pages", &request).await
}

pub async fn update(client: &Client, page_id: &str, properties: &Properties) -> Result<Page> {
    #[derive(Serialize)]
    struct UpdatePageRequest<'a> {
        properties: &'a Properties,
    }
    client
        .patch(
            &format!("/v1/pages/{page_id}"),
            &UpdatePageRequest { properties },
        )
        .await
}

#[derive(Serialize, Debug)]
struct Parent<'a> {
    database_id: &'a str,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: Properties,
}

impl Page {
    /// The plain text of the named title property, if present.
    pub fn title(&self, property: &str) -> Option<String> {
        self.properties
            .get(property)
            .and_then(|value| value.plain_text())
    }
}

/// One page of results from a database query.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
pub struct PageList {
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl PageList {
    /// The cursor to continue from, if the store reports more results.
    pub fn continuation(&self) -> Option<&str> {
        if self.has_more {
            self.next_cursor.as_deref()
        } else {
            None
        }
    }
}

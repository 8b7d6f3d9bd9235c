use crate::{pages::PageList, properties::SelectOption, Client, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Query a database for one page of results.
pub async fn query(client: &Client, database_id: &str, query: &DatabaseQuery) -> Result<PageList> {
    client
        .post(&format!("/v1/databases/{database_id}/query"), query)
        .await
}

/// Retrieve the database object, including its property schema.
pub async fn retrieve(client: &Client, database_id: &str) -> Result<Database> {
    client.fetch(&format!("/v1/databases/{database_id}")).await
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
pub struct DatabaseQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl DatabaseQuery {
    pub fn with_start_cursor(mut self, cursor: Option<&str>) -> Self {
        self.start_cursor = cursor.map(str::to_string);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size.min(crate::MAX_PAGE_SIZE));
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// A single property filter.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct Filter {
    pub property: String,
    #[serde(flatten)]
    pub condition: FilterCondition,
}

impl Filter {
    pub fn title_equals<P: Into<String>, V: Into<String>>(property: P, value: V) -> Self {
        Self {
            property: property.into(),
            condition: FilterCondition::Title(TextCondition::equals(value)),
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
#[serde(rename_all = "snake_case")]
pub enum FilterCondition {
    Title(TextCondition),
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
pub struct TextCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<String>,
}

impl TextCondition {
    pub fn equals<V: Into<String>>(value: V) -> Self {
        Self {
            equals: Some(value.into()),
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
pub struct Database {
    pub id: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySchema>,
}

/// The declared schema of a single database property.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct PropertySchema {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub r#type: PropertyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<SelectSchema>,
}

impl PropertySchema {
    /// Option names of a select property, empty for every other type.
    pub fn select_options(&self) -> Vec<&str> {
        self.select
            .as_ref()
            .map(|select| {
                select
                    .options
                    .iter()
                    .map(|option| option.name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
pub struct SelectSchema {
    #[serde(default)]
    pub options: Vec<SelectOption>,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Title,
    #[default]
    RichText,
    Number,
    Select,
    MultiSelect,
    Status,
    Date,
    People,
    Files,
    Checkbox,
    Url,
    Email,
    PhoneNumber,
    Formula,
    Relation,
    Rollup,
    CreatedTime,
    CreatedBy,
    LastEditedTime,
    LastEditedBy,
    UniqueId,
    #[serde(other)]
    Unknown,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::RichText => "rich_text",
            Self::Number => "number",
            Self::Select => "select",
            Self::MultiSelect => "multi_select",
            Self::Status => "status",
            Self::Date => "date",
            Self::People => "people",
            Self::Files => "files",
            Self::Checkbox => "checkbox",
            Self::Url => "url",
            Self::Email => "email",
            Self::PhoneNumber => "phone_number",
            Self::Formula => "formula",
            Self::Relation => "relation",
            Self::Rollup => "rollup",
            Self::CreatedTime => "created_time",
            Self::CreatedBy => "created_by",
            Self::LastEditedTime => "last_edited_time",
            Self::LastEditedBy => "last_edited_by",
            Self::UniqueId => "unique_id",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Property values keyed by property name, as sent to and read from pages.
pub type Properties = BTreeMap<String, PropertyValue>;

/// Maximum length of a single rich text content segment.
pub const MAX_TEXT_LENGTH: usize = 2000;
/// Maximum length of a select option name.
pub const MAX_SELECT_LENGTH: usize = 100;

/// A page property value.
///
/// Only the shapes this crate writes are modelled; any other property type
/// read back from a page deserializes as `Unsupported`.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        title: Vec<RichText>,
    },
    RichText {
        rich_text: Vec<RichText>,
    },
    Select {
        select: Option<SelectOption>,
    },
    #[serde(other)]
    Unsupported,
}

impl PropertyValue {
    pub fn title<S: Into<String>>(content: S) -> Self {
        Self::Title {
            title: vec![RichText::text(content)],
        }
    }

    pub fn rich_text<S: Into<String>>(content: S) -> Self {
        Self::RichText {
            rich_text: vec![RichText::text(content)],
        }
    }

    pub fn select<S: Into<String>>(name: S) -> Self {
        Self::Select {
            select: Some(SelectOption::named(name)),
        }
    }

    /// The plain text of a title or rich text value, or the option name of
    /// a select value.
    pub fn plain_text(&self) -> Option<String> {
        match self {
            Self::Title { title: segments } | Self::RichText { rich_text: segments } => {
                Some(segments.iter().map(RichText::plain_text).collect())
            }
            Self::Select { select } => select.as_ref().map(|option| option.name.clone()),
            Self::Unsupported => None,
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
pub struct RichText {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Text>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub plain_text: String,
}

impl RichText {
    pub fn text<S: Into<String>>(content: S) -> Self {
        Self {
            text: Some(Text {
                content: content.into(),
            }),
            ..Default::default()
        }
    }

    /// Notion fills in `plain_text` on read; locally built values only
    /// carry `text.content`.
    pub fn plain_text(&self) -> &str {
        if !self.plain_text.is_empty() {
            return &self.plain_text;
        }
        self.text
            .as_ref()
            .map(|text| text.content.as_str())
            .unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
pub struct Text {
    pub content: String,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Default)]
pub struct SelectOption {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub color: String,
}

impl SelectOption {
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Truncate to at most `max` characters.
pub fn truncate(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((index, _)) => &value[..index],
        None => value,
    }
}

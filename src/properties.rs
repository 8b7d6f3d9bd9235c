use crate::experiment::ExperimentRecord;
use notion::{
    databases::PropertyType,
    properties::{truncate, Properties, PropertyValue, MAX_SELECT_LENGTH, MAX_TEXT_LENGTH},
};
use serde::Deserialize;

pub const NAME: &str = "Name";
pub const STATION: &str = "Station";
pub const DISCIPLINE: &str = "Discipline";
pub const COUNTRY_INSTITUTION: &str = "Country/Institution";
pub const TIMELINE_STATUS: &str = "Timeline Status";
pub const OBJECTIVES: &str = "Objectives";
pub const EXPECTED_OUTCOMES: &str = "Expected Outcomes";
pub const PRINCIPAL_INVESTIGATOR: &str = "Principal Investigator";
pub const MISSION_MODULE: &str = "Mission Module";

const DEFAULT_STATION: &str = "Unknown";
const DEFAULT_DISCIPLINE: &str = "Other";
const DEFAULT_TIMELINE_STATUS: &str = "Unknown";

/// How a free-form column is stored in the database.
#[derive(Deserialize, PartialEq, Eq, Debug, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldShape {
    #[default]
    Text,
    Select,
}

impl FieldShape {
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::Text => PropertyType::RichText,
            Self::Select => PropertyType::Select,
        }
    }

    fn to_value(self, value: &str, default: &str) -> PropertyValue {
        let value = or_default(value, default);
        match self {
            Self::Text => PropertyValue::rich_text(truncate(value, MAX_TEXT_LENGTH)),
            Self::Select => PropertyValue::select(truncate(value, MAX_SELECT_LENGTH)),
        }
    }
}

/// Converts input records into page properties.
///
/// The shapes of Discipline and Timeline Status are configurable; the
/// database schema has to declare the same types (see [`Self::schema`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyMapper {
    pub discipline: FieldShape,
    pub timeline_status: FieldShape,
}

impl PropertyMapper {
    pub fn to_properties(&self, record: &ExperimentRecord) -> Properties {
        Properties::from([
            (
                NAME.to_string(),
                PropertyValue::title(truncate(&record.name, MAX_TEXT_LENGTH)),
            ),
            (
                STATION.to_string(),
                PropertyValue::select(or_default(&record.station, DEFAULT_STATION)),
            ),
            (
                DISCIPLINE.to_string(),
                self.discipline
                    .to_value(&record.discipline, DEFAULT_DISCIPLINE),
            ),
            (
                COUNTRY_INSTITUTION.to_string(),
                text(&record.country_institution),
            ),
            (
                TIMELINE_STATUS.to_string(),
                self.timeline_status
                    .to_value(&record.timeline_status, DEFAULT_TIMELINE_STATUS),
            ),
            (OBJECTIVES.to_string(), text(&record.objectives)),
            (EXPECTED_OUTCOMES.to_string(), text(&record.expected_outcomes)),
            (
                PRINCIPAL_INVESTIGATOR.to_string(),
                text(&record.principal_investigator),
            ),
            (MISSION_MODULE.to_string(), text(&record.mission_module)),
        ])
    }

    /// The property names and types the database must declare for
    /// properties produced by this mapper.
    pub fn schema(&self) -> Vec<(&'static str, PropertyType)> {
        vec![
            (NAME, PropertyType::Title),
            (STATION, PropertyType::Select),
            (DISCIPLINE, self.discipline.property_type()),
            (COUNTRY_INSTITUTION, PropertyType::RichText),
            (TIMELINE_STATUS, self.timeline_status.property_type()),
            (OBJECTIVES, PropertyType::RichText),
            (EXPECTED_OUTCOMES, PropertyType::RichText),
            (PRINCIPAL_INVESTIGATOR, PropertyType::RichText),
            (MISSION_MODULE, PropertyType::RichText),
        ]
    }
}

fn text(value: &str) -> PropertyValue {
    PropertyValue::rich_text(truncate(value, MAX_TEXT_LENGTH))
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

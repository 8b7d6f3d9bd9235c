use crate::ParseError;
use serde::Deserialize;
use std::{fs::File, path::Path};

/// Columns the input header must name.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "Experiment_Name",
    "Station",
    "Discipline",
    "Country_Institution",
    "Timeline_Status",
    "Objectives",
    "Expected_Outcomes",
    "Principal_Investigator",
    "Mission_Module",
];

/// One input row. Absent columns read as empty strings.
#[derive(Deserialize, PartialEq, Debug, Clone, Default)]
#[serde(default)]
pub struct ExperimentRecord {
    #[serde(rename = "Experiment_Name")]
    pub name: String,
    #[serde(rename = "Station")]
    pub station: String,
    #[serde(rename = "Discipline")]
    pub discipline: String,
    #[serde(rename = "Country_Institution")]
    pub country_institution: String,
    #[serde(rename = "Timeline_Status")]
    pub timeline_status: String,
    #[serde(rename = "Objectives")]
    pub objectives: String,
    #[serde(rename = "Expected_Outcomes")]
    pub expected_outcomes: String,
    #[serde(rename = "Principal_Investigator")]
    pub principal_investigator: String,
    #[serde(rename = "Mission_Module")]
    pub mission_module: String,
}

#[derive(Deserialize, PartialEq, Eq, Debug, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Comma,
    Pipe,
}

impl Delimiter {
    pub fn as_byte(&self) -> u8 {
        match self {
            Self::Comma => b',',
            Self::Pipe => b'|',
        }
    }
}

fn reader(path: &Path, delimiter: Delimiter) -> Result<csv::Reader<File>, ParseError> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|source| ParseError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Read all records from the given file, in file order.
pub fn read(path: &Path, delimiter: Delimiter) -> Result<Vec<ExperimentRecord>, ParseError> {
    let mut reader = reader(path, delimiter)?;
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();
    for row in reader.records() {
        let mut row = row?;
        // Short rows leave their trailing columns empty
        while row.len() < headers.len() {
            row.push_field("");
        }
        records.push(row.deserialize(Some(&headers))?);
    }
    tracing::debug!(count = records.len(), path = %path.display(), "read records");
    Ok(records)
}

/// Required columns missing from the header of the given file.
pub fn missing_columns(
    path: &Path,
    delimiter: Delimiter,
) -> Result<Vec<&'static str>, ParseError> {
    let mut reader = reader(path, delimiter)?;
    let headers = reader.headers()?;
    Ok(REQUIRED_COLUMNS
        .into_iter()
        .filter(|column| !headers.iter().any(|header| header == *column))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn input(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_comma_delimited() {
        let file = input(
            "Station,Experiment_Name,Discipline,Country_Institution,Timeline_Status,Objectives,Expected_Outcomes,Principal_Investigator,Mission_Module\n\
             Tiangong , Plant Growth ,Biology,CAS,Planned,\"Grow rice, in orbit\",Seeds,Dr. Li,Wentian\n",
        );
        let records = read(file.path(), Delimiter::Comma).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.name, "Plant Growth");
        assert_eq!(record.station, "Tiangong");
        assert_eq!(record.objectives, "Grow rice, in orbit");
        assert_eq!(record.mission_module, "Wentian");
    }

    #[test]
    fn reads_pipe_delimited() {
        let file = input(
            "Experiment_Name | Station | Discipline\n\
             Cold Atoms | ISS | Physics, Quantum\n\
             Fluid Loops | Tiangong | Fluids\n",
        );
        let records = read(file.path(), Delimiter::Pipe).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Cold Atoms");
        assert_eq!(records[0].discipline, "Physics, Quantum");
        assert_eq!(records[1].station, "Tiangong");
        assert_eq!(records[1].objectives, "");
    }

    #[test]
    fn short_rows_leave_fields_empty() {
        let file = input("Experiment_Name,Station,Discipline\nCold Atoms,ISS\n");
        let records = read(file.path(), Delimiter::Comma).unwrap();
        assert_eq!(records[0].name, "Cold Atoms");
        assert_eq!(records[0].station, "ISS");
        assert_eq!(records[0].discipline, "");
    }

    #[test]
    fn unreadable_file() {
        let err = read(Path::new("no/such/file.csv"), Delimiter::Comma).unwrap_err();
        assert!(matches!(err, ParseError::Open { .. }));
        assert!(err.to_string().starts_with("opening no/such/file.csv: "));
    }

    #[test]
    fn reports_missing_columns() {
        let file = input("Experiment_Name,Station,Objectives\n");
        let missing = missing_columns(file.path(), Delimiter::Comma).unwrap();
        assert_eq!(
            missing,
            vec![
                "Discipline",
                "Country_Institution",
                "Timeline_Status",
                "Expected_Outcomes",
                "Principal_Investigator",
                "Mission_Module"
            ]
        );
    }
}

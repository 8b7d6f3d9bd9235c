use crate::{
    cmd::{rule, Result},
    experiment::{self, Delimiter, REQUIRED_COLUMNS},
    properties::{PropertyMapper, NAME, STATION},
    settings::Settings,
};
use std::path::{Path, PathBuf};

/// Check the input file offline, without credentials or network access.
#[derive(Debug, clap::Args)]
pub struct Cmd {
    /// The CSV file to check, overriding the configured input
    input: Option<PathBuf>,
}

impl Cmd {
    pub fn run(&self, settings: &Settings) -> Result {
        let input = settings.input(self.input.as_deref())?;
        rule(60);
        println!("Input check: {}", input.display());
        rule(60);
        check(&input, settings.sync.delimiter, &settings.mapper())
    }
}

/// Run every input check, failing with the checks that did not pass.
fn check(input: &Path, delimiter: Delimiter, mapper: &PropertyMapper) -> Result {
    let mut failed = Vec::new();
    if !check_records(input, delimiter, mapper) {
        failed.push("records");
    }
    if !check_columns(input, delimiter) {
        failed.push("columns");
    }

    if !failed.is_empty() {
        println!("\n✗ Some checks failed. Please fix the issues before syncing.");
        anyhow::bail!("input checks failed: {}", failed.join(", "));
    }
    println!("\n✓ All checks passed! Ready to sync to Notion.");
    Ok(())
}

fn check_records(input: &Path, delimiter: Delimiter, mapper: &PropertyMapper) -> bool {
    println!("\nReading records...");
    let records = match experiment::read(input, delimiter) {
        Ok(records) => records,
        Err(err) => {
            println!("✗ Error reading CSV: {err}");
            return false;
        }
    };
    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        println!("✗ No data to check");
        return false;
    };
    println!("✓ Successfully read {} rows from CSV", records.len());
    println!("✓ First experiment: {}", first.name);
    println!("✓ Last experiment: {}", last.name);

    println!("\nMapping the first record...");
    let properties = mapper.to_properties(first);
    println!("✓ Created properties for: {}", first.name);
    println!("  - Station: {}", first.station);
    println!("  - Discipline: {}", first.discipline);
    println!("  - Timeline Status: {}", first.timeline_status);
    if !properties.contains_key(NAME) || !properties.contains_key(STATION) {
        println!("✗ Property structure is incomplete");
        return false;
    }
    println!("✓ Property structure is correct");
    true
}

fn check_columns(input: &Path, delimiter: Delimiter) -> bool {
    println!("\nChecking columns...");
    match experiment::missing_columns(input, delimiter) {
        Ok(missing) if missing.is_empty() => {
            println!("✓ All required columns present: {}", REQUIRED_COLUMNS.len());
            true
        }
        Ok(missing) => {
            println!("✗ Missing columns: {}", missing.join(", "));
            false
        }
        Err(err) => {
            println!("✗ Error checking CSV: {err}");
            false
        }
    }
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

    fn run_check(contents: &str) -> Result {
        let file = input(contents);
        check(file.path(), Delimiter::Comma, &PropertyMapper::default())
    }

    #[test]
    fn complete_input_passes() {
        let header = REQUIRED_COLUMNS.join(",");
        assert!(run_check(&format!("{header}\nCold Atoms,ISS,Physics,,,,,,\n")).is_ok());
    }

    #[test]
    fn header_only_file_reports_both_checks() {
        let err = run_check("Experiment_Name,Station\n").unwrap_err();
        assert_eq!(err.to_string(), "input checks failed: records, columns");
    }

    #[test]
    fn missing_columns_fail_with_rows_present() {
        let err = run_check("Experiment_Name,Station\nCold Atoms,ISS\n").unwrap_err();
        assert_eq!(err.to_string(), "input checks failed: columns");
    }

    #[test]
    fn empty_input_with_all_columns_fails_records() {
        let err = run_check(&format!("{}\n", REQUIRED_COLUMNS.join(","))).unwrap_err();
        assert_eq!(err.to_string(), "input checks failed: records");
    }
}

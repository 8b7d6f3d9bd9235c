use crate::{
    cmd::{rule, Result},
    settings::Settings,
    validate::{self, Expectations, Report},
};

/// Check that the database is reachable and declares the properties a sync
/// writes.
#[derive(Debug, clap::Args)]
pub struct Cmd {}

impl Cmd {
    pub async fn run(&self, settings: &Settings) -> Result {
        rule(70);
        println!("Notion Database Validation");
        rule(70);
        println!();

        println!("Step 1: Checking configuration...");
        let credentials = settings.credentials().inspect_err(|err| {
            println!("❌ Error: {err}");
        })?;
        println!("✅ Configuration found");
        println!("   Token: {}", credentials.masked_token());
        println!("   Database ID: {}", credentials.database_id);
        println!();

        println!("Step 2: Connecting to Notion...");
        let client = settings.client(&credentials).inspect_err(|err| {
            println!("❌ Error initializing Notion client: {err}");
        })?;
        println!("✅ Notion client initialized");
        println!();

        let expected = Expectations::new(&settings.mapper(), &settings.sync.station_options);
        let report = validate::run(&client, &credentials.database_id, &expected).await;

        conclude(&report, &expected)?;

        println!("✅ All required properties are correctly configured!");
        println!();
        println!("Properties found:");
        for (name, r#type) in &expected.properties {
            println!("  • {name:<25} ({})", r#type);
        }
        println!();
        rule(70);
        println!("✅ Validation Complete - Database is ready for sync!");
        rule(70);
        println!();
        println!("Next steps:");
        println!("  1. Run: {} sync", env!("CARGO_PKG_NAME"));
        println!("  2. Check your Notion database for synced data");
        Ok(())
    }
}

/// Print steps 3 and 4 of the report, failing unless every check passed.
fn conclude(report: &Report, expected: &Expectations) -> Result {
    print_report(report, expected);
    anyhow::ensure!(report.passed(), "database validation failed");
    Ok(())
}

fn print_report(report: &Report, expected: &Expectations) {
    println!("Step 3: Testing database access...");
    let issues = match report {
        Report::Unreachable(err) => {
            println!("❌ Error accessing database: {err}");
            print_access_help();
            return;
        }
        Report::Checked { pages, issues } => {
            println!("✅ Successfully accessed database. Found {pages} existing page(s).");
            issues
        }
    };
    println!();

    println!("Step 4: Validating database properties...");
    if !issues.is_empty() {
        println!("❌ Database configuration issues found:");
        println!();
        for issue in issues {
            println!("  • {issue}");
        }
        println!();
        print_schema_help(expected);
    }
}

fn print_access_help() {
    println!();
    println!("Common issues:");
    println!("  - Database ID is incorrect");
    println!("  - Integration doesn't have access to the database");
    println!("  - Database has been deleted");
    println!();
    println!("To fix:");
    println!("  1. Check the database URL and ID");
    println!("  2. Share the database with your integration:");
    println!("     - Open the database in Notion");
    println!("     - Click '...' → 'Add connections'");
    println!("     - Select your integration");
}

fn print_schema_help(expected: &Expectations) {
    println!("To fix these issues:");
    println!("  1. Open your database in Notion");
    println!("  2. Add/modify properties as needed");
    println!("  3. For 'Station', ensure it's a Select property with options:");
    for option in &expected.station_options {
        println!("     - {option}");
    }
    println!("  4. Run this command again to validate");
}

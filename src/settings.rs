use crate::{
    experiment::Delimiter,
    matcher::MatchStrategy,
    properties::{FieldShape, PropertyMapper},
    ConfigError,
};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Prefix for all environment overrides, e.g. `NOTION_TOKEN` or
/// `NOTION_SYNC__MATCHING`.
pub const ENV_PREFIX: &str = "NOTION";
/// Input file used when neither the command line nor settings name one.
pub const DEFAULT_INPUT: &str = "planned_research_main.csv";
/// Options the Station select property must offer.
pub const DEFAULT_STATION_OPTIONS: &[&str] = &["Tiangong", "ISS"];

#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Notion integration token
    #[serde(default)]
    pub token: Option<String>,
    /// Id of the database to sync into
    #[serde(default)]
    pub database_id: Option<String>,
    /// Log filter directive
    #[serde(default = "default_log")]
    pub log: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Retries for transient request failures
    #[serde(default = "default_retries")]
    pub retries: usize,
    #[serde(default)]
    pub sync: SyncSettings,
}

fn default_log() -> String {
    "warn".to_string()
}

fn default_timeout() -> u64 {
    notion::DEFAULT_TIMEOUT
}

fn default_retries() -> usize {
    notion::DEFAULT_RETRIES
}

impl Settings {
    /// Settings are loaded from the (optional) file in the given path,
    /// overridden by `NOTION_` prefixed environment variables.
    pub fn new(path: &Path) -> Result<Self, ConfigError> {
        Self::with_environment(path, environment())
    }

    pub fn with_environment(path: &Path, environment: Environment) -> Result<Self, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(environment)
            .build()
            .and_then(|config| config.try_deserialize())?)
    }

    /// The token and database id, both required for any remote call.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let token = required(&self.token).ok_or(ConfigError::MissingToken)?;
        let database_id = required(&self.database_id).ok_or(ConfigError::MissingDatabaseId)?;
        Ok(Credentials {
            token: token.to_string(),
            database_id: database_id.to_string(),
        })
    }

    pub fn client(&self, credentials: &Credentials) -> Result<notion::Client, ConfigError> {
        let auth = notion::AuthMode::new_bearer(&credentials.token)?;
        Ok(notion::Client::new_with_timeout(auth, self.timeout)?
            .with_retries(notion::RetryPolicy::with_retries(self.retries)))
    }

    /// The input file, preferring the given override, which must exist.
    pub fn input(&self, input: Option<&Path>) -> Result<PathBuf, ConfigError> {
        let path = input.unwrap_or(&self.sync.input);
        if !path.is_file() {
            return Err(ConfigError::MissingInput(path.to_path_buf()));
        }
        Ok(path.to_path_buf())
    }

    pub fn mapper(&self) -> PropertyMapper {
        PropertyMapper {
            discipline: self.sync.discipline,
            timeline_status: self.sync.timeline_status,
        }
    }
}

pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

fn required(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SyncSettings {
    pub input: PathBuf,
    pub delimiter: Delimiter,
    pub discipline: FieldShape,
    pub timeline_status: FieldShape,
    pub matching: MatchStrategy,
    pub station_options: Vec<String>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            delimiter: Delimiter::default(),
            discipline: FieldShape::default(),
            timeline_status: FieldShape::default(),
            matching: MatchStrategy::default(),
            station_options: DEFAULT_STATION_OPTIONS
                .iter()
                .map(|option| option.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub token: String,
    pub database_id: String,
}

impl Credentials {
    /// The token shortened for display.
    pub fn masked_token(&self) -> String {
        if self.token.chars().count() > 10 {
            let prefix: String = self.token.chars().take(10).collect();
            format!("{prefix}...")
        } else {
            self.token.clone()
        }
    }
}

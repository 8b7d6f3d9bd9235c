use std::path::PathBuf;
use thiserror::Error;

pub type Result<T = ()> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Remote(#[from] notion::Error),
}

/// Fatal startup errors. The messages double as remediation text.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "NOTION_TOKEN not found in environment variables. \
         Please set it in a .env file or as an environment variable."
    )]
    MissingToken,
    #[error(
        "NOTION_DATABASE_ID not found in environment variables. \
         Please set it in a .env file or as an environment variable."
    )]
    MissingDatabaseId,
    #[error("CSV file '{}' not found", .0.display())]
    MissingInput(PathBuf),
    #[error("settings: {0}")]
    Settings(#[from] config::ConfigError),
    #[error("client: {0}")]
    Client(#[from] notion::Error),
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("opening {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("reading record: {0}")]
    Record(#[from] csv::Error),
}

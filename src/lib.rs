mod error;
pub use error::{ConfigError, Error, ParseError, Result};

pub mod cmd;
pub mod experiment;
pub mod matcher;
pub mod properties;
pub mod settings;
pub mod store;
pub mod sync;
pub mod validate;

// --- File: crates/icewatch_config/src/error.rs ---
use icewatch_common::{config_error, IcewatchError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Can't read products file {path}: {source}")]
    CatalogIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Can't parse products file {path}: {source}")]
    CatalogParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<ConfigLoadError> for IcewatchError {
    fn from(err: ConfigLoadError) -> Self {
        config_error(err)
    }
}

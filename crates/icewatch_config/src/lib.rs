// --- File: crates/icewatch_config/src/lib.rs ---
use config::{Config, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use std::path::Path;
use tracing::debug;

pub mod error;
pub mod models;
pub mod products;

pub use error::ConfigLoadError;
pub use models::*;
pub use products::{load_product_catalog, ProductCatalog, ProductEntry};

/// Environment variable prefix, e.g. `ICEWATCH__DATABASE__URL`.
pub const ENV_PREFIX: &str = "ICEWATCH";
pub const ENV_SEPARATOR: &str = "__";

/// Loads the configuration from `./config` (or `$CONFIG_DIR`) for `$RUN_ENV`.
///
/// Layers, lowest priority first: built-in defaults, `config/default.*`,
/// `config/<RUN_ENV>.*`, `ICEWATCH__*` environment variables, and finally
/// the `ICESCRAPER_*` variables older deployments still set.
pub fn load_config() -> Result<AppConfig, ConfigLoadError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let config_dir = env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    load_config_from(Path::new(&config_dir), &run_env)
}

/// Same as [`load_config`] with an explicit directory and environment name.
pub fn load_config_from(config_dir: &Path, run_env: &str) -> Result<AppConfig, ConfigLoadError> {
    let default_path = config_dir.join("default");
    let env_path = config_dir.join(run_env);
    debug!(
        "Loading configuration from {} and {}",
        default_path.display(),
        env_path.display()
    );

    let builder = Config::builder()
        .set_default("database.url", DEFAULT_DATABASE_URL)?
        .set_default("products_path", DEFAULT_PRODUCTS_PATH)?
        .set_default("timezone", DEFAULT_TIMEZONE)?
        .set_default("booking.base_url", DEFAULT_BOOKING_BASE_URL)?
        .set_default("booking.timeout_secs", DEFAULT_BOOKING_TIMEOUT_SECS)?
        .set_default("gcal.api_base", DEFAULT_GCAL_API_BASE)?
        .add_source(File::from(default_path).required(false))
        .add_source(File::from(env_path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        )
        .set_override_option(
            "database.url",
            legacy_var("ICESCRAPER_DB_FILE").map(|file| format!("sqlite:{}", file)),
        )?
        .set_override_option("products_path", legacy_var("ICESCRAPER_PRODUCTS_FILE"))?
        .set_override_option("gcal.credentials_path", legacy_var("ICESCRAPER_GCAL_CRED_FILE"))?
        .set_override_option("gcal.token_path", legacy_var("ICESCRAPER_GCAL_TOKEN_FILE"))?;

    let config: AppConfig = builder.build()?.try_deserialize()?;
    Ok(config)
}

fn legacy_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads `.env` (or `$DOTENV_OVERRIDE`) into the process environment once.
///
/// Returns the path that was tried.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = std::env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}

// --- File: crates/icewatch_config/src/models.rs ---

use serde::{Deserialize, Serialize};

pub const DEFAULT_DATABASE_URL: &str = "sqlite:ice-info.db";
pub const DEFAULT_PRODUCTS_PATH: &str = "products.json";
pub const DEFAULT_TIMEZONE: &str = "Europe/London";
pub const DEFAULT_BOOKING_BASE_URL: &str = "https://bookings.national-ice-centre.com/booking";
pub const DEFAULT_BOOKING_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_GCAL_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

// --- Database Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. "sqlite:ice-info.db", or ICEWATCH__DATABASE__URL
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

// --- Booking site Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BookingConfig {
    pub base_url: String,
    #[serde(default = "default_booking_timeout")]
    pub timeout_secs: u64,
}

fn default_booking_timeout() -> u64 {
    DEFAULT_BOOKING_TIMEOUT_SECS
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BOOKING_BASE_URL.to_string(),
            timeout_secs: DEFAULT_BOOKING_TIMEOUT_SECS,
        }
    }
}

// --- Google Calendar Config ---
// Calendar sync only runs when credentials_path is set.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GcalConfig {
    pub credentials_path: Option<String>, // service account JSON
    pub token_path: Option<String>,       // optional bearer token cache
    pub calendar_id: Option<String>,      // used for products without their own calendar
    #[serde(default = "default_gcal_api_base")]
    pub api_base: String,
}

fn default_gcal_api_base() -> String {
    DEFAULT_GCAL_API_BASE.to_string()
}

impl Default for GcalConfig {
    fn default() -> Self {
        Self {
            credentials_path: None,
            token_path: None,
            calendar_id: None,
            api_base: default_gcal_api_base(),
        }
    }
}

impl GcalConfig {
    pub fn is_enabled(&self) -> bool {
        self.credentials_path
            .as_deref()
            .is_some_and(|path| !path.is_empty())
    }
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    pub products_path: String,
    pub timezone: String,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub gcal: GcalConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            products_path: DEFAULT_PRODUCTS_PATH.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            booking: BookingConfig::default(),
            gcal: GcalConfig::default(),
        }
    }
}

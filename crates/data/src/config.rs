//! Data layer configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `BASKET_USERS_COLLECTION` - Collection holding user documents (default: users)
//! - `BASKET_INDEX_DOCUMENT` - Key of the email/mobile index document (default: emailAndMobiles)
//! - `BASKET_DATA_PATH` - Snapshot file for the local store (default: basket-data.json)

use std::path::PathBuf;

use thiserror::Error;

/// Default name of the users collection.
pub const DEFAULT_USERS_COLLECTION: &str = "users";
/// Default key of the email/mobile index document.
pub const DEFAULT_INDEX_DOCUMENT: &str = "emailAndMobiles";
/// Default snapshot file.
pub const DEFAULT_DATA_PATH: &str = "basket-data.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// User data layer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataConfig {
    /// Collection holding one document per user
    pub users_collection: String,
    /// Key of the sentinel document listing registered emails and mobiles
    pub index_document: String,
    /// Snapshot file backing the local store
    pub data_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            users_collection: DEFAULT_USERS_COLLECTION.to_owned(),
            index_document: DEFAULT_INDEX_DOCUMENT.to_owned(),
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
        }
    }
}

impl DataConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but blank.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            users_collection: get_non_empty_or_default(
                &lookup,
                "BASKET_USERS_COLLECTION",
                DEFAULT_USERS_COLLECTION,
            )?,
            index_document: get_non_empty_or_default(
                &lookup,
                "BASKET_INDEX_DOCUMENT",
                DEFAULT_INDEX_DOCUMENT,
            )?,
            data_path: PathBuf::from(get_non_empty_or_default(
                &lookup,
                "BASKET_DATA_PATH",
                DEFAULT_DATA_PATH,
            )?),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a variable with a default value, rejecting blank values.
fn get_non_empty_or_default(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<String, ConfigError> {
    match lookup(key) {
        None => Ok(default.to_owned()),
        Some(value) if value.trim().is_empty() => Err(ConfigError::InvalidEnvVar(
            key.to_owned(),
            "must not be empty".to_owned(),
        )),
        Some(value) => Ok(value.trim().to_owned()),
    }
}

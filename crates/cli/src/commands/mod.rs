//! CLI command implementations.
//!
//! Every command runs against a [`MemoryDocumentStore`] loaded from the
//! snapshot file; mutating commands save it back afterwards.

pub mod arrays;
pub mod index;
pub mod seed;
pub mod users;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use basket_core::{EmailError, Mobile, MobileError};
use basket_data::store::{MemoryDocumentStore, StoreError};
use basket_data::{ConfigError, DataConfig, DataSourceError, UserRemoteStore};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The snapshot store could not be loaded or saved.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A data source operation failed.
    #[error("{0}")]
    DataSource(#[from] DataSourceError),

    /// An email argument is malformed.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// A mobile argument is malformed.
    #[error("Invalid mobile: {0}")]
    InvalidMobile(#[from] MobileError),

    /// A JSON payload does not match the expected shape.
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A seed file could not be read.
    #[error("Could not read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A seed file is not valid YAML for the expected shape.
    #[error("Invalid seed file: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
}

/// Store, data source and snapshot location shared by all commands.
pub struct Context {
    store: Arc<MemoryDocumentStore>,
    pub source: UserRemoteStore,
    data_path: PathBuf,
}

impl Context {
    /// Load configuration and the snapshot file.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Config` or `CommandError::Store` if either
    /// cannot be loaded.
    pub async fn open(data_override: Option<PathBuf>) -> Result<Self, CommandError> {
        let mut config = DataConfig::from_env()?;
        if let Some(path) = data_override {
            config.data_path = path;
        }
        Self::with_config(&config).await
    }

    /// Open a context for an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Store` if the snapshot cannot be loaded.
    pub async fn with_config(config: &DataConfig) -> Result<Self, CommandError> {
        let store = Arc::new(
            MemoryDocumentStore::load_snapshot(
                &config.data_path,
                UserRemoteStore::required_indexes(config),
            )
            .await?,
        );
        tracing::debug!(path = %config.data_path.display(), "Store opened");

        Ok(Self {
            source: UserRemoteStore::new(store.clone(), config),
            store,
            data_path: config.data_path.clone(),
        })
    }

    /// Write the store back to its snapshot file.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Store` if the file cannot be written.
    pub async fn save(&self) -> Result<(), CommandError> {
        self.store.save_snapshot(&self.data_path).await?;
        tracing::info!(path = %self.data_path.display(), "Store saved");
        Ok(())
    }

    /// Snapshot file backing this context.
    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }
}

/// Parse a mobile number argument.
pub(crate) fn parse_mobile(raw: &str) -> Result<Mobile, CommandError> {
    Ok(Mobile::parse(raw)?)
}

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    let out = serde_json::to_string_pretty(value)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{out}");
    }
    Ok(())
}

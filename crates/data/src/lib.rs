//! Basket Data - User data source over a document store.
//!
//! This crate translates typed user operations (lookup, registration,
//! address and cart edits, the global email/mobile index) into queries and
//! field updates against a document database.
//!
//! # Architecture
//!
//! - [`store`] - The [`DocumentStore`](store::DocumentStore) seam and an
//!   in-memory implementation with snapshot files
//! - [`UserDataSource`] - The capability consumed by the domain repository
//! - [`UserRemoteStore`] - Its implementation over a shared store
//! - [`config`] - Collection and file names loaded from the environment
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use basket_core::{Mobile, UserId, UserRecord};
//! use basket_data::store::MemoryDocumentStore;
//! use basket_data::{DataConfig, UserDataSource, UserRemoteStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = DataConfig::default();
//! let store = Arc::new(MemoryDocumentStore::new(UserRemoteStore::required_indexes(&config)));
//! let users = UserRemoteStore::new(store, &config);
//!
//! let mobile = Mobile::parse("9876543210").unwrap();
//! let user = UserRecord::new(UserId::new("u-1"), "Asha", mobile, "pw");
//! users.add_user(&user).await.unwrap();
//!
//! let found = users.get_user_by_id(&UserId::new("u-1")).await.unwrap();
//! assert_eq!(found.name, "Asha");
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod source;
pub mod store;
pub mod users;

pub use config::{ConfigError, DataConfig};
pub use error::{DataSourceError, Result};
pub use source::UserDataSource;
pub use users::UserRemoteStore;

//! Integration tests for Basket.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p basket-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `user_data_source` - Operation contracts of the user data source
//! - `concurrent_edits` - Interleaved writers against one user document
//!
//! This library holds the shared fixtures: a [`TestContext`] wiring a fresh
//! in-memory store to a data source, plus record builders.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::sync::Arc;

use basket_core::{
    Address, AddressId, CartItem, CartItemId, Email, Mobile, ProductId, UserId, UserRecord,
};
use basket_data::store::MemoryDocumentStore;
use basket_data::{DataConfig, UserDataSource, UserRemoteStore};

/// A fresh store and the data source over it.
pub struct TestContext {
    pub store: Arc<MemoryDocumentStore>,
    pub source: UserRemoteStore,
    pub config: DataConfig,
}

impl TestContext {
    /// Empty store with the data source's indexes.
    #[must_use]
    pub fn new() -> Self {
        let config = DataConfig::default();
        let store = Arc::new(MemoryDocumentStore::new(UserRemoteStore::required_indexes(
            &config,
        )));
        let source = UserRemoteStore::new(store.clone(), &config);
        Self {
            store,
            source,
            config,
        }
    }

    /// Store with one user already added.
    pub async fn with_user(user: &UserRecord) -> Self {
        let ctx = Self::new();
        ctx.source.add_user(user).await.unwrap();
        ctx
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a mobile number, panicking on bad test input.
#[must_use]
pub fn mobile(raw: &str) -> Mobile {
    Mobile::parse(raw).unwrap()
}

/// Parse an email, panicking on bad test input.
#[must_use]
pub fn email(raw: &str) -> Email {
    Email::parse(raw).unwrap()
}

/// A user with no addresses and an empty cart.
#[must_use]
pub fn user(id: &str, phone: &str, password: &str) -> UserRecord {
    UserRecord::new(UserId::new(id), format!("User {id}"), mobile(phone), password)
}

/// An address identified by `id`, located in `city`.
#[must_use]
pub fn address(id: &str, city: &str) -> Address {
    let mut address = Address::new(AddressId::new(id));
    address.first_name = "Test".to_owned();
    address.city = city.to_owned();
    address.country_iso_code = "IN".to_owned();
    address
}

/// A cart line for `product` with `quantity` units.
#[must_use]
pub fn cart_item(id: &str, product: &str, quantity: u32) -> CartItem {
    CartItem::new(CartItemId::new(id), ProductId::new(product), quantity)
}

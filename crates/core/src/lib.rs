//! Basket Core - Shared domain types.
//!
//! This crate provides the types exchanged between the shopping app's domain
//! layer and the user data layer:
//! - `basket-data` - Document store seam and the user data source
//! - `basket-cli` - Command-line tools for inspecting and seeding a store
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no store access. Every type
//! serializes with serde to the camelCase document shape used in the `users`
//! collection.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, validated emails and mobiles, user records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

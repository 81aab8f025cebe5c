//! Core types for Basket.
//!
//! This module provides type-safe wrappers and records for the user domain.

pub mod email;
pub mod id;
pub mod index;
pub mod mobile;
pub mod user;

pub use email::{Email, EmailError};
pub use id::*;
pub use index::EmailMobileIndex;
pub use mobile::{Mobile, MobileError};
pub use user::{Address, CartItem, UserRecord};

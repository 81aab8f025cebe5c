//! User record types.
//!
//! These are the document shapes stored in the `users` collection. Field
//! names serialize in camelCase (`userId`, `addressId`, `itemId`, ...).

use core::fmt;

use serde::{Deserialize, Serialize};

use super::{AddressId, CartItemId, Email, Mobile, ProductId, UserId};

/// One user document.
///
/// `user_id` is the stable application identifier; the document's storage
/// key is separate and resolved by query.
///
/// `Debug` is implemented manually to redact the password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Stable user identifier.
    pub user_id: UserId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Email used at registration, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    /// Mobile number used for login.
    pub mobile: Mobile,
    /// Login password, stored as given.
    pub password: String,
    /// Saved delivery addresses, in insertion order.
    #[serde(default)]
    pub addresses: Vec<Address>,
    /// Cart contents, in insertion order.
    #[serde(default)]
    pub cart: Vec<CartItem>,
}

impl UserRecord {
    /// Create a record with an empty address book and cart.
    #[must_use]
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        mobile: Mobile,
        password: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            name: name.into(),
            email: None,
            mobile,
            password: password.into(),
            addresses: Vec::new(),
            cart: Vec::new(),
        }
    }

    /// Set the registration email.
    #[must_use]
    pub fn with_email(mut self, email: Email) -> Self {
        self.email = Some(email);
        self
    }

    /// Find a saved address by its ID.
    #[must_use]
    pub fn address(&self, id: &AddressId) -> Option<&Address> {
        self.addresses.iter().find(|a| &a.address_id == id)
    }

    /// Find a cart line by its ID.
    #[must_use]
    pub fn cart_item(&self, id: &CartItemId) -> Option<&CartItem> {
        self.cart.iter().find(|i| &i.item_id == id)
    }
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("mobile", &self.mobile)
            .field("password", &"[REDACTED]")
            .field("addresses", &self.addresses)
            .field("cart", &self.cart)
            .finish()
    }
}

/// A delivery address saved on a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Unique within the owning user's address list.
    pub address_id: AddressId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// ISO 3166-1 alpha-2 country code.
    #[serde(default)]
    pub country_iso_code: String,
    #[serde(default)]
    pub street_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_address2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub phone_number: String,
}

impl Address {
    /// Create an address with only its ID set.
    #[must_use]
    pub fn new(address_id: AddressId) -> Self {
        Self {
            address_id,
            first_name: String::new(),
            last_name: String::new(),
            country_iso_code: String::new(),
            street_address: String::new(),
            street_address2: None,
            city: String::new(),
            state: String::new(),
            zip_code: String::new(),
            phone_number: String::new(),
        }
    }
}

/// One line in a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Unique within the owning user's cart.
    pub item_id: CartItemId,
    pub product_id: ProductId,
    /// Seller that owns the product.
    #[serde(default)]
    pub owner_id: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl CartItem {
    /// Create a cart line for a product.
    #[must_use]
    pub fn new(item_id: CartItemId, product_id: ProductId, quantity: u32) -> Self {
        Self {
            item_id,
            product_id,
            owner_id: String::new(),
            quantity,
            color: None,
            size: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_user() -> UserRecord {
        UserRecord::new(
            UserId::new("u-1"),
            "Asha",
            Mobile::parse("9876543210").unwrap(),
            "hunter22",
        )
    }

    #[test]
    fn test_user_serializes_camel_case() {
        let mut user = sample_user();
        user.addresses.push(Address::new(AddressId::new("a-1")));
        user.cart
            .push(CartItem::new(CartItemId::new("c-1"), ProductId::new("p-1"), 2));

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["userId"], "u-1");
        assert_eq!(value["mobile"], "9876543210");
        assert_eq!(value["addresses"][0]["addressId"], "a-1");
        assert_eq!(value["cart"][0]["itemId"], "c-1");
        assert_eq!(value["cart"][0]["productId"], "p-1");
        assert!(value.get("email").is_none());
    }

    #[test]
    fn test_user_missing_arrays_default_to_empty() {
        let user: UserRecord = serde_json::from_value(json!({
            "userId": "u-2",
            "mobile": "1234567",
            "password": "pw",
        }))
        .unwrap();

        assert!(user.addresses.is_empty());
        assert!(user.cart.is_empty());
        assert!(user.name.is_empty());
    }

    #[test]
    fn test_debug_redacts_password() {
        let debug = format!("{:?}", sample_user());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter22"));
    }

    #[test]
    fn test_lookup_helpers() {
        let mut user = sample_user();
        let mut home = Address::new(AddressId::new("home"));
        home.city = "Pune".to_owned();
        user.addresses.push(home);

        assert_eq!(user.address(&AddressId::new("home")).unwrap().city, "Pune");
        assert!(user.address(&AddressId::new("work")).is_none());
        assert!(user.cart_item(&CartItemId::new("x")).is_none());
    }
}

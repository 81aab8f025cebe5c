//! The user data source capability.

use async_trait::async_trait;

use basket_core::{
    Address, AddressId, CartItem, CartItemId, DocumentKey, Email, EmailMobileIndex, Mobile,
    UserId, UserRecord,
};

use crate::error::Result;

/// Remote user data operations consumed by the domain repository.
///
/// Every operation returns the same [`DataSourceError`](crate::DataSourceError):
/// lookups that miss yield `NotFound`, uniqueness breaches yield `Conflict`,
/// and an unreachable store yields `Transport`. Nothing is retried.
#[async_trait]
pub trait UserDataSource: Send + Sync {
    /// Fetch the user whose `userId` equals `user_id`.
    async fn get_user_by_id(&self, user_id: &UserId) -> Result<UserRecord>;

    /// Store a new user document and return its generated storage key.
    async fn add_user(&self, user: &UserRecord) -> Result<DocumentKey>;

    /// Fetch the first user registered with `mobile`.
    async fn get_user_by_mobile(&self, mobile: &Mobile) -> Result<UserRecord>;

    /// Fetch the saved addresses of a user.
    async fn get_addresses_by_user_id(&self, user_id: &UserId) -> Result<Vec<Address>>;

    /// Every user matching both `mobile` and `password`. An empty list means
    /// the credentials are wrong.
    async fn get_user_by_mobile_and_password(
        &self,
        mobile: &Mobile,
        password: &str,
    ) -> Result<Vec<UserRecord>>;

    /// Append an address. Inserting an identical address again is a no-op.
    async fn insert_address(&self, address: &Address, user_id: &UserId) -> Result<()>;

    /// Replace the address with the same `addressId`, if there is one.
    async fn update_address(&self, address: &Address, user_id: &UserId) -> Result<()>;

    /// Remove the address with `address_id`, if there is one.
    async fn delete_address(&self, address_id: &AddressId, user_id: &UserId) -> Result<()>;

    /// Append a cart line. Inserting an identical line again is a no-op.
    async fn insert_cart_item(&self, item: &CartItem, user_id: &UserId) -> Result<()>;

    /// Replace the cart line with the same `itemId`, if there is one.
    async fn update_cart_item(&self, item: &CartItem, user_id: &UserId) -> Result<()>;

    /// Remove the cart line with `item_id`, if there is one.
    async fn delete_cart_item(&self, item_id: &CartItemId, user_id: &UserId) -> Result<()>;

    /// Record a registered email and mobile in the global index.
    async fn update_emails_and_mobiles(&self, email: &Email, mobile: &Mobile) -> Result<()>;

    /// Read the global index; `None` if it was never written or is empty.
    async fn get_emails_and_mobiles(&self) -> Result<Option<EmailMobileIndex>>;
}

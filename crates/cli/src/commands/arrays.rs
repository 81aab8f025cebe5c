//! Address and cart commands.
//!
//! Both arrays share one command shape; [`ArrayCommands`] maps it onto the
//! matching data source operations.

use basket_core::{Address, AddressId, CartItem, CartItemId, UserId};
use basket_data::UserDataSource;

use super::{CommandError, Context, print_json};

/// List/add/update/remove over one of the user's arrays.
pub trait ArrayCommands {
    async fn list(ctx: &Context, user: &str) -> Result<(), CommandError>;
    async fn add(ctx: &Context, user: &str, json: &str) -> Result<(), CommandError>;
    async fn update(ctx: &Context, user: &str, json: &str) -> Result<(), CommandError>;
    async fn remove(ctx: &Context, user: &str, id: &str) -> Result<(), CommandError>;
}

/// Saved addresses.
pub struct Addresses;

/// Cart lines.
pub struct Cart;

impl ArrayCommands for Addresses {
    async fn list(ctx: &Context, user: &str) -> Result<(), CommandError> {
        let addresses = ctx
            .source
            .get_addresses_by_user_id(&UserId::new(user))
            .await?;
        print_json(&addresses)
    }

    async fn add(ctx: &Context, user: &str, json: &str) -> Result<(), CommandError> {
        let address: Address = serde_json::from_str(json)?;
        ctx.source
            .insert_address(&address, &UserId::new(user))
            .await?;
        tracing::info!(user, address_id = %address.address_id, "Address added");
        Ok(())
    }

    async fn update(ctx: &Context, user: &str, json: &str) -> Result<(), CommandError> {
        let address: Address = serde_json::from_str(json)?;
        ctx.source
            .update_address(&address, &UserId::new(user))
            .await?;
        tracing::info!(user, address_id = %address.address_id, "Address updated");
        Ok(())
    }

    async fn remove(ctx: &Context, user: &str, id: &str) -> Result<(), CommandError> {
        ctx.source
            .delete_address(&AddressId::new(id), &UserId::new(user))
            .await?;
        tracing::info!(user, address_id = id, "Address removed");
        Ok(())
    }
}

impl ArrayCommands for Cart {
    async fn list(ctx: &Context, user: &str) -> Result<(), CommandError> {
        let user = ctx.source.get_user_by_id(&UserId::new(user)).await?;
        print_json(&user.cart)
    }

    async fn add(ctx: &Context, user: &str, json: &str) -> Result<(), CommandError> {
        let item: CartItem = serde_json::from_str(json)?;
        ctx.source
            .insert_cart_item(&item, &UserId::new(user))
            .await?;
        tracing::info!(user, item_id = %item.item_id, "Cart item added");
        Ok(())
    }

    async fn update(ctx: &Context, user: &str, json: &str) -> Result<(), CommandError> {
        let item: CartItem = serde_json::from_str(json)?;
        ctx.source
            .update_cart_item(&item, &UserId::new(user))
            .await?;
        tracing::info!(user, item_id = %item.item_id, "Cart item updated");
        Ok(())
    }

    async fn remove(ctx: &Context, user: &str, id: &str) -> Result<(), CommandError> {
        ctx.source
            .delete_cart_item(&CartItemId::new(id), &UserId::new(user))
            .await?;
        tracing::info!(user, item_id = id, "Cart item removed");
        Ok(())
    }
}

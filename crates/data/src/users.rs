//! User data source backed by a document store.
//!
//! Each user is one document in the users collection. The document's storage
//! key is not the `userId`: user-scoped operations first resolve the key with
//! an equality query on `userId` (served by a unique secondary index), then
//! issue one field update against that key.
//!
//! Address and cart edits are sent as keyed array transforms, so the store
//! applies them to the current array rather than to a copy read earlier.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;

use basket_core::{
    Address, AddressId, CartItem, CartItemId, DocumentKey, Email, EmailMobileIndex, Mobile,
    UserId, UserRecord,
};

use crate::config::DataConfig;
use crate::error::{DataSourceError, Result};
use crate::source::UserDataSource;
use crate::store::{
    Document, DocumentSnapshot, FieldUpdate, Filter, IndexSpec, Precondition, SharedStore,
};

const USER_ID_FIELD: &str = "userId";
const MOBILE_FIELD: &str = "mobile";
const PASSWORD_FIELD: &str = "password";
const EMAILS_FIELD: &str = "emails";
const MOBILES_FIELD: &str = "mobiles";

/// An element of one of the user document's keyed arrays.
trait ArrayElement: Serialize {
    /// Array field on the user document.
    const FIELD: &'static str;
    /// Field identifying the element within the array.
    const KEY_FIELD: &'static str;

    fn key(&self) -> &str;
}

impl ArrayElement for Address {
    const FIELD: &'static str = "addresses";
    const KEY_FIELD: &'static str = "addressId";

    fn key(&self) -> &str {
        self.address_id.as_str()
    }
}

impl ArrayElement for CartItem {
    const FIELD: &'static str = "cart";
    const KEY_FIELD: &'static str = "itemId";

    fn key(&self) -> &str {
        self.item_id.as_str()
    }
}

/// [`UserDataSource`] over a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Clone)]
pub struct UserRemoteStore {
    store: SharedStore,
    users_collection: String,
    index_document: DocumentKey,
}

impl std::fmt::Debug for UserRemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRemoteStore")
            .field("users_collection", &self.users_collection)
            .field("index_document", &self.index_document)
            .finish_non_exhaustive()
    }
}

impl UserRemoteStore {
    /// Create a data source over `store`.
    #[must_use]
    pub fn new(store: SharedStore, config: &DataConfig) -> Self {
        Self {
            store,
            users_collection: config.users_collection.clone(),
            index_document: DocumentKey::new(config.index_document.as_str()),
        }
    }

    /// Secondary indexes the backing store should maintain for this source.
    #[must_use]
    pub fn required_indexes(config: &DataConfig) -> Vec<IndexSpec> {
        vec![
            IndexSpec::unique(config.users_collection.as_str(), USER_ID_FIELD),
            IndexSpec::new(config.users_collection.as_str(), MOBILE_FIELD),
        ]
    }

    /// Resolve the user document for `user_id`.
    async fn locate(&self, user_id: &UserId) -> Result<DocumentSnapshot> {
        self.store
            .query(
                &self.users_collection,
                &[Filter::eq(USER_ID_FIELD, user_id.as_str())],
            )
            .await?
            .into_iter()
            .next()
            .ok_or_else(DataSourceError::user_not_found)
    }

    async fn update_user_field(&self, user_id: &UserId, update: FieldUpdate) -> Result<()> {
        let doc = self.locate(user_id).await?;
        let result = self
            .store
            .update(
                &self.users_collection,
                &doc.key,
                &[update],
                Precondition::MustExist,
            )
            .await?;
        tracing::debug!(
            key = %doc.key,
            version = result.version,
            changed = result.changed,
            "User document updated"
        );
        Ok(())
    }

    async fn insert_element<E: ArrayElement>(&self, element: &E, user_id: &UserId) -> Result<()> {
        let update = FieldUpdate::KeyedArrayUnion {
            field: E::FIELD.to_owned(),
            key_field: E::KEY_FIELD.to_owned(),
            element: to_value(element)?,
        };
        tracing::trace!(field = E::FIELD, key = element.key(), "Appending array element");
        self.update_user_field(user_id, update).await
    }

    async fn replace_element<E: ArrayElement>(&self, element: &E, user_id: &UserId) -> Result<()> {
        let update = FieldUpdate::KeyedArrayReplace {
            field: E::FIELD.to_owned(),
            key_field: E::KEY_FIELD.to_owned(),
            element: to_value(element)?,
        };
        tracing::trace!(field = E::FIELD, key = element.key(), "Replacing array element");
        self.update_user_field(user_id, update).await
    }

    async fn remove_element<E: ArrayElement>(&self, key: &str, user_id: &UserId) -> Result<()> {
        let update = FieldUpdate::KeyedArrayRemove {
            field: E::FIELD.to_owned(),
            key_field: E::KEY_FIELD.to_owned(),
            key: Value::String(key.to_owned()),
        };
        self.update_user_field(user_id, update).await
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| DataSourceError::DataCorruption(format!("failed to serialize: {e}")))
}

fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(DataSourceError::DataCorruption(format!(
            "expected a map, serialized to {other}"
        ))),
    }
}

fn decode<T: DeserializeOwned>(doc: &DocumentSnapshot) -> Result<T> {
    doc.deserialize().map_err(|e| {
        DataSourceError::DataCorruption(format!("invalid document {}: {e}", doc.key))
    })
}

#[async_trait::async_trait]
impl UserDataSource for UserRemoteStore {
    #[instrument(skip_all, fields(user_id = %user_id))]
    async fn get_user_by_id(&self, user_id: &UserId) -> Result<UserRecord> {
        let doc = self.locate(user_id).await?;
        decode(&doc)
    }

    #[instrument(skip_all, fields(user_id = %user.user_id))]
    async fn add_user(&self, user: &UserRecord) -> Result<DocumentKey> {
        let data = to_document(user)?;
        match self.store.insert(&self.users_collection, data).await {
            Ok(key) => {
                tracing::info!(key = %key, "User document added");
                Ok(key)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to add user document");
                Err(e.into())
            }
        }
    }

    #[instrument(skip_all, fields(mobile = %mobile))]
    async fn get_user_by_mobile(&self, mobile: &Mobile) -> Result<UserRecord> {
        let docs = self
            .store
            .query(
                &self.users_collection,
                &[Filter::eq(MOBILE_FIELD, mobile.as_str())],
            )
            .await?;
        let doc = docs.first().ok_or_else(DataSourceError::user_not_found)?;
        decode(doc)
    }

    #[instrument(skip_all, fields(user_id = %user_id))]
    async fn get_addresses_by_user_id(&self, user_id: &UserId) -> Result<Vec<Address>> {
        let user: UserRecord = decode(&self.locate(user_id).await?)?;
        Ok(user.addresses)
    }

    #[instrument(skip_all, fields(mobile = %mobile))]
    async fn get_user_by_mobile_and_password(
        &self,
        mobile: &Mobile,
        password: &str,
    ) -> Result<Vec<UserRecord>> {
        let docs = self
            .store
            .query(
                &self.users_collection,
                &[
                    Filter::eq(MOBILE_FIELD, mobile.as_str()),
                    Filter::eq(PASSWORD_FIELD, password),
                ],
            )
            .await?;
        tracing::debug!(matches = docs.len(), "Credential lookup finished");
        docs.iter().map(decode).collect()
    }

    #[instrument(skip_all, fields(user_id = %user_id, address_id = %address.address_id))]
    async fn insert_address(&self, address: &Address, user_id: &UserId) -> Result<()> {
        self.insert_element(address, user_id).await
    }

    #[instrument(skip_all, fields(user_id = %user_id, address_id = %address.address_id))]
    async fn update_address(&self, address: &Address, user_id: &UserId) -> Result<()> {
        self.replace_element(address, user_id).await
    }

    #[instrument(skip_all, fields(user_id = %user_id, address_id = %address_id))]
    async fn delete_address(&self, address_id: &AddressId, user_id: &UserId) -> Result<()> {
        self.remove_element::<Address>(address_id.as_str(), user_id)
            .await
    }

    #[instrument(skip_all, fields(user_id = %user_id, item_id = %item.item_id))]
    async fn insert_cart_item(&self, item: &CartItem, user_id: &UserId) -> Result<()> {
        self.insert_element(item, user_id).await
    }

    #[instrument(skip_all, fields(user_id = %user_id, item_id = %item.item_id))]
    async fn update_cart_item(&self, item: &CartItem, user_id: &UserId) -> Result<()> {
        self.replace_element(item, user_id).await
    }

    #[instrument(skip_all, fields(user_id = %user_id, item_id = %item_id))]
    async fn delete_cart_item(&self, item_id: &CartItemId, user_id: &UserId) -> Result<()> {
        self.remove_element::<CartItem>(item_id.as_str(), user_id)
            .await
    }

    #[instrument(skip_all)]
    async fn update_emails_and_mobiles(&self, email: &Email, mobile: &Mobile) -> Result<()> {
        let updates = [
            FieldUpdate::ArrayUnion {
                field: EMAILS_FIELD.to_owned(),
                values: vec![Value::String(email.to_string())],
            },
            FieldUpdate::ArrayUnion {
                field: MOBILES_FIELD.to_owned(),
                values: vec![Value::String(mobile.to_string())],
            },
        ];
        let result = self
            .store
            .update(
                &self.users_collection,
                &self.index_document,
                &updates,
                Precondition::Upsert,
            )
            .await;

        match result {
            Ok(write) => {
                tracing::debug!(changed = write.changed, "Email/mobile index updated");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to update email/mobile index");
                Err(e.into())
            }
        }
    }

    #[instrument(skip_all)]
    async fn get_emails_and_mobiles(&self) -> Result<Option<EmailMobileIndex>> {
        let doc = self
            .store
            .get(&self.users_collection, &self.index_document)
            .await?;
        match doc {
            Some(doc) if !doc.is_empty() => decode(&doc).map(Some),
            _ => Ok(None),
        }
    }
}

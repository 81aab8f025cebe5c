//! Interleaved writers editing the arrays of one user document.

#![allow(clippy::unwrap_used)]

use basket_core::{AddressId, CartItemId, UserId, UserRecord};
use basket_data::UserDataSource;
use basket_data::store::{DocumentStore, FieldUpdate, Filter, Precondition};
use basket_integration_tests::{TestContext, address, cart_item, user};

fn ids(record: &UserRecord) -> Vec<&str> {
    let mut ids: Vec<&str> = record.cart.iter().map(|c| c.item_id.as_str()).collect();
    ids.sort_unstable();
    ids
}

#[tokio::test]
async fn test_joined_cart_inserts_both_survive() {
    let ctx = TestContext::with_user(&user("u1", "9000000001", "pw")).await;
    let uid = UserId::new("u1");
    let first = cart_item("l1", "p1", 1);
    let second = cart_item("l2", "p2", 1);

    let (a, b) = tokio::join!(
        ctx.source.insert_cart_item(&first, &uid),
        ctx.source.insert_cart_item(&second, &uid),
    );
    a.unwrap();
    b.unwrap();

    let stored = ctx.source.get_user_by_id(&uid).await.unwrap();
    assert_eq!(ids(&stored), vec!["l1", "l2"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_spawned_inserts_all_survive() {
    let ctx = TestContext::with_user(&user("u1", "9000000001", "pw")).await;
    let uid = UserId::new("u1");

    let mut handles = Vec::new();
    for n in 0..32 {
        let source = ctx.source.clone();
        let uid = uid.clone();
        handles.push(tokio::spawn(async move {
            let item = cart_item(&format!("line-{n}"), "p", 1);
            source.insert_cart_item(&item, &uid).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = ctx.source.get_user_by_id(&uid).await.unwrap();
    assert_eq!(stored.cart.len(), 32);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_insert_and_delete_of_different_items_both_apply() {
    let ctx = TestContext::with_user(&user("u1", "9000000001", "pw")).await;
    let uid = UserId::new("u1");
    ctx.source
        .insert_cart_item(&cart_item("old", "p1", 1), &uid)
        .await
        .unwrap();

    let added = cart_item("new", "p2", 3);
    let removed = CartItemId::new("old");
    let (a, b) = tokio::join!(
        ctx.source.insert_cart_item(&added, &uid),
        ctx.source.delete_cart_item(&removed, &uid),
    );
    a.unwrap();
    b.unwrap();

    let stored = ctx.source.get_user_by_id(&uid).await.unwrap();
    assert_eq!(stored.cart, vec![added]);
}

#[tokio::test]
async fn test_address_and_cart_writers_do_not_interfere() {
    let ctx = TestContext::with_user(&user("u1", "9000000001", "pw")).await;
    let uid = UserId::new("u1");
    ctx.source
        .insert_address(&address("home", "Pune"), &uid)
        .await
        .unwrap();

    let home = address("home", "Mumbai");
    let item = cart_item("l1", "p1", 1);
    let work = address("work", "Thane");
    let (a, b, c) = tokio::join!(
        ctx.source.update_address(&home, &uid),
        ctx.source.insert_cart_item(&item, &uid),
        ctx.source.insert_address(&work, &uid),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    let stored = ctx.source.get_user_by_id(&uid).await.unwrap();
    assert_eq!(
        stored.addresses,
        vec![address("home", "Mumbai"), address("work", "Thane")]
    );
    assert_eq!(stored.cart.len(), 1);
    assert!(stored.address(&AddressId::new("work")).is_some());
}

/// Rewriting the whole array from a stale read drops whatever another
/// writer appended in between. The data source never writes this way.
#[tokio::test]
async fn test_whole_array_rewrite_loses_concurrent_append() {
    let ctx = TestContext::with_user(&user("u1", "9000000001", "pw")).await;
    let uid = UserId::new("u1");
    ctx.source
        .insert_cart_item(&cart_item("l1", "p1", 1), &uid)
        .await
        .unwrap();

    let collection = ctx.config.users_collection.as_str();
    let snapshot = ctx
        .store
        .query(collection, &[Filter::eq("userId", "u1")])
        .await
        .unwrap()
        .remove(0);
    let mut stale: UserRecord = snapshot.deserialize().unwrap();

    // Another client appends while we hold the stale copy.
    ctx.source
        .insert_cart_item(&cart_item("l2", "p2", 1), &uid)
        .await
        .unwrap();

    stale.cart.retain(|c| c.item_id.as_str() != "l1");
    ctx.store
        .update(
            collection,
            &snapshot.key,
            &[FieldUpdate::Set {
                field: "cart".to_owned(),
                value: serde_json::to_value(&stale.cart).unwrap(),
            }],
            Precondition::MustExist,
        )
        .await
        .unwrap();

    let stored = ctx.source.get_user_by_id(&uid).await.unwrap();
    assert!(stored.cart.is_empty());
}

#[tokio::test]
async fn test_keyed_remove_keeps_concurrent_append() {
    let ctx = TestContext::with_user(&user("u1", "9000000001", "pw")).await;
    let uid = UserId::new("u1");
    ctx.source
        .insert_cart_item(&cart_item("l1", "p1", 1), &uid)
        .await
        .unwrap();

    ctx.source
        .insert_cart_item(&cart_item("l2", "p2", 1), &uid)
        .await
        .unwrap();
    ctx.source
        .delete_cart_item(&CartItemId::new("l1"), &uid)
        .await
        .unwrap();

    let stored = ctx.source.get_user_by_id(&uid).await.unwrap();
    assert_eq!(ids(&stored), vec!["l2"]);
}
